//! Reference resolution: names to nodes, and integer attributes to values.

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

use reclay_core::{DataError, Dimensions, NodeId, Value};

use crate::attr::IntAttr;
use crate::document::Document;

/// Find the node a short name refers to, searching outward from `from`.
///
/// Starting at `from`'s parent, the name is prefixed with each ancestor's
/// qualified name and probed in the name table; the nearest enclosing scope
/// wins. At the root the name is probed as-is, so fully qualified names
/// resolve too. Ancestors without a qualified name are skipped.
pub fn resolve_relative_node(doc: &Document, from: NodeId, name: &str) -> Option<NodeId> {
    for ancestor in doc.ancestors(from) {
        if ancestor == doc.root() {
            return doc.lookup(name);
        }
        let scope = doc.qualified_name(ancestor);
        if scope.is_empty() {
            continue;
        }
        if let Some(found) = doc.lookup(&format!("{scope}.{name}")) {
            return Some(found);
        }
    }
    // `from` is the root itself
    doc.lookup(name)
}

/// Read access to current field values, for resolving references.
///
/// Implemented by the engine's record. Reading may decode lazily, hence
/// `&mut self`.
pub trait ValueLookup {
    /// Current value of `node` at `dims`; `None` when the field has no value
    /// and no initial value.
    fn current_value(&mut self, node: NodeId, dims: &Dimensions)
        -> Result<Option<Value>, DataError>;
}

/// Resolve an integer attribute of `node`.
///
/// Returns `Ok(None)` when the attribute is unset. A reference reads the
/// linked target's current value at the prefix of `dims` that addresses the
/// target. The value is recomputed on every call.
pub fn resolve_integer<L: ValueLookup + ?Sized>(
    doc: &Document,
    lookup: &mut L,
    node: NodeId,
    attr: &IntAttr,
    link: Option<NodeId>,
    dims: &Dimensions,
) -> Result<Option<i64>, DataError> {
    let name = match attr {
        IntAttr::Unset => return Ok(None),
        IntAttr::Literal(v) => return Ok(Some(*v)),
        IntAttr::Reference(name) => name,
    };
    let Some(target) = link else {
        return Err(DataError::UnresolvedReference {
            field: doc.name_for_exception(node),
            reference: name.clone(),
        });
    };
    let target_dims = dims.prefix(doc.array_path(target).len());
    let value = lookup.current_value(target, &target_dims)?;
    let Some(value) = value else {
        return Err(DataError::UnresolvedReference {
            field: doc.name_for_exception(node),
            reference: doc.name_for_exception(target),
        });
    };
    value_as_integer(&value)
        .map(Some)
        .ok_or_else(|| DataError::NonNumericReference {
            field: doc.name_for_exception(node),
            reference: doc.name_for_exception(target),
            value: value.to_string(),
        })
}

/// Integer view of a value: numeric text or any integral number.
pub fn value_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Text(s) => s.trim().parse::<i64>().ok(),
        Value::Short(v) => Some(i64::from(*v)),
        Value::Int(v) => Some(i64::from(*v)),
        Value::Long(v) => Some(*v),
        Value::Float(v) => integral_f64(f64::from(*v)),
        Value::Double(v) => integral_f64(*v),
        Value::Decimal(d) => integral_decimal(d),
        Value::Bytes(_) => None,
    }
}

fn integral_f64(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e18 {
        Some(v as i64)
    } else {
        None
    }
}

fn integral_decimal(d: &BigDecimal) -> Option<i64> {
    if d.is_integer() {
        d.to_i64()
    } else {
        None
    }
}
