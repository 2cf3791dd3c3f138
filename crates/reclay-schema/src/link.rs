//! The link pass: resolve every reference attribute to a node handle.
//!
//! Runs once after struct expansion, over the final tree, so references in
//! expanded copies resolve relative to where the copy lives.

use std::collections::HashSet;

use tracing::debug;

use reclay_core::{DataKind, NodeId, NodeKind, SpecificationError};

use crate::attr::{IntAttr, OffsetFrom};
use crate::document::Document;
use crate::node::NodeBody;
use crate::resolve::resolve_relative_node;

/// Resolve `count`, `length`, `offset` and `offsetfrom` references.
///
/// Struct templates are checked leniently: inside a struct that is used as
/// an expansion template, a reference that does not resolve is skipped,
/// since it may only be meaningful where the struct is expanded. The
/// expanded copies are checked normally.
pub fn link_references(doc: &mut Document, templates: &HashSet<NodeId>) {
    let mut linked = 0usize;
    for index in 1..doc.len() {
        let id = NodeId(index as u32);
        let lenient = in_template(doc, id, templates);
        let node = doc.node(id);
        let (count, length, offset, offsetfrom) = match &node.body {
            NodeBody::Struct(s) => (
                s.count.clone(),
                IntAttr::Unset,
                s.offset.clone(),
                s.offsetfrom.clone(),
            ),
            NodeBody::Data(d) => (
                d.count.clone(),
                d.length.clone(),
                d.offset.clone(),
                d.offsetfrom.clone(),
            ),
            NodeBody::Document => continue,
        };

        let count = link_int(doc, id, "count", &count, lenient);
        let length = link_int(doc, id, "length", &length, lenient);
        let offset = link_int(doc, id, "offset", &offset, lenient);
        let anchor = match offsetfrom {
            OffsetFrom::Anchor(name) => link_anchor(doc, id, &name, lenient),
            _ => None,
        };
        linked += [count, length, offset, anchor].iter().flatten().count();

        let links = &mut doc.node_mut(id).links;
        links.count = count;
        links.length = length;
        links.offset = offset;
        links.anchor = anchor;
    }
    debug!(linked, "reference links resolved");
}

fn in_template(doc: &Document, id: NodeId, templates: &HashSet<NodeId>) -> bool {
    let top = std::iter::once(id)
        .chain(doc.ancestors(id))
        .find(|&n| doc.parent(n) == Some(doc.root()));
    top.is_some_and(|t| templates.contains(&t))
}

fn link_int(
    doc: &mut Document,
    id: NodeId,
    attribute: &str,
    attr: &IntAttr,
    lenient: bool,
) -> Option<NodeId> {
    let name = attr.reference()?;
    let Some(target) = resolve_relative_node(doc, id, name) else {
        if lenient {
            debug!(
                node = %doc.name_for_exception(id),
                attribute,
                name,
                "template reference left unresolved"
            );
        } else {
            let error = SpecificationError::ReferenceNotFound {
                node: doc.name_for_exception(id),
                attribute: attribute.to_string(),
                reference: name.to_string(),
            };
            doc.record_error(error);
        }
        return None;
    };

    let target_node = doc.node(target);
    let is_scalar = target_node.kind() == NodeKind::Data
        && target_node.data_kind() != Some(DataKind::Struct);
    if !is_scalar {
        let error = SpecificationError::ReferenceWrongKind {
            node: doc.name_for_exception(id),
            attribute: attribute.to_string(),
            reference: name.to_string(),
            expected: "data",
        };
        doc.record_error(error);
        return None;
    }
    if target == id || doc.is_ancestor(id, target) {
        let error = SpecificationError::SelfReference {
            node: doc.name_for_exception(id),
            attribute: attribute.to_string(),
            reference: name.to_string(),
        };
        doc.record_error(error);
        return None;
    }
    Some(target)
}

fn link_anchor(doc: &mut Document, id: NodeId, name: &str, lenient: bool) -> Option<NodeId> {
    match resolve_relative_node(doc, id, name) {
        Some(anchor) if doc.is_ancestor(anchor, id) => Some(anchor),
        Some(_) => {
            let error = SpecificationError::OffsetFromNotAncestor {
                node: doc.name_for_exception(id),
                anchor: name.to_string(),
            };
            doc.record_error(error);
            None
        }
        None if lenient => None,
        None => {
            let error = SpecificationError::ReferenceNotFound {
                node: doc.name_for_exception(id),
                attribute: "offsetfrom".into(),
                reference: name.to_string(),
            };
            doc.record_error(error);
            None
        }
    }
}
