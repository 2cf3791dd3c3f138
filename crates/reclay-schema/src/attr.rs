//! Typed node attributes and their parsing from raw attribute maps.
//!
//! Parsing never stops at the first defect: every problem is pushed as a
//! [`SpecificationError`] and a usable default is substituted, so the loader
//! can keep walking and report all defects of a document at once.

use indexmap::IndexMap;

use reclay_core::{CharType, DataKind, SpecificationError, TextOrdering, TrimPolicy, Usage};

/// An integer attribute given as a literal or as a reference to a field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IntAttr {
    /// Not declared.
    #[default]
    Unset,
    /// A literal value.
    Literal(i64),
    /// The current value of the named field.
    Reference(String),
}

impl IntAttr {
    /// The reference name, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the attribute was declared.
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }
}

/// The base an explicit offset is measured from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OffsetFrom {
    /// The starting offset of the direct parent.
    #[default]
    Parent,
    /// A literal buffer position.
    Literal(i64),
    /// The starting offset of the named ancestor.
    Anchor(String),
}

/// Attributes of a `struct` node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructAttrs {
    /// Repetition count; unset means singular.
    pub count: IntAttr,
    /// Explicit offset; unset means sequential.
    pub offset: IntAttr,
    /// Base of the explicit offset.
    pub offsetfrom: OffsetFrom,
}

/// Attributes of a `data` node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataAttrs {
    /// Wire type.
    pub kind: DataKind,
    /// Length in characters, bytes or digits (by kind).
    pub length: IntAttr,
    /// Declared precision, if any.
    pub precision: Option<u32>,
    /// Declared character encoding, if any.
    pub encoding: Option<u32>,
    /// Repetition count; unset means singular.
    pub count: IntAttr,
    /// Explicit offset; unset means sequential.
    pub offset: IntAttr,
    /// Base of the explicit offset.
    pub offsetfrom: OffsetFrom,
    /// Initial value literal.
    pub init: Option<String>,
    /// Padding removed from decoded text.
    pub trim: TrimPolicy,
    /// Name of the struct a struct-typed field expands to.
    pub structure: Option<String>,
    /// Character width class.
    pub char_type: CharType,
    /// Ordering of bidirectional text.
    pub ordering: TextOrdering,
}

impl DataAttrs {
    /// Defaults for a field of the given kind.
    pub fn new(kind: DataKind) -> Self {
        Self {
            kind,
            length: IntAttr::Unset,
            precision: None,
            encoding: None,
            count: IntAttr::Unset,
            offset: IntAttr::Unset,
            offsetfrom: OffsetFrom::Parent,
            init: None,
            trim: TrimPolicy::None,
            structure: None,
            char_type: CharType::OneByte,
            ordering: TextOrdering::Default,
        }
    }

    /// Precision in effect: the declared one, else the kind's default.
    ///
    /// Binary integers default to signed (`8 * length - 1` bits); decimals
    /// default to no fraction digits.
    pub fn effective_precision(&self, length: i64) -> u32 {
        match (self.precision, self.kind) {
            (Some(p), _) => p,
            (None, DataKind::Binary) => (length.clamp(1, 8) as u32) * 8 - 1,
            _ => 0,
        }
    }
}

/// Attribute names understood on `struct` tags.
pub const STRUCT_ATTRIBUTES: &[&str] = &["name", "usage", "count", "offset", "offsetfrom"];

/// Attribute names understood on `data` tags.
pub const DATA_ATTRIBUTES: &[&str] = &[
    "name",
    "type",
    "usage",
    "length",
    "precision",
    "ccsid",
    "count",
    "offset",
    "offsetfrom",
    "init",
    "trim",
    "struct",
    "chartype",
    "bidistringtype",
];

/// Attribute names understood on the document tag.
pub const DOCUMENT_ATTRIBUTES: &[&str] = &["name", "version"];

/// Collects defects for one node while its attributes are parsed.
pub(crate) struct AttrParser<'a> {
    node: &'a str,
    attrs: &'a IndexMap<String, String>,
    errors: Vec<SpecificationError>,
}

impl<'a> AttrParser<'a> {
    pub(crate) fn new(node: &'a str, attrs: &'a IndexMap<String, String>) -> Self {
        Self {
            node,
            attrs,
            errors: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Vec<SpecificationError> {
        self.errors
    }

    fn bad_value(&mut self, attribute: &str, value: &str) {
        self.errors.push(SpecificationError::BadAttributeValue {
            node: self.node.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        });
    }

    fn not_allowed(&mut self, attribute: &str, kind: DataKind) {
        self.errors.push(SpecificationError::AttributeNotAllowed {
            node: self.node.to_string(),
            attribute: attribute.to_string(),
            data_kind: kind.to_string(),
        });
    }

    fn missing(&mut self, attribute: &str) {
        self.errors.push(SpecificationError::MissingAttribute {
            node: self.node.to_string(),
            attribute: attribute.to_string(),
        });
    }

    pub(crate) fn check_known(&mut self, known: &[&str]) {
        for key in self.attrs.keys() {
            if !known.contains(&key.as_str()) {
                self.errors.push(SpecificationError::UnknownAttribute {
                    node: self.node.to_string(),
                    attribute: key.clone(),
                });
            }
        }
    }

    fn get(&self, attribute: &str) -> Option<&'a str> {
        self.attrs.get(attribute).map(String::as_str)
    }

    pub(crate) fn usage(&mut self) -> Usage {
        match self.get("usage") {
            None => Usage::Inherit,
            Some(v) => Usage::from_attr(v).unwrap_or_else(|| {
                self.bad_value("usage", v);
                Usage::Inherit
            }),
        }
    }

    /// Integer-or-reference attribute. Literals must be non-negative.
    fn int_attr(&mut self, attribute: &str) -> IntAttr {
        let Some(raw) = self.get(attribute) else {
            return IntAttr::Unset;
        };
        match parse_int_or_name(raw) {
            Some(IntAttr::Literal(v)) if v < 0 => {
                self.bad_value(attribute, raw);
                IntAttr::Unset
            }
            Some(attr) => attr,
            None => {
                self.bad_value(attribute, raw);
                IntAttr::Unset
            }
        }
    }

    /// Non-negative literal attribute.
    fn u32_attr(&mut self, attribute: &str) -> Option<u32> {
        let raw = self.get(attribute)?;
        match raw.trim().parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.bad_value(attribute, raw);
                None
            }
        }
    }

    fn offsetfrom(&mut self) -> OffsetFrom {
        match self.get("offsetfrom") {
            None => OffsetFrom::Parent,
            Some(raw) => match parse_int_or_name(raw) {
                Some(IntAttr::Literal(v)) if v >= 0 => OffsetFrom::Literal(v),
                Some(IntAttr::Reference(name)) => OffsetFrom::Anchor(name),
                _ => {
                    self.bad_value("offsetfrom", raw);
                    OffsetFrom::Parent
                }
            },
        }
    }

    pub(crate) fn struct_attrs(&mut self) -> StructAttrs {
        StructAttrs {
            count: self.int_attr("count"),
            offset: self.int_attr("offset"),
            offsetfrom: self.offsetfrom(),
        }
    }

    pub(crate) fn data_attrs(&mut self) -> DataAttrs {
        let kind = match self.get("type") {
            None => {
                self.missing("type");
                DataKind::Character
            }
            Some(raw) => DataKind::from_attr(raw).unwrap_or_else(|| {
                self.bad_value("type", raw);
                DataKind::Character
            }),
        };
        let mut data = DataAttrs::new(kind);
        data.count = self.int_attr("count");
        data.offset = self.int_attr("offset");
        data.offsetfrom = self.offsetfrom();

        // struct reference xor length, by kind
        if kind == DataKind::Struct {
            if self.get("length").is_some() {
                self.not_allowed("length", kind);
            }
            match self.get("struct") {
                Some(name) if is_valid_name(name) => data.structure = Some(name.to_string()),
                Some(name) => self.bad_value("struct", name),
                None => self.missing("struct"),
            }
            if self.get("init").is_some() {
                self.not_allowed("init", kind);
            }
            if self.get("ccsid").is_some() {
                self.not_allowed("ccsid", kind);
            }
        } else {
            if self.get("struct").is_some() {
                self.not_allowed("struct", kind);
            }
            data.length = self.int_attr("length");
            if !data.length.is_set() && kind.requires_length() && self.get("length").is_none() {
                self.missing("length");
            }
            data.init = self.get("init").map(str::to_string);
            data.encoding = self.u32_attr("ccsid");
        }

        if self.get("precision").is_some() {
            if kind.allows_precision() {
                data.precision = self.u32_attr("precision");
            } else {
                self.not_allowed("precision", kind);
            }
        }

        self.check_literal_length(&mut data);

        if kind == DataKind::Character {
            if let Some(raw) = self.get("trim") {
                data.trim = TrimPolicy::from_attr(raw).unwrap_or_else(|| {
                    self.bad_value("trim", raw);
                    TrimPolicy::None
                });
            }
            if let Some(raw) = self.get("chartype") {
                data.char_type = CharType::from_attr(raw).unwrap_or_else(|| {
                    self.bad_value("chartype", raw);
                    CharType::OneByte
                });
            }
            if let Some(raw) = self.get("bidistringtype") {
                data.ordering = TextOrdering::from_attr(raw).unwrap_or_else(|| {
                    self.bad_value("bidistringtype", raw);
                    TextOrdering::Default
                });
            }
        } else {
            for attribute in ["trim", "chartype", "bidistringtype"] {
                if self.get(attribute).is_some() {
                    self.not_allowed(attribute, kind);
                }
            }
        }
        data
    }

    /// Kind-specific constraints on literal lengths and precisions.
    fn check_literal_length(&mut self, data: &mut DataAttrs) {
        let IntAttr::Literal(length) = data.length else {
            return;
        };
        let raw_length = self.get("length").unwrap_or_default();
        match data.kind {
            DataKind::Binary => {
                let allowed: &[u32] = match length {
                    2 => &[15, 16],
                    4 => &[31, 32],
                    8 => &[63, 64],
                    _ => {
                        self.bad_value("length", raw_length);
                        return;
                    }
                };
                if let Some(p) = data.precision {
                    if !allowed.contains(&p) {
                        let raw = self.get("precision").unwrap_or_default();
                        self.bad_value("precision", raw);
                        data.precision = None;
                    }
                }
            }
            DataKind::Float => {
                if length != 4 && length != 8 {
                    self.bad_value("length", raw_length);
                }
            }
            DataKind::Packed | DataKind::Zoned => {
                if let Some(p) = data.precision {
                    if i64::from(p) > length {
                        let raw = self.get("precision").unwrap_or_default();
                        self.bad_value("precision", raw);
                        data.precision = None;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Parse `raw` as an integer literal or a field name.
///
/// Anything starting with a digit or sign must be a complete integer; anything
/// else must be a valid (possibly dotted) name.
pub fn parse_int_or_name(raw: &str) -> Option<IntAttr> {
    let raw = raw.trim();
    let first = raw.chars().next()?;
    if first.is_ascii_digit() || first == '-' || first == '+' {
        raw.parse::<i64>().ok().map(IntAttr::Literal)
    } else if is_valid_name(raw) {
        Some(IntAttr::Reference(raw.to_string()))
    } else {
        None
    }
}

/// Whether `name` is a dotted sequence of identifier segments.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '#' | '$' | '@'))
        })
}
