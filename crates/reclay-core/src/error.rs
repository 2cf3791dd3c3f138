//! Error types for the reclay engine.
//!
//! Four categories, matching where a defect is detected:
//!
//! - [`SpecificationError`]: schema defects found while loading. Accumulated
//!   over the whole document so one load reports every defect.
//! - [`ParseError`]: grammar-level defects in the tag stream, accumulated in
//!   [`ParseErrors`].
//! - [`DataError`]: runtime marshalling defects. Abort the call in progress.
//! - [`InternalError`]: states that validation should have made unreachable.
//!
//! Every error exposes a stable category `key()` and positional `args()` so
//! callers can render messages themselves; `Display` gives a default English
//! rendering.

use std::error::Error;
use std::fmt;

// ── SpecificationError ──────────────────────────────────────────

/// A defect in the schema, found by a post-parse pass.
///
/// Node identities are display names (see `Document::name_for_exception`),
/// so every variant is meaningful even for unnamed nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecificationError {
    /// Two nodes share a qualified name.
    DuplicateName {
        /// The colliding qualified name.
        name: String,
    },
    /// A tag that is not part of the schema vocabulary.
    UnknownTag {
        /// The tag name.
        tag: String,
        /// Display name of the enclosing node.
        parent: String,
    },
    /// A known tag nested where it may not appear.
    TagNotAllowed {
        /// The tag name.
        tag: String,
        /// Display name of the enclosing node.
        parent: String,
    },
    /// An attribute the tag does not define.
    UnknownAttribute {
        /// Display name of the node.
        node: String,
        /// The attribute name.
        attribute: String,
    },
    /// An attribute value with invalid syntax or out of range.
    BadAttributeValue {
        /// Display name of the node.
        node: String,
        /// The attribute name.
        attribute: String,
        /// The raw value.
        value: String,
    },
    /// An attribute that is defined, but not for this data kind.
    AttributeNotAllowed {
        /// Display name of the node.
        node: String,
        /// The attribute name.
        attribute: String,
        /// The node's declared data kind.
        data_kind: String,
    },
    /// A required attribute is absent.
    MissingAttribute {
        /// Display name of the node.
        node: String,
        /// The attribute name.
        attribute: String,
    },
    /// A reference names no node.
    ReferenceNotFound {
        /// Display name of the referring node.
        node: String,
        /// The referring attribute.
        attribute: String,
        /// The unresolved name.
        reference: String,
    },
    /// A reference names a node of the wrong kind.
    ReferenceWrongKind {
        /// Display name of the referring node.
        node: String,
        /// The referring attribute.
        attribute: String,
        /// The resolved name.
        reference: String,
        /// The kind the attribute requires.
        expected: &'static str,
    },
    /// A reference names the referring node itself or one of its descendants.
    SelfReference {
        /// Display name of the referring node.
        node: String,
        /// The referring attribute.
        attribute: String,
        /// The resolved name.
        reference: String,
    },
    /// Struct expansion reached a struct already on the expansion path.
    CircularStructReference {
        /// Display name of the struct-typed leaf where the cycle closes.
        node: String,
        /// The struct that is already being expanded.
        structure: String,
    },
    /// An `offsetfrom` anchor that is not an ancestor of the node.
    OffsetFromNotAncestor {
        /// Display name of the node.
        node: String,
        /// The anchor name.
        anchor: String,
    },
}

impl SpecificationError {
    /// Stable category key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DuplicateName { .. } => "spec.duplicate_name",
            Self::UnknownTag { .. } => "spec.unknown_tag",
            Self::TagNotAllowed { .. } => "spec.tag_not_allowed",
            Self::UnknownAttribute { .. } => "spec.unknown_attribute",
            Self::BadAttributeValue { .. } => "spec.bad_attribute_value",
            Self::AttributeNotAllowed { .. } => "spec.attribute_not_allowed",
            Self::MissingAttribute { .. } => "spec.missing_attribute",
            Self::ReferenceNotFound { .. } => "spec.reference_not_found",
            Self::ReferenceWrongKind { .. } => "spec.reference_wrong_kind",
            Self::SelfReference { .. } => "spec.self_reference",
            Self::CircularStructReference { .. } => "spec.circular_struct_reference",
            Self::OffsetFromNotAncestor { .. } => "spec.offsetfrom_not_ancestor",
        }
    }

    /// Positional message arguments, in the order of the variant's fields.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::DuplicateName { name } => vec![name.clone()],
            Self::UnknownTag { tag, parent } | Self::TagNotAllowed { tag, parent } => {
                vec![tag.clone(), parent.clone()]
            }
            Self::UnknownAttribute { node, attribute }
            | Self::MissingAttribute { node, attribute } => vec![node.clone(), attribute.clone()],
            Self::BadAttributeValue {
                node,
                attribute,
                value,
            } => vec![node.clone(), attribute.clone(), value.clone()],
            Self::AttributeNotAllowed {
                node,
                attribute,
                data_kind,
            } => vec![node.clone(), attribute.clone(), data_kind.clone()],
            Self::ReferenceNotFound {
                node,
                attribute,
                reference,
            }
            | Self::SelfReference {
                node,
                attribute,
                reference,
            } => vec![node.clone(), attribute.clone(), reference.clone()],
            Self::ReferenceWrongKind {
                node,
                attribute,
                reference,
                expected,
            } => vec![
                node.clone(),
                attribute.clone(),
                reference.clone(),
                expected.to_string(),
            ],
            Self::CircularStructReference { node, structure } => {
                vec![node.clone(), structure.clone()]
            }
            Self::OffsetFromNotAncestor { node, anchor } => vec![node.clone(), anchor.clone()],
        }
    }
}

impl fmt::Display for SpecificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "duplicate qualified name '{name}'"),
            Self::UnknownTag { tag, parent } => write!(f, "unknown tag <{tag}> in '{parent}'"),
            Self::TagNotAllowed { tag, parent } => {
                write!(f, "tag <{tag}> is not allowed in '{parent}'")
            }
            Self::UnknownAttribute { node, attribute } => {
                write!(f, "'{node}': unknown attribute '{attribute}'")
            }
            Self::BadAttributeValue {
                node,
                attribute,
                value,
            } => write!(f, "'{node}': bad value '{value}' for attribute '{attribute}'"),
            Self::AttributeNotAllowed {
                node,
                attribute,
                data_kind,
            } => write!(
                f,
                "'{node}': attribute '{attribute}' is not allowed for type '{data_kind}'"
            ),
            Self::MissingAttribute { node, attribute } => {
                write!(f, "'{node}': missing required attribute '{attribute}'")
            }
            Self::ReferenceNotFound {
                node,
                attribute,
                reference,
            } => write!(
                f,
                "'{node}': {attribute} reference '{reference}' was not found"
            ),
            Self::ReferenceWrongKind {
                node,
                attribute,
                reference,
                expected,
            } => write!(
                f,
                "'{node}': {attribute} reference '{reference}' is not a {expected} node"
            ),
            Self::SelfReference {
                node,
                attribute,
                reference,
            } => write!(
                f,
                "'{node}': {attribute} reference '{reference}' points into the node itself"
            ),
            Self::CircularStructReference { node, structure } => write!(
                f,
                "'{node}': circular reference to struct '{structure}'"
            ),
            Self::OffsetFromNotAncestor { node, anchor } => {
                write!(f, "'{node}': offsetfrom '{anchor}' is not an ancestor")
            }
        }
    }
}

impl Error for SpecificationError {}

// ── ParseError ──────────────────────────────────────────────────

/// A defect in the tag stream itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The underlying markup is malformed.
    Syntax {
        /// Byte position in the source.
        position: u64,
        /// Description from the tokenizer.
        detail: String,
    },
    /// A close event with no matching open.
    UnbalancedClose {
        /// Index of the event in the stream.
        event: usize,
    },
    /// The stream ended with tags still open.
    UnclosedTag {
        /// The innermost unclosed tag.
        tag: String,
    },
    /// The stream names a grammar resource that is not available.
    MissingGrammar {
        /// The resource name.
        resource: String,
    },
}

impl ParseError {
    /// Stable category key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "parse.syntax",
            Self::UnbalancedClose { .. } => "parse.unbalanced_close",
            Self::UnclosedTag { .. } => "parse.unclosed_tag",
            Self::MissingGrammar { .. } => "parse.missing_grammar",
        }
    }

    /// Positional message arguments.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Syntax { position, detail } => vec![position.to_string(), detail.clone()],
            Self::UnbalancedClose { event } => vec![event.to_string()],
            Self::UnclosedTag { tag } => vec![tag.clone()],
            Self::MissingGrammar { resource } => vec![resource.clone()],
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { position, detail } => {
                write!(f, "syntax error at byte {position}: {detail}")
            }
            Self::UnbalancedClose { event } => {
                write!(f, "close tag without matching open at event {event}")
            }
            Self::UnclosedTag { tag } => write!(f, "tag <{tag}> was never closed"),
            Self::MissingGrammar { resource } => {
                write!(f, "grammar resource '{resource}' is not available")
            }
        }
    }
}

impl Error for ParseError {}

/// Accumulated parse errors for one load.
///
/// Once a [`ParseError::MissingGrammar`] has been recorded, later errors are
/// counted as suppressed instead of stored: without the grammar they are
/// cascade noise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
    suppressed: usize,
    grammar_missing: bool,
}

impl ParseErrors {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, subject to grammar-missing suppression.
    pub fn push(&mut self, error: ParseError) {
        if self.grammar_missing {
            self.suppressed += 1;
            return;
        }
        if matches!(error, ParseError::MissingGrammar { .. }) {
            self.grammar_missing = true;
        }
        self.errors.push(error);
    }

    /// Recorded errors, in order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Number of errors dropped after a missing grammar.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.errors {
            writeln!(f, "{e}")?;
        }
        write!(f, "{} parse error(s)", self.errors.len())?;
        if self.suppressed > 0 {
            write!(f, ", {} suppressed", self.suppressed)?;
        }
        Ok(())
    }
}

impl Error for ParseErrors {}

// ── DataError ───────────────────────────────────────────────────

/// A defect found while marshalling values for one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataError {
    /// A value is required but none is set and no initial value is declared.
    NullValue {
        /// Display name of the field.
        field: String,
    },
    /// The native value's shape cannot be coerced to the field's kind.
    StringOrNumberExpected {
        /// Display name of the field.
        field: String,
        /// Shape of the offending value.
        found: &'static str,
    },
    /// A text or numeric value that does not fit the field.
    InvalidValue {
        /// Display name of the field.
        field: String,
        /// The offending value, rendered.
        value: String,
        /// What the field accepts.
        expected: &'static str,
    },
    /// A resolved length is negative, or not one a fixed-size kind allows.
    BadLength {
        /// Display name of the field.
        field: String,
        /// The resolved length.
        length: i64,
    },
    /// A resolved count is negative or above the configured maximum.
    BadCount {
        /// Display name of the field.
        field: String,
        /// The resolved count.
        count: i64,
    },
    /// An explicit offset from the parent start falls outside the buffer.
    BadOffset {
        /// Display name of the field.
        field: String,
        /// The computed absolute offset.
        offset: i64,
        /// Buffer length.
        buffer_len: usize,
    },
    /// An explicit offset from a named or literal anchor falls outside the buffer.
    BadTotalOffset {
        /// Display name of the field.
        field: String,
        /// The declared offset.
        offset: i64,
        /// The anchor name (or the literal, rendered).
        anchor: String,
        /// The anchor's starting offset.
        base: i64,
        /// Buffer length.
        buffer_len: usize,
    },
    /// The input ends before the field does.
    NotEnoughData {
        /// Display name of the field.
        field: String,
        /// Bytes the field needs from its position.
        needed: usize,
        /// Bytes available from its position.
        available: usize,
    },
    /// Input bytes remain after the last field.
    ExcessData {
        /// Bytes the layout consumed.
        consumed: usize,
        /// Bytes supplied.
        supplied: usize,
    },
    /// A value operation on a struct-typed field.
    StructValueAccess {
        /// Display name of the field.
        field: String,
    },
    /// A referenced field has no value to resolve against.
    UnresolvedReference {
        /// Display name of the referring field.
        field: String,
        /// Display name of the referenced field.
        reference: String,
    },
    /// A referenced field's value is not an integer.
    NonNumericReference {
        /// Display name of the referring field.
        field: String,
        /// Display name of the referenced field.
        reference: String,
        /// The referenced value, rendered.
        value: String,
    },
    /// No field with this qualified name.
    UnknownField {
        /// The requested name.
        name: String,
    },
    /// The number of indices does not match the field's array nesting.
    WrongDimensions {
        /// Display name of the field.
        field: String,
        /// Required number of indices.
        expected: usize,
        /// Supplied number of indices.
        actual: usize,
    },
    /// An index at or beyond the array's current size.
    IndexOutOfBounds {
        /// Display name of the field.
        field: String,
        /// The index.
        index: u32,
        /// The array's current size.
        size: u32,
    },
    /// The codec rejected a value or byte sequence.
    Codec {
        /// Display name of the field.
        field: String,
        /// Detail from the codec.
        detail: String,
    },
    /// The codec produced a byte count different from the field's length.
    CodecLength {
        /// Display name of the field.
        field: String,
        /// Bytes required.
        expected: usize,
        /// Bytes produced.
        actual: usize,
    },
    /// The serialized record would exceed the configured maximum.
    RecordTooLarge {
        /// Bytes required.
        length: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A field's byte length exceeds the configured per-field maximum.
    FieldTooLarge {
        /// Display name of the field.
        field: String,
        /// The resolved length.
        length: i64,
        /// Bytes the length occupies.
        bytes: usize,
        /// Configured maximum.
        max: usize,
    },
    /// An unreachable state was reached while marshalling.
    Internal(InternalError),
}

impl DataError {
    /// Stable category key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::NullValue { .. } => "data.null_value",
            Self::StringOrNumberExpected { .. } => "data.string_or_number_expected",
            Self::InvalidValue { .. } => "data.invalid_value",
            Self::BadLength { .. } => "data.bad_length",
            Self::BadCount { .. } => "data.bad_count",
            Self::BadOffset { .. } => "data.bad_offset",
            Self::BadTotalOffset { .. } => "data.bad_total_offset",
            Self::NotEnoughData { .. } => "data.not_enough_data",
            Self::ExcessData { .. } => "data.excess_data",
            Self::StructValueAccess { .. } => "data.struct_value_access",
            Self::UnresolvedReference { .. } => "data.unresolved_reference",
            Self::NonNumericReference { .. } => "data.non_numeric_reference",
            Self::UnknownField { .. } => "data.unknown_field",
            Self::WrongDimensions { .. } => "data.wrong_dimensions",
            Self::IndexOutOfBounds { .. } => "data.index_out_of_bounds",
            Self::Codec { .. } => "data.codec",
            Self::CodecLength { .. } => "data.codec_length",
            Self::RecordTooLarge { .. } => "data.record_too_large",
            Self::FieldTooLarge { .. } => "data.field_too_large",
            Self::Internal(e) => e.key(),
        }
    }

    /// Positional message arguments.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::NullValue { field }
            | Self::StructValueAccess { field } => vec![field.clone()],
            Self::StringOrNumberExpected { field, found } => {
                vec![found.to_string(), field.clone()]
            }
            Self::InvalidValue {
                field,
                value,
                expected,
            } => vec![field.clone(), value.clone(), expected.to_string()],
            Self::BadLength { field, length } => vec![field.clone(), length.to_string()],
            Self::BadCount { field, count } => vec![field.clone(), count.to_string()],
            Self::BadOffset {
                field,
                offset,
                buffer_len,
            } => vec![field.clone(), offset.to_string(), buffer_len.to_string()],
            Self::BadTotalOffset {
                field,
                offset,
                anchor,
                base,
                buffer_len,
            } => vec![
                field.clone(),
                offset.to_string(),
                anchor.clone(),
                base.to_string(),
                buffer_len.to_string(),
            ],
            Self::NotEnoughData {
                field,
                needed,
                available,
            } => vec![field.clone(), needed.to_string(), available.to_string()],
            Self::ExcessData { consumed, supplied } => {
                vec![consumed.to_string(), supplied.to_string()]
            }
            Self::UnresolvedReference { field, reference } => {
                vec![field.clone(), reference.clone()]
            }
            Self::NonNumericReference {
                field,
                reference,
                value,
            } => vec![field.clone(), reference.clone(), value.clone()],
            Self::UnknownField { name } => vec![name.clone()],
            Self::WrongDimensions {
                field,
                expected,
                actual,
            } => vec![field.clone(), expected.to_string(), actual.to_string()],
            Self::IndexOutOfBounds { field, index, size } => {
                vec![field.clone(), index.to_string(), size.to_string()]
            }
            Self::Codec { field, detail } => vec![field.clone(), detail.clone()],
            Self::CodecLength {
                field,
                expected,
                actual,
            } => vec![field.clone(), expected.to_string(), actual.to_string()],
            Self::RecordTooLarge { length, max } => vec![length.to_string(), max.to_string()],
            Self::FieldTooLarge {
                field,
                length,
                bytes,
                max,
            } => vec![
                field.clone(),
                length.to_string(),
                bytes.to_string(),
                max.to_string(),
            ],
            Self::Internal(e) => e.args(),
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullValue { field } => write!(f, "'{field}': no value set"),
            Self::StringOrNumberExpected { field, found } => {
                write!(f, "'{field}': string or number expected, found {found}")
            }
            Self::InvalidValue {
                field,
                value,
                expected,
            } => write!(f, "'{field}': value '{value}' is not a valid {expected}"),
            Self::BadLength { field, length } => write!(f, "'{field}': bad length {length}"),
            Self::BadCount { field, count } => write!(f, "'{field}': bad count {count}"),
            Self::BadOffset {
                field,
                offset,
                buffer_len,
            } => write!(
                f,
                "'{field}': bad offset {offset} for buffer of {buffer_len} bytes"
            ),
            Self::BadTotalOffset {
                field,
                offset,
                anchor,
                base,
                buffer_len,
            } => write!(
                f,
                "'{field}': bad total offset: {offset} from '{anchor}' at {base} \
                 exceeds buffer of {buffer_len} bytes"
            ),
            Self::NotEnoughData {
                field,
                needed,
                available,
            } => write!(
                f,
                "'{field}': not enough data: needed {needed} bytes, {available} available"
            ),
            Self::ExcessData { consumed, supplied } => write!(
                f,
                "excess data: layout consumed {consumed} of {supplied} bytes"
            ),
            Self::StructValueAccess { field } => {
                write!(f, "'{field}': struct-typed fields have no value")
            }
            Self::UnresolvedReference { field, reference } => {
                write!(f, "'{field}': referenced field '{reference}' has no value")
            }
            Self::NonNumericReference {
                field,
                reference,
                value,
            } => write!(
                f,
                "'{field}': referenced field '{reference}' has non-numeric value '{value}'"
            ),
            Self::UnknownField { name } => write!(f, "unknown field '{name}'"),
            Self::WrongDimensions {
                field,
                expected,
                actual,
            } => write!(
                f,
                "'{field}': expected {expected} indices, got {actual}"
            ),
            Self::IndexOutOfBounds { field, index, size } => {
                write!(f, "'{field}': index {index} out of bounds for size {size}")
            }
            Self::Codec { field, detail } => write!(f, "'{field}': codec error: {detail}"),
            Self::CodecLength {
                field,
                expected,
                actual,
            } => write!(
                f,
                "'{field}': codec produced {actual} bytes, expected {expected}"
            ),
            Self::RecordTooLarge { length, max } => {
                write!(f, "record of {length} bytes exceeds maximum of {max}")
            }
            Self::FieldTooLarge {
                field,
                length,
                bytes,
                max,
            } => write!(
                f,
                "'{field}': length {length} takes {bytes} bytes, above maximum of {max}"
            ),
            Self::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InternalError> for DataError {
    fn from(e: InternalError) -> Self {
        Self::Internal(e)
    }
}

// ── InternalError ───────────────────────────────────────────────

/// A state validation should have ruled out. Not retryable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InternalError {
    /// A node kind the operation cannot handle.
    UnrecognizedNodeKind {
        /// Display name of the node.
        node: String,
        /// The kind found.
        kind: String,
    },
    /// A field's stored entries do not nest as deep as its array path.
    StorageShape {
        /// Display name of the field.
        field: String,
        /// Number of array levels on the field's path.
        depth: usize,
    },
}

impl InternalError {
    /// Stable category key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::UnrecognizedNodeKind { .. } => "internal.unrecognized_node_kind",
            Self::StorageShape { .. } => "internal.storage_shape",
        }
    }

    /// Positional message arguments.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::UnrecognizedNodeKind { node, kind } => vec![node.clone(), kind.clone()],
            Self::StorageShape { field, depth } => vec![field.clone(), depth.to_string()],
        }
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedNodeKind { node, kind } => {
                write!(f, "internal error: '{node}' has unexpected kind {kind}")
            }
            Self::StorageShape { field, depth } => write!(
                f,
                "internal error: storage of '{field}' does not match its {depth} array level(s)"
            ),
        }
    }
}

impl Error for InternalError {}

// ── LoadError ───────────────────────────────────────────────────

/// Why a schema document failed to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The tag stream was malformed.
    Parse(ParseErrors),
    /// The schema has one or more defects; all of them are listed.
    Specification(Vec<SpecificationError>),
    /// An unreachable state was reached.
    Internal(InternalError),
}

impl LoadError {
    /// The specification errors, if that is why loading failed.
    pub fn specification_errors(&self) -> &[SpecificationError] {
        match self {
            Self::Specification(errors) => errors,
            _ => &[],
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(errors) => write!(f, "{errors}"),
            Self::Specification(errors) => {
                for e in errors {
                    writeln!(f, "{e}")?;
                }
                write!(f, "{} specification error(s)", errors.len())
            }
            Self::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Internal(e) => Some(e),
            Self::Specification(_) => None,
        }
    }
}

impl From<InternalError> for LoadError {
    fn from(e: InternalError) -> Self {
        Self::Internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_grammar_suppresses_later_errors() {
        let mut errors = ParseErrors::new();
        errors.push(ParseError::UnclosedTag { tag: "a".into() });
        errors.push(ParseError::MissingGrammar {
            resource: "layout.dtd".into(),
        });
        errors.push(ParseError::UnbalancedClose { event: 4 });
        errors.push(ParseError::UnbalancedClose { event: 5 });
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.suppressed(), 2);
        let rendered = errors.to_string();
        assert!(rendered.ends_with("2 parse error(s), 2 suppressed"));
    }

    #[test]
    fn keys_and_args_are_positional() {
        let e = DataError::StringOrNumberExpected {
            field: "rec.qty".into(),
            found: "bytes",
        };
        assert_eq!(e.key(), "data.string_or_number_expected");
        assert_eq!(e.args(), vec!["bytes".to_string(), "rec.qty".to_string()]);

        let e = SpecificationError::CircularStructReference {
            node: "a.b".into(),
            structure: "a".into(),
        };
        assert_eq!(e.key(), "spec.circular_struct_reference");
        assert_eq!(e.args().len(), 2);
    }

    #[test]
    fn load_error_lists_every_specification_error() {
        let err = LoadError::Specification(vec![
            SpecificationError::DuplicateName { name: "a".into() },
            SpecificationError::MissingAttribute {
                node: "b".into(),
                attribute: "type".into(),
            },
        ]);
        assert_eq!(err.specification_errors().len(), 2);
        assert!(err.to_string().ends_with("2 specification error(s)"));
    }
}
