//! Field geometry and buffer positions.
//!
//! A traversal keeps a running byte cursor and a stack holding the starting
//! offset of every container instance it is inside. Fields without an
//! explicit offset sit at the cursor. An explicit offset is measured from a
//! base (the direct parent's start, a named ancestor's start, or a literal
//! position); a target past the cursor skips the gap as padding, a target
//! before it overlays bytes already laid out.

use reclay_core::{CodecSignature, DataError, DataKind, NodeId, TextOrdering};

use crate::coerce::Shape;

/// Byte length of a field of `kind` whose resolved length is `length`.
///
/// Packed decimals store two digits per byte plus a sign nibble.
pub fn byte_length(kind: DataKind, length: u32) -> usize {
    match kind {
        DataKind::Packed => length as usize / 2 + 1,
        _ => length as usize,
    }
}

/// Resolved wire geometry of one scalar instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Wire type.
    pub kind: DataKind,
    /// Resolved length, doubled for two-byte text.
    pub length: u32,
    /// Bytes occupied in the buffer.
    pub byte_length: usize,
    /// Effective precision.
    pub precision: u32,
    /// Character encoding.
    pub encoding: u32,
    /// Text ordering handed to the codec.
    pub ordering: TextOrdering,
}

impl Geometry {
    /// Codec lookup key.
    pub fn signature(&self) -> CodecSignature {
        CodecSignature {
            kind: self.kind,
            length: self.length,
            precision: self.precision,
            encoding: self.encoding,
        }
    }

    /// Coercion target.
    pub fn shape(&self) -> Shape {
        Shape {
            kind: self.kind,
            length: self.length,
            precision: self.precision,
        }
    }
}

/// What an explicit offset is measured from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Base {
    /// The direct parent's starting offset.
    Parent(usize),
    /// A named ancestor's starting offset.
    Anchor {
        /// The ancestor's name as declared.
        name: String,
        /// Its starting offset.
        start: usize,
    },
    /// A literal buffer position.
    Literal(i64),
}

impl Base {
    fn position(&self) -> i64 {
        match self {
            Self::Parent(start) | Self::Anchor { start, .. } => *start as i64,
            Self::Literal(v) => *v,
        }
    }
}

/// Absolute position of an explicit offset.
///
/// The target must not be negative; when `limit` is given (parsing) it must
/// also not lie past the end of the input. `extent` is the buffer length
/// reported in errors.
pub fn explicit_target(
    field: &str,
    offset: i64,
    base: &Base,
    limit: Option<usize>,
    extent: usize,
) -> Result<usize, DataError> {
    let target = base.position().saturating_add(offset);
    let in_range = target >= 0 && limit.is_none_or(|len| target <= len as i64);
    if in_range {
        return Ok(target as usize);
    }
    Err(match base {
        Base::Parent(_) => DataError::BadOffset {
            field: field.to_string(),
            offset: target,
            buffer_len: extent,
        },
        Base::Anchor { name, start } => DataError::BadTotalOffset {
            field: field.to_string(),
            offset,
            anchor: name.clone(),
            base: *start as i64,
            buffer_len: extent,
        },
        Base::Literal(v) => DataError::BadTotalOffset {
            field: field.to_string(),
            offset,
            anchor: v.to_string(),
            base: *v,
            buffer_len: extent,
        },
    })
}

/// Running position of a traversal.
#[derive(Clone, Debug, Default)]
pub struct Cursor {
    /// Next sequential position.
    pub pos: usize,
    /// Furthest byte laid out so far.
    pub end: usize,
    starts: Vec<(NodeId, usize)>,
}

impl Cursor {
    /// A cursor at position zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a container instance starting at the current position.
    pub fn enter(&mut self, node: NodeId) {
        self.starts.push((node, self.pos));
    }

    /// Leave the innermost container instance.
    pub fn leave(&mut self) {
        self.starts.pop();
    }

    /// Start of the innermost container instance; zero outside all of them.
    pub fn parent_start(&self) -> usize {
        self.starts.last().map_or(0, |&(_, start)| start)
    }

    /// Start of the innermost active instance of `node`.
    pub fn start_of(&self, node: NodeId) -> Option<usize> {
        self.starts
            .iter()
            .rev()
            .find(|&&(n, _)| n == node)
            .map(|&(_, start)| start)
    }

    /// Record `len` bytes laid out at the current position and move past them.
    pub fn advance(&mut self, len: usize) {
        self.pos += len;
        self.end = self.end.max(self.pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_uses_half_bytes_plus_sign() {
        assert_eq!(byte_length(DataKind::Packed, 5), 3);
        assert_eq!(byte_length(DataKind::Packed, 4), 3);
        assert_eq!(byte_length(DataKind::Packed, 1), 1);
        assert_eq!(byte_length(DataKind::Zoned, 5), 5);
        assert_eq!(byte_length(DataKind::Character, 7), 7);
    }

    #[test]
    fn offset_from_anchor() {
        let base = Base::Anchor {
            name: "hdr".into(),
            start: 100,
        };
        assert_eq!(explicit_target("f", 10, &base, Some(200), 200), Ok(110));
    }

    #[test]
    fn offset_beyond_input_names_anchor_and_base() {
        let base = Base::Anchor {
            name: "hdr".into(),
            start: 100,
        };
        assert_eq!(
            explicit_target("f", 10, &base, Some(105), 105),
            Err(DataError::BadTotalOffset {
                field: "f".into(),
                offset: 10,
                anchor: "hdr".into(),
                base: 100,
                buffer_len: 105,
            })
        );
    }

    #[test]
    fn parent_relative_error_reports_absolute_target() {
        let err = explicit_target("f", -5, &Base::Parent(2), None, 0).unwrap_err();
        assert_eq!(
            err,
            DataError::BadOffset {
                field: "f".into(),
                offset: -3,
                buffer_len: 0,
            }
        );
        // serialization pads forward without limit
        assert_eq!(explicit_target("f", 50, &Base::Parent(2), None, 0), Ok(52));
    }

    #[test]
    fn cursor_tracks_nested_starts() {
        let mut c = Cursor::new();
        c.advance(4);
        c.enter(NodeId(1));
        c.advance(2);
        c.enter(NodeId(2));
        assert_eq!(c.parent_start(), 6);
        assert_eq!(c.start_of(NodeId(1)), Some(4));
        c.leave();
        c.leave();
        assert_eq!(c.parent_start(), 0);
        assert_eq!(c.end, 6);
    }
}
