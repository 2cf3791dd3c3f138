//! Node kinds, data kinds and the small attribute enumerations.

use std::fmt;

/// Classification of a schema node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// A named group of fields, usable as a record root or as a template.
    Struct,
    /// A field: a scalar, or a struct-typed leaf expanded into a container.
    Data,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Struct => write!(f, "struct"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// Wire type of a data node, as declared by its `type` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Encoded text (`char`).
    Character,
    /// Two's complement binary integer (`int`).
    Binary,
    /// Packed decimal: two digits per byte plus a sign nibble (`packed`).
    Packed,
    /// Zoned decimal: one digit per byte (`zoned`).
    Zoned,
    /// IEEE floating point (`float`).
    Float,
    /// Uninterpreted bytes (`byte`).
    Bytes,
    /// A reference to a struct whose fields are expanded in place (`struct`).
    Struct,
    /// Calendar date (`date`).
    Date,
    /// Time of day (`time`).
    Time,
    /// Date and time of day (`timestamp`).
    Timestamp,
}

impl DataKind {
    /// Parse the `type` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "char" => Some(Self::Character),
            "int" => Some(Self::Binary),
            "packed" => Some(Self::Packed),
            "zoned" => Some(Self::Zoned),
            "float" => Some(Self::Float),
            "byte" => Some(Self::Bytes),
            "struct" => Some(Self::Struct),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "timestamp" => Some(Self::Timestamp),
            _ => None,
        }
    }

    /// The attribute spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Character => "char",
            Self::Binary => "int",
            Self::Packed => "packed",
            Self::Zoned => "zoned",
            Self::Float => "float",
            Self::Bytes => "byte",
            Self::Struct => "struct",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
        }
    }

    /// Whether a `length` attribute must be declared.
    pub fn requires_length(self) -> bool {
        matches!(
            self,
            Self::Character | Self::Binary | Self::Packed | Self::Zoned | Self::Float | Self::Bytes
        )
    }

    /// Length used when none is declared (date and time kinds only).
    pub fn default_length(self) -> Option<i64> {
        match self {
            Self::Date => Some(10),
            Self::Time => Some(8),
            Self::Timestamp => Some(26),
            _ => None,
        }
    }

    /// Whether a `precision` attribute is meaningful.
    pub fn allows_precision(self) -> bool {
        matches!(self, Self::Binary | Self::Packed | Self::Zoned)
    }

    /// Text-valued kinds: character plus the date and time kinds.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Character | Self::Date | Self::Time | Self::Timestamp
        )
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction in which a node's value flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Usage {
    /// Sent to the remote system only.
    Input,
    /// Returned by the remote system only.
    Output,
    /// Both directions.
    InputOutput,
    /// Take the parent's effective usage.
    Inherit,
}

impl Usage {
    /// Parse the `usage` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            "inputoutput" => Some(Self::InputOutput),
            "inherit" => Some(Self::Inherit),
            _ => None,
        }
    }

    /// Whether values of this usage are written by serialization.
    pub fn is_input(self) -> bool {
        matches!(self, Self::Input | Self::InputOutput)
    }

    /// Whether values of this usage are stored by parsing.
    pub fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::InputOutput)
    }
}

/// Whitespace and NUL stripping applied to decoded text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrimPolicy {
    /// Keep decoded text unchanged.
    #[default]
    None,
    /// Strip leading padding.
    Left,
    /// Strip trailing padding.
    Right,
    /// Strip padding on both ends.
    Both,
}

impl TrimPolicy {
    /// Parse the `trim` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    /// Apply the policy. Padding is whitespace and NUL.
    pub fn apply(self, text: &str) -> String {
        let pad = |c: char| c.is_whitespace() || c == '\0';
        match self {
            Self::None => text.to_string(),
            Self::Left => text.trim_start_matches(pad).to_string(),
            Self::Right => text.trim_end_matches(pad).to_string(),
            Self::Both => text.trim_matches(pad).to_string(),
        }
    }
}

/// Width class of a character field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CharType {
    /// One byte per declared character.
    #[default]
    OneByte,
    /// Two bytes per declared character; the byte length is doubled.
    TwoByte,
}

impl CharType {
    /// Parse the `chartype` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "onebyte" => Some(Self::OneByte),
            "twobyte" => Some(Self::TwoByte),
            _ => None,
        }
    }
}

/// Direction and ordering of bidirectional text handed to character codecs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextOrdering {
    /// Whatever the codec treats as its native ordering.
    #[default]
    Default,
    /// Logical order, left-to-right base direction.
    LogicalLtr,
    /// Logical order, right-to-left base direction.
    LogicalRtl,
    /// Visual order, left-to-right.
    VisualLtr,
    /// Visual order, right-to-left.
    VisualRtl,
}

impl TextOrdering {
    /// Parse the `bidistringtype` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "logical-ltr" => Some(Self::LogicalLtr),
            "logical-rtl" => Some(Self::LogicalRtl),
            "visual-ltr" => Some(Self::VisualLtr),
            "visual-rtl" => Some(Self::VisualRtl),
            _ => None,
        }
    }
}
