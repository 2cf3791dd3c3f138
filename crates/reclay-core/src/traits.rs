//! The codec seam: scalar encoding is delegated to implementations of
//! [`Codec`] created by a [`CodecFactory`].

use std::fmt;

use crate::kind::{DataKind, TextOrdering};
use crate::value::Value;

/// Everything a codec needs to know about the scalar it converts.
///
/// Two fields with equal signatures can share one codec instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodecSignature {
    /// Wire type.
    pub kind: DataKind,
    /// Resolved length: characters (already doubled for two-byte text),
    /// integer bytes, or decimal digits, depending on `kind`.
    pub length: u32,
    /// Decimal places for packed and zoned; significant bits for integers.
    pub precision: u32,
    /// Character encoding identifier.
    pub encoding: u32,
}

/// Error reported by a codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecError {
    /// Human-readable description.
    pub detail: String,
}

impl CodecError {
    /// Create a codec error.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for CodecError {}

/// Exact byte conversion for one [`CodecSignature`].
///
/// Calls into one instance are serialized by the engine, so implementations
/// may keep scratch state in `&mut self`.
pub trait Codec: Send {
    /// Encode a native value into exactly the signature's byte length.
    fn encode(&mut self, value: &Value, ordering: TextOrdering) -> Result<Vec<u8>, CodecError>;

    /// Decode a byte sequence of the signature's byte length.
    fn decode(&mut self, bytes: &[u8], ordering: TextOrdering) -> Result<Value, CodecError>;
}

/// Creates codecs on demand.
pub trait CodecFactory: Send + Sync {
    /// Create a codec for `signature`, or explain why none exists.
    fn create(&self, signature: &CodecSignature) -> Result<Box<dyn Codec>, CodecError>;
}
