//! Test utilities and mock codecs for reclay development.
//!
//! Provides [`MockCodecFactory`], a deterministic implementation of
//! [`CodecFactory`] covering every data kind, and the [`fixtures`] module
//! for building schemas from tag scripts.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

use reclay_core::{Codec, CodecError, CodecFactory, CodecSignature, DataKind, TextOrdering, Value};

pub use fixtures::{load_script, TagScript};

/// Encoding under which the mock character codec writes two bytes per
/// character.
pub const WIDE_ENCODING: u32 = 1200;

/// Factory for the mock codecs.
///
/// Character data is ASCII padded with spaces (UTF-16BE under
/// [`WIDE_ENCODING`]); integers and floats are big-endian; packed decimals
/// end in a `C`/`D` sign nibble; zoned decimals carry the sign in the zone
/// of the last byte. Visual right-to-left ordering reverses text.
#[derive(Default)]
pub struct MockCodecFactory {
    created: AtomicUsize,
}

impl MockCodecFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of codec instances created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl CodecFactory for MockCodecFactory {
    fn create(&self, signature: &CodecSignature) -> Result<Box<dyn Codec>, CodecError> {
        if signature.kind == DataKind::Struct {
            return Err(CodecError::new("struct fields have no codec"));
        }
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MockCodec {
            sig: *signature,
        }))
    }
}

/// One mock codec instance.
#[derive(Debug)]
pub struct MockCodec {
    sig: CodecSignature,
}

impl MockCodec {
    fn byte_length(&self) -> usize {
        match self.sig.kind {
            DataKind::Packed => self.sig.length as usize / 2 + 1,
            _ => self.sig.length as usize,
        }
    }

    fn check_len(&self, bytes: &[u8]) -> Result<(), CodecError> {
        if bytes.len() == self.byte_length() {
            Ok(())
        } else {
            Err(CodecError::new(format!(
                "expected {} bytes, got {}",
                self.byte_length(),
                bytes.len()
            )))
        }
    }

    fn wide(&self) -> bool {
        self.sig.kind == DataKind::Character && self.sig.encoding == WIDE_ENCODING
    }

    fn encode_text(&self, text: &str, ordering: TextOrdering) -> Result<Vec<u8>, CodecError> {
        let chars: Vec<char> = if ordering == TextOrdering::VisualRtl {
            text.chars().rev().collect()
        } else {
            text.chars().collect()
        };
        let mut out = Vec::with_capacity(self.byte_length());
        for c in chars {
            if self.wide() {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            } else if c.is_ascii() {
                out.push(c as u8);
            } else {
                return Err(CodecError::new(format!("'{c}' is not ASCII")));
            }
        }
        if out.len() > self.byte_length() {
            return Err(CodecError::new(format!(
                "text needs {} bytes, field has {}",
                out.len(),
                self.byte_length()
            )));
        }
        while out.len() < self.byte_length() {
            if self.wide() {
                out.extend_from_slice(&[0, b' ']);
            } else {
                out.push(b' ');
            }
        }
        Ok(out)
    }

    fn decode_text(&self, bytes: &[u8], ordering: TextOrdering) -> Result<Value, CodecError> {
        let text = if self.wide() {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).map_err(|e| CodecError::new(e.to_string()))?
        } else {
            bytes.iter().map(|&b| char::from(b)).collect()
        };
        Ok(Value::Text(if ordering == TextOrdering::VisualRtl {
            text.chars().rev().collect()
        } else {
            text
        }))
    }

    fn encode_binary(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let n = match value {
            Value::Short(v) => i64::from(*v),
            Value::Int(v) => i64::from(*v),
            Value::Long(v) => *v,
            other => return Err(unexpected(other)),
        };
        let out = match self.sig.length {
            2 if self.sig.precision == 16 => u16::try_from(n).map(|v| v.to_be_bytes().to_vec()),
            2 => i16::try_from(n).map(|v| v.to_be_bytes().to_vec()),
            4 if self.sig.precision == 32 => u32::try_from(n).map(|v| v.to_be_bytes().to_vec()),
            4 => i32::try_from(n).map(|v| v.to_be_bytes().to_vec()),
            _ => Ok(n.to_be_bytes().to_vec()),
        };
        out.map_err(|_| CodecError::new(format!("{n} out of range")))
    }

    fn decode_binary(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        Ok(match (bytes, self.sig.precision) {
            (&[a, b], 16) => Value::Int(i32::from(u16::from_be_bytes([a, b]))),
            (&[a, b], _) => Value::Short(i16::from_be_bytes([a, b])),
            (&[a, b, c, d], 32) => Value::Long(i64::from(u32::from_be_bytes([a, b, c, d]))),
            (&[a, b, c, d], _) => Value::Int(i32::from_be_bytes([a, b, c, d])),
            _ => Value::Long(i64::from_be_bytes(eight(bytes)?)),
        })
    }

    /// Sign and right-aligned digits of a decimal at the field's scale.
    fn digits(&self, value: &Value) -> Result<(bool, Vec<u8>), CodecError> {
        let Value::Decimal(d) = value else {
            return Err(unexpected(value));
        };
        let (unscaled, _) = d.with_scale(i64::from(self.sig.precision)).as_bigint_and_exponent();
        let negative = unscaled.sign() == Sign::Minus;
        let text = unscaled.magnitude().to_string();
        let width = self.sig.length as usize;
        if text.len() > width {
            return Err(CodecError::new(format!("{d} needs more than {width} digits")));
        }
        let mut digits = vec![0u8; width - text.len()];
        digits.extend(text.bytes().map(|b| b - b'0'));
        Ok((negative, digits))
    }

    fn decimal(&self, negative: bool, digits: &[u8]) -> Result<Value, CodecError> {
        let text: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
        let mut unscaled =
            BigInt::from_str(&text).map_err(|e| CodecError::new(e.to_string()))?;
        if negative {
            unscaled = -unscaled;
        }
        Ok(Value::Decimal(BigDecimal::new(
            unscaled,
            i64::from(self.sig.precision),
        )))
    }

    fn encode_packed(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let (negative, digits) = self.digits(value)?;
        let mut nibbles = vec![0u8; self.byte_length() * 2 - 1 - digits.len()];
        nibbles.extend(digits);
        nibbles.push(if negative { 0xD } else { 0xC });
        Ok(nibbles.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
    }

    fn decode_packed(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let nibbles: Vec<u8> = bytes.iter().flat_map(|&b| [b >> 4, b & 0xF]).collect();
        let (sign, digits) = nibbles
            .split_last()
            .ok_or_else(|| CodecError::new("empty packed field"))?;
        if let Some(bad) = digits.iter().find(|&&d| d > 9) {
            return Err(CodecError::new(format!("invalid packed digit {bad:#x}")));
        }
        self.decimal(matches!(sign, 0xB | 0xD), digits)
    }

    fn encode_zoned(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let (negative, digits) = self.digits(value)?;
        let mut out: Vec<u8> = digits.iter().map(|d| 0xF0 | d).collect();
        if let (true, Some(last)) = (negative, out.last_mut()) {
            *last = 0xD0 | (*last & 0xF);
        }
        Ok(out)
    }

    fn decode_zoned(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let digits: Vec<u8> = bytes.iter().map(|b| b & 0xF).collect();
        if let Some(bad) = digits.iter().find(|&&d| d > 9) {
            return Err(CodecError::new(format!("invalid zoned digit {bad:#x}")));
        }
        let negative = bytes.last().is_some_and(|b| b >> 4 == 0xD);
        self.decimal(negative, &digits)
    }
}

impl Codec for MockCodec {
    fn encode(&mut self, value: &Value, ordering: TextOrdering) -> Result<Vec<u8>, CodecError> {
        let out = match self.sig.kind {
            DataKind::Character | DataKind::Date | DataKind::Time | DataKind::Timestamp => {
                let text = value.as_text().ok_or_else(|| unexpected(value))?;
                self.encode_text(text, ordering)?
            }
            DataKind::Binary => self.encode_binary(value)?,
            DataKind::Float => match (value, self.sig.length) {
                (Value::Float(v), 4) => v.to_be_bytes().to_vec(),
                (Value::Double(v), 8) => v.to_be_bytes().to_vec(),
                (other, _) => return Err(unexpected(other)),
            },
            DataKind::Packed => self.encode_packed(value)?,
            DataKind::Zoned => self.encode_zoned(value)?,
            DataKind::Bytes => value.as_bytes().ok_or_else(|| unexpected(value))?.to_vec(),
            DataKind::Struct => return Err(unexpected(value)),
        };
        self.check_len(&out)?;
        Ok(out)
    }

    fn decode(&mut self, bytes: &[u8], ordering: TextOrdering) -> Result<Value, CodecError> {
        self.check_len(bytes)?;
        match self.sig.kind {
            DataKind::Character | DataKind::Date | DataKind::Time | DataKind::Timestamp => {
                self.decode_text(bytes, ordering)
            }
            DataKind::Binary => self.decode_binary(bytes),
            DataKind::Float => Ok(match *bytes {
                [a, b, c, d] => Value::Float(f32::from_be_bytes([a, b, c, d])),
                _ => Value::Double(f64::from_be_bytes(eight(bytes)?)),
            }),
            DataKind::Packed => self.decode_packed(bytes),
            DataKind::Zoned => self.decode_zoned(bytes),
            DataKind::Bytes => Ok(Value::Bytes(bytes.to_vec())),
            DataKind::Struct => Err(CodecError::new("struct fields have no codec")),
        }
    }
}

fn eight(bytes: &[u8]) -> Result<[u8; 8], CodecError> {
    bytes
        .try_into()
        .map_err(|_| CodecError::new(format!("expected 8 bytes, got {}", bytes.len())))
}

fn unexpected(value: &Value) -> CodecError {
    CodecError::new(format!("unexpected {} value", value.type_name()))
}
