//! Conversion of assigned native values to the shape a field's codec expects.
//!
//! | kind | length / precision | accepted | stored as |
//! |---|---|---|---|
//! | char, date, time, timestamp | any | anything | text |
//! | int | 2 / 15 | text, number | `Short` |
//! | int | 2 / 16 | text, number | `Int` in `0..=65535` |
//! | int | 4 / 31 | text, number | `Int` |
//! | int | 4 / 32 | text, number | `Long` in `0..=4294967295` |
//! | int | 8 | text, number | `Long` |
//! | packed, zoned | digits / scale | decimal, text, number | `Decimal`, half-even |
//! | float | 4 / 8 | text, number | `Float` / `Double` |
//! | byte | length | byte list, text tokens, number | `Bytes` of the length |

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::ToPrimitive;

use reclay_core::{DataError, DataKind, Value};

/// What a field's codec needs to know about the native shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    /// Wire type.
    pub kind: DataKind,
    /// Resolved length (characters, bytes or digits).
    pub length: u32,
    /// Effective precision.
    pub precision: u32,
}

/// Convert `value` to the shape of a field, or explain why it cannot be.
pub fn coerce(field: &str, shape: Shape, value: Value) -> Result<Value, DataError> {
    match shape.kind {
        DataKind::Character | DataKind::Date | DataKind::Time | DataKind::Timestamp => {
            Ok(match value {
                Value::Text(_) => value,
                other => Value::Text(other.to_string()),
            })
        }
        DataKind::Binary => coerce_binary(field, shape, value),
        DataKind::Packed | DataKind::Zoned => coerce_decimal(field, shape, value),
        DataKind::Float => coerce_float(field, shape, value),
        DataKind::Bytes => coerce_bytes(field, shape, value),
        DataKind::Struct => Err(DataError::StructValueAccess {
            field: field.to_string(),
        }),
    }
}

fn expected(field: &str, value: &Value) -> DataError {
    DataError::StringOrNumberExpected {
        field: field.to_string(),
        found: value.type_name(),
    }
}

fn invalid(field: &str, value: &Value, expected: &'static str) -> DataError {
    DataError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    }
}

/// Exact integer view of a text or numeric value.
fn integral(field: &str, value: &Value) -> Result<i128, DataError> {
    let decimal = match value {
        Value::Short(v) => return Ok(i128::from(*v)),
        Value::Int(v) => return Ok(i128::from(*v)),
        Value::Long(v) => return Ok(i128::from(*v)),
        Value::Text(s) => BigDecimal::from_str(s.trim())
            .map_err(|_| invalid(field, value, "an integer"))?,
        Value::Float(v) => float_decimal(f64::from(*v))
            .ok_or_else(|| invalid(field, value, "a finite number"))?,
        Value::Double(v) => {
            float_decimal(*v).ok_or_else(|| invalid(field, value, "a finite number"))?
        }
        Value::Decimal(d) => d.clone(),
        Value::Bytes(_) => return Err(expected(field, value)),
    };
    if !decimal.is_integer() {
        return Err(invalid(field, value, "an integer"));
    }
    decimal
        .to_i128()
        .ok_or_else(|| invalid(field, value, "an integer in range"))
}

fn float_decimal(v: f64) -> Option<BigDecimal> {
    if v.is_finite() {
        BigDecimal::from_str(&v.to_string()).ok()
    } else {
        None
    }
}

fn coerce_binary(field: &str, shape: Shape, value: Value) -> Result<Value, DataError> {
    let native = matches!(
        (shape.length, shape.precision, &value),
        (2, 15, Value::Short(_)) | (4, 31, Value::Int(_)) | (8, _, Value::Long(_))
    );
    if native {
        return Ok(value);
    }
    let n = integral(field, &value)?;
    let out = match (shape.length, shape.precision) {
        (2, 16) => u16::try_from(n).ok().map(|v| Value::Int(i32::from(v))),
        (2, _) => i16::try_from(n).ok().map(Value::Short),
        (4, 32) => u32::try_from(n).ok().map(|v| Value::Long(i64::from(v))),
        (4, _) => i32::try_from(n).ok().map(Value::Int),
        _ => i64::try_from(n).ok().map(Value::Long),
    };
    out.ok_or_else(|| invalid(field, &value, "an integer in range"))
}

fn coerce_decimal(field: &str, shape: Shape, value: Value) -> Result<Value, DataError> {
    let decimal = match &value {
        Value::Decimal(d) => d.clone(),
        Value::Short(v) => BigDecimal::from(*v),
        Value::Int(v) => BigDecimal::from(*v),
        Value::Long(v) => BigDecimal::from(*v),
        Value::Float(v) => float_decimal(f64::from(*v))
            .ok_or_else(|| invalid(field, &value, "a finite number"))?,
        Value::Double(v) => {
            float_decimal(*v).ok_or_else(|| invalid(field, &value, "a finite number"))?
        }
        Value::Text(s) => {
            BigDecimal::from_str(s.trim()).map_err(|_| invalid(field, &value, "a decimal"))?
        }
        Value::Bytes(_) => return Err(expected(field, &value)),
    };
    let scaled = decimal.with_scale_round(i64::from(shape.precision), RoundingMode::HalfEven);
    let (unscaled, _) = scaled.as_bigint_and_exponent();
    let digits = if unscaled.magnitude().to_u8() == Some(0) {
        0
    } else {
        unscaled.magnitude().to_string().len()
    };
    if digits > shape.length as usize {
        return Err(invalid(field, &value, "a decimal that fits the declared digits"));
    }
    Ok(Value::Decimal(scaled))
}

fn coerce_float(field: &str, shape: Shape, value: Value) -> Result<Value, DataError> {
    let v = match &value {
        Value::Float(v) if shape.length == 4 => return Ok(Value::Float(*v)),
        Value::Double(v) if shape.length != 4 => return Ok(Value::Double(*v)),
        Value::Float(v) => f64::from(*v),
        Value::Double(v) => *v,
        Value::Short(v) => f64::from(*v),
        Value::Int(v) => f64::from(*v),
        Value::Long(v) => *v as f64,
        Value::Decimal(d) => d
            .to_f64()
            .ok_or_else(|| invalid(field, &value, "a number"))?,
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(field, &value, "a number"))?,
        Value::Bytes(_) => return Err(expected(field, &value)),
    };
    Ok(if shape.length == 4 {
        Value::Float(v as f32)
    } else {
        Value::Double(v)
    })
}

fn coerce_bytes(field: &str, shape: Shape, value: Value) -> Result<Value, DataError> {
    let list: Vec<u8> = match &value {
        Value::Bytes(b) => b.clone(),
        Value::Text(s) => s
            .split([' ', ','])
            .filter(|t| !t.is_empty())
            .map(|t| byte_token(t).ok_or_else(|| invalid(field, &value, "byte values")))
            .collect::<Result<_, _>>()?,
        Value::Short(_) | Value::Int(_) | Value::Long(_) | Value::Decimal(_) => {
            let n = integral(field, &value)?;
            vec![byte_from(n).ok_or_else(|| invalid(field, &value, "a byte value"))?]
        }
        Value::Float(_) | Value::Double(_) => return Err(expected(field, &value)),
    };
    let length = shape.length as usize;
    if list.len() > length {
        return Err(invalid(field, &value, "no more bytes than the field length"));
    }
    Ok(Value::Bytes(fill_repeating(list, length)))
}

fn byte_token(token: &str) -> Option<u8> {
    byte_from(token.trim().parse::<i128>().ok()?)
}

/// Unsigned or two's complement signed byte.
fn byte_from(n: i128) -> Option<u8> {
    match n {
        0..=255 => Some(n as u8),
        -128..=-1 => Some((n as i8) as u8),
        _ => None,
    }
}

/// Extend `list` to `length` by repeating its last element (zero if empty).
fn fill_repeating(mut list: Vec<u8>, length: usize) -> Vec<u8> {
    let pad = list.last().copied().unwrap_or(0);
    list.resize(length, pad);
    list
}
