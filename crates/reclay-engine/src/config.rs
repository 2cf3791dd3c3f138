//! Engine configuration, validation, and error types.

use std::error::Error;
use std::fmt;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`EngineConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_field_length` is zero.
    FieldLengthZero,
    /// `max_record_length` is smaller than `max_field_length`.
    RecordSmallerThanField {
        /// Configured record maximum.
        record: usize,
        /// Configured field maximum.
        field: usize,
    },
    /// `max_count` is zero.
    CountZero,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldLengthZero => write!(f, "max_field_length must be at least 1"),
            Self::RecordSmallerThanField { record, field } => write!(
                f,
                "max_record_length {record} is below max_field_length {field}"
            ),
            Self::CountZero => write!(f, "max_count must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

// ── EngineConfig ───────────────────────────────────────────────────

/// Limits and defaults applied while marshalling.
///
/// Shared by every record created with it; immutable once a record exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest byte length a single scalar may resolve to.
    /// Default: 16_776_704.
    pub max_field_length: usize,
    /// Largest serialized record. Default: 64 MiB.
    pub max_record_length: usize,
    /// Largest resolved repetition count. Default: 16_777_216.
    pub max_count: u32,
    /// Character encoding used where a field declares none. Default: 37.
    pub default_encoding: u32,
}

impl EngineConfig {
    /// Default per-field byte limit.
    pub const DEFAULT_MAX_FIELD_LENGTH: usize = 16_776_704;

    /// Default record byte limit.
    pub const DEFAULT_MAX_RECORD_LENGTH: usize = 64 * 1024 * 1024;

    /// Default repetition limit.
    pub const DEFAULT_MAX_COUNT: u32 = 16_777_216;

    /// Default character encoding.
    pub const DEFAULT_ENCODING: u32 = 37;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_field_length == 0 {
            return Err(ConfigError::FieldLengthZero);
        }
        if self.max_record_length < self.max_field_length {
            return Err(ConfigError::RecordSmallerThanField {
                record: self.max_record_length,
                field: self.max_field_length,
            });
        }
        if self.max_count == 0 {
            return Err(ConfigError::CountZero);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_field_length: Self::DEFAULT_MAX_FIELD_LENGTH,
            max_record_length: Self::DEFAULT_MAX_RECORD_LENGTH,
            max_count: Self::DEFAULT_MAX_COUNT,
            default_encoding: Self::DEFAULT_ENCODING,
        }
    }
}
