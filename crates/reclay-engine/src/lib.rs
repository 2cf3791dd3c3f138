//! Marshalling engine for reclay records.
//!
//! A [`Record`] holds the values of one top-level struct of a loaded
//! [`Document`](reclay_schema::Document) and moves them to and from a flat
//! byte buffer. Scalar encoding is delegated to codecs obtained through a
//! [`CodecRegistry`]; coercion of assigned values, per-position caches with
//! freshness tracking, and lazily redimensioned array storage live here.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod cache;
pub mod codec;
pub mod coerce;
pub mod config;
pub mod layout;
pub mod record;

pub use array::{ArrayStore, Entry};
pub use cache::{CacheState, ValueCache};
pub use codec::{CodecRegistry, SharedCodec};
pub use coerce::{coerce, Shape};
pub use config::{ConfigError, EngineConfig};
pub use layout::{byte_length, Geometry};
pub use record::Record;
