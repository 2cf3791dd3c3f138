//! Core types and traits for the reclay record-layout engine.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! vocabulary shared by the schema and engine crates: node handles, the
//! correlation clock, array dimensions, field kinds, native values, the
//! error taxonomy, and the codec traits through which scalar encoding is
//! delegated.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod dims;
pub mod error;
pub mod id;
pub mod kind;
pub mod traits;
pub mod value;

pub use clock::Tick;
pub use dims::Dimensions;
pub use error::{
    DataError, InternalError, LoadError, ParseError, ParseErrors, SpecificationError,
};
pub use id::NodeId;
pub use kind::{CharType, DataKind, NodeKind, TextOrdering, TrimPolicy, Usage};
pub use traits::{Codec, CodecError, CodecFactory, CodecSignature};
pub use value::Value;
