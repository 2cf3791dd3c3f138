//! Reclay: schema-driven binary record layout.
//!
//! A layout schema declares named, typed, possibly repeated fields; reclay
//! loads it once and then marshals records of native values to and from
//! flat byte buffers. Lengths, repetition counts and offsets may refer to
//! other fields and are re-resolved on every access.
//!
//! This is the facade crate that re-exports the public API of the reclay
//! sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use reclay::prelude::*;
//! use reclay_test_utils::MockCodecFactory;
//!
//! let schema = r#"<layout>
//!   <struct name="msg">
//!     <data name="len" type="int" length="2"/>
//!     <data name="text" type="char" length="len"/>
//!   </struct>
//! </layout>"#;
//! let doc = Arc::new(load_xml(schema, &LoadOptions::default()).unwrap());
//! let codecs = Arc::new(CodecRegistry::new(
//!     Arc::new(MockCodecFactory::new()),
//!     EngineConfig::DEFAULT_ENCODING,
//! ));
//!
//! let mut rec = Record::new(doc, "msg", codecs, EngineConfig::default()).unwrap();
//! let top = Dimensions::new();
//! rec.set_value("len", &top, Value::Short(5)).unwrap();
//! rec.set_value("text", &top, "hello".into()).unwrap();
//! assert_eq!(rec.serialize().unwrap(), b"\0\x05hello");
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `reclay-core` | Node handles, dimensions, kinds, values, errors, codec traits |
//! | [`schema`] | `reclay-schema` | Schema tree, loaders, expansion and reference resolution |
//! | [`engine`] | `reclay-engine` | Records, value caches, array stores, codec registry |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits and errors (`reclay-core`).
///
/// Implement [`types::CodecFactory`] and [`types::Codec`] to plug in the
/// scalar encodings of a target system.
pub use reclay_core as types;

/// Schema loading and the node tree (`reclay-schema`).
///
/// [`schema::load_xml`] reads layout markup; [`schema::load`] accepts an
/// already tokenized [`schema::TagEvent`] stream.
pub use reclay_schema as schema;

/// Marshalling engine (`reclay-engine`).
pub use reclay_engine as engine;

/// Common imports for typical reclay usage.
pub mod prelude {
    // Core
    pub use reclay_core::{
        Codec, CodecError, CodecFactory, CodecSignature, DataKind, Dimensions, TextOrdering,
        Usage, Value,
    };

    // Errors
    pub use reclay_core::{DataError, LoadError, ParseError, SpecificationError};

    // Schema
    pub use reclay_schema::{load, load_xml, Document, LoadOptions, TagEvent};

    // Engine
    pub use reclay_engine::{CacheState, CodecRegistry, EngineConfig, Record};
}
