//! Schema tree, attribute parsing, name resolution and struct expansion.
//!
//! A schema is loaded once from a stream of [`TagEvent`]s (or XML markup via
//! [`xml::load_xml`]) into an immutable [`Document`]: an arena of nodes
//! addressed by [`NodeId`](reclay_core::NodeId), with a document-owned table
//! of qualified names. Loading runs build, expand and link phases and
//! reports every specification defect at once.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attr;
pub mod document;
pub mod expand;
pub mod ingest;
pub mod link;
pub mod node;
pub mod resolve;
pub mod xml;

pub use attr::{DataAttrs, IntAttr, OffsetFrom, StructAttrs};
pub use document::Document;
pub use ingest::{load, LoadOptions, TagEvent};
pub use node::{Links, NodeBody, SchemaNode};
pub use resolve::{resolve_integer, resolve_relative_node, value_as_integer, ValueLookup};
pub use xml::{load_xml, read_tags};
