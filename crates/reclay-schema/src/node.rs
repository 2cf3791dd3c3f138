//! Schema nodes as stored in a document's arena.

use reclay_core::{DataKind, NodeId, NodeKind, Usage};

use crate::attr::{DataAttrs, IntAttr, OffsetFrom, StructAttrs};

/// Kind-specific part of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeBody {
    /// The document root.
    Document,
    /// A struct.
    Struct(StructAttrs),
    /// A data field.
    Data(DataAttrs),
}

/// Cross-links from reference attributes to the nodes they name.
///
/// Filled by the link pass after struct expansion, once the tree's shape is
/// final. A `None` next to a declared reference means it did not resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Links {
    /// Target of a `count` reference.
    pub count: Option<NodeId>,
    /// Target of a `length` reference.
    pub length: Option<NodeId>,
    /// Target of an `offset` reference.
    pub offset: Option<NodeId>,
    /// Ancestor named by `offsetfrom`.
    pub anchor: Option<NodeId>,
    /// Struct a struct-typed field was expanded from.
    pub structure: Option<NodeId>,
}

/// One node of the schema tree.
#[derive(Clone, Debug)]
pub struct SchemaNode {
    pub(crate) name: String,
    pub(crate) usage: Usage,
    pub(crate) body: NodeBody,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) qualified: String,
    pub(crate) links: Links,
    pub(crate) expansion_failed: bool,
}

impl SchemaNode {
    /// A detached node. It gets its parent and qualified name when added.
    pub fn new(name: impl Into<String>, usage: Usage, body: NodeBody) -> Self {
        Self {
            name: name.into(),
            usage,
            body,
            parent: None,
            children: Vec::new(),
            qualified: String::new(),
            links: Links::default(),
            expansion_failed: false,
        }
    }

    /// A detached copy without topology or links.
    pub(crate) fn detached_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            usage: self.usage,
            body: self.body.clone(),
            parent: None,
            children: Vec::new(),
            qualified: String::new(),
            links: Links::default(),
            expansion_failed: self.expansion_failed,
        }
    }

    /// Declared name; may be empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Document => NodeKind::Document,
            NodeBody::Struct(_) => NodeKind::Struct,
            NodeBody::Data(_) => NodeKind::Data,
        }
    }

    /// Declared usage (before inheritance).
    pub fn declared_usage(&self) -> Usage {
        self.usage
    }

    /// Kind-specific attributes.
    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    /// Data attributes, for data nodes.
    pub fn data(&self) -> Option<&DataAttrs> {
        match &self.body {
            NodeBody::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Data kind, for data nodes.
    pub fn data_kind(&self) -> Option<DataKind> {
        self.data().map(|d| d.kind)
    }

    /// Parent handle; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Resolved reference targets.
    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Declared repetition count.
    pub fn count(&self) -> &IntAttr {
        static UNSET: IntAttr = IntAttr::Unset;
        match &self.body {
            NodeBody::Struct(s) => &s.count,
            NodeBody::Data(d) => &d.count,
            NodeBody::Document => &UNSET,
        }
    }

    /// Declared explicit offset.
    pub fn offset(&self) -> &IntAttr {
        static UNSET: IntAttr = IntAttr::Unset;
        match &self.body {
            NodeBody::Struct(s) => &s.offset,
            NodeBody::Data(d) => &d.offset,
            NodeBody::Document => &UNSET,
        }
    }

    /// Declared offset base.
    pub fn offsetfrom(&self) -> &OffsetFrom {
        static PARENT: OffsetFrom = OffsetFrom::Parent;
        match &self.body {
            NodeBody::Struct(s) => &s.offsetfrom,
            NodeBody::Data(d) => &d.offsetfrom,
            NodeBody::Document => &PARENT,
        }
    }

    /// Whether the node repeats.
    pub fn is_array(&self) -> bool {
        self.count().is_set()
    }

    /// Whether the node groups children: a struct, or an expanded
    /// struct-typed field.
    pub fn is_container(&self) -> bool {
        match &self.body {
            NodeBody::Struct(_) => true,
            NodeBody::Data(d) => d.kind == DataKind::Struct,
            NodeBody::Document => false,
        }
    }
}
