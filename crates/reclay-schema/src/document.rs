//! The schema document: an arena of nodes plus the qualified-name table.
//!
//! Nodes are addressed by [`NodeId`] handles into a `Vec`, with parent and
//! child links stored as handles. The name table maps every non-empty
//! qualified name to its node and belongs to the document, so cloned
//! subtrees register into the table of the document they are cloned into.

use indexmap::IndexMap;
use tracing::{debug, warn};

use reclay_core::{NodeId, SpecificationError, Usage};

use crate::node::{NodeBody, SchemaNode};

/// A loaded schema.
///
/// Built once by the loader; after loading it is immutable and can be shared
/// between records via `Arc`.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<SchemaNode>,
    names: IndexMap<String, NodeId>,
    errors: Vec<SpecificationError>,
}

impl Document {
    /// A document holding only its root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = SchemaNode::new(root_name, Usage::Inherit, NodeBody::Document);
        Self {
            nodes: vec![root],
            names: IndexMap::new(),
            errors: Vec::new(),
        }
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// The node behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different document.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.index()]
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Parent of `id`; `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Proper ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Append `node` as the last child of `parent` and register its name.
    ///
    /// A qualified-name collision is recorded as a specification error; the
    /// node is still added and the first registration keeps the name.
    pub fn add_child(&mut self, parent: NodeId, mut node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.qualified = self.derive_qualified_name(parent, &node.name);
        let qualified = node.qualified.clone();
        let unnamed_scope = qualified.is_empty() && !node.name.is_empty();
        self.nodes.push(node);
        self.node_mut(parent).children.push(id);

        if unnamed_scope {
            debug!(
                node = %self.name_for_exception(id),
                "node under an unnamed ancestor has no qualified name"
            );
        }
        if !qualified.is_empty() {
            if self.names.contains_key(&qualified) {
                self.record_error(SpecificationError::DuplicateName { name: qualified });
            } else {
                self.names.insert(qualified, id);
            }
        }
        id
    }

    fn derive_qualified_name(&self, parent: NodeId, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        if parent == self.root() {
            return name.to_string();
        }
        let prefix = &self.node(parent).qualified;
        if prefix.is_empty() {
            // Some ancestor is unnamed: no unambiguous path exists.
            String::new()
        } else {
            format!("{prefix}.{name}")
        }
    }

    /// Dot-joined names from the root's child down to `id`.
    ///
    /// Empty when `id` or any ancestor below the root is unnamed. The root
    /// itself has an empty qualified name.
    pub fn qualified_name(&self, id: NodeId) -> &str {
        &self.node(id).qualified
    }

    /// Like [`qualified_name`](Self::qualified_name), but unnamed segments
    /// are shown as `[k]`, the node's 0-based position among its siblings.
    pub fn name_for_exception(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            let node = self.node(cur);
            if node.name.is_empty() {
                let k = self
                    .children(parent)
                    .iter()
                    .position(|&c| c == cur)
                    .unwrap_or(0);
                segments.push(format!("[{k}]"));
            } else {
                segments.push(node.name.clone());
            }
            cur = parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Usage after inheritance. The root's default is input-output.
    pub fn effective_usage(&self, id: NodeId) -> Usage {
        let mut cur = Some(id);
        while let Some(n) = cur {
            match self.node(n).declared_usage() {
                Usage::Inherit => cur = self.parent(n),
                declared => return declared,
            }
        }
        Usage::InputOutput
    }

    /// Node registered under a qualified name.
    pub fn lookup(&self, qualified: &str) -> Option<NodeId> {
        self.names.get(qualified).copied()
    }

    /// All registered qualified names, in registration order.
    pub fn qualified_names(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.names.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Deep-copy the children of `source` under `target`.
    ///
    /// Copies schema only; links are rebuilt by the link pass. Every copy
    /// registers its new qualified name in this document's table.
    pub fn clone_children_into(&mut self, source: NodeId, target: NodeId) -> Vec<NodeId> {
        let children = self.children(source).to_vec();
        children
            .into_iter()
            .map(|child| self.clone_subtree(child, target))
            .collect()
    }

    /// Deep-copy `source` and its descendants as the last child of `parent`.
    pub fn clone_subtree(&mut self, source: NodeId, parent: NodeId) -> NodeId {
        let copy = self.node(source).detached_copy();
        let id = self.add_child(parent, copy);
        let children = self.children(source).to_vec();
        for child in children {
            self.clone_subtree(child, id);
        }
        id
    }

    /// Nodes with a declared count on the path from the root's child down
    /// to `id` (inclusive), outermost first. Their number is the length of
    /// the index list that addresses `id`.
    pub fn array_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&n| self.node(n).is_array())
            .collect();
        path.reverse();
        path
    }

    /// Record a specification error for the current load.
    pub fn record_error(&mut self, error: SpecificationError) {
        warn!(key = error.key(), "{error}");
        self.errors.push(error);
    }

    /// Specification errors recorded so far.
    pub fn errors(&self) -> &[SpecificationError] {
        &self.errors
    }

    pub(crate) fn take_errors(&mut self) -> Vec<SpecificationError> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{DataAttrs, IntAttr, StructAttrs};
    use reclay_core::DataKind;

    fn structure(name: &str) -> SchemaNode {
        SchemaNode::new(name, Usage::Inherit, NodeBody::Struct(StructAttrs::default()))
    }

    fn field(name: &str) -> SchemaNode {
        let mut d = DataAttrs::new(DataKind::Character);
        d.length = IntAttr::Literal(4);
        SchemaNode::new(name, Usage::Inherit, NodeBody::Data(d))
    }

    #[test]
    fn qualified_names_join_ancestors() {
        let mut doc = Document::new("layout");
        let a = doc.add_child(doc.root(), structure("a"));
        let b = doc.add_child(a, structure("b"));
        let c = doc.add_child(b, field("c"));
        assert_eq!(doc.qualified_name(c), "a.b.c");
        assert_eq!(doc.lookup("a.b.c"), Some(c));
        assert_eq!(doc.qualified_name(doc.root()), "");
    }

    #[test]
    fn unnamed_ancestor_collapses_qualified_name() {
        let mut doc = Document::new("layout");
        let a = doc.add_child(doc.root(), structure("a"));
        doc.add_child(a, field("first"));
        let anon = doc.add_child(a, structure(""));
        let c = doc.add_child(anon, field("c"));
        assert_eq!(doc.qualified_name(anon), "");
        assert_eq!(doc.qualified_name(c), "");
        assert_eq!(doc.name_for_exception(c), "a.[1].c");
        assert!(doc.lookup("c").is_none());
    }

    #[test]
    fn duplicate_name_is_recorded_not_raised() {
        let mut doc = Document::new("layout");
        let a = doc.add_child(doc.root(), structure("a"));
        let first = doc.add_child(a, field("x"));
        doc.add_child(a, field("x"));
        assert_eq!(doc.lookup("a.x"), Some(first));
        assert_eq!(
            doc.errors(),
            &[SpecificationError::DuplicateName { name: "a.x".into() }]
        );
    }

    #[test]
    fn usage_inherits_from_nearest_declared_ancestor() {
        let mut doc = Document::new("layout");
        let a = doc.add_child(
            doc.root(),
            SchemaNode::new("a", Usage::Output, NodeBody::Struct(StructAttrs::default())),
        );
        let b = doc.add_child(a, structure("b"));
        let c = doc.add_child(b, field("c"));
        let top = doc.add_child(doc.root(), field("top"));
        assert_eq!(doc.effective_usage(c), Usage::Output);
        assert_eq!(doc.effective_usage(top), Usage::InputOutput);
    }

    #[test]
    fn cloned_subtree_registers_new_names() {
        let mut doc = Document::new("layout");
        let tmpl = doc.add_child(doc.root(), structure("hdr"));
        doc.add_child(tmpl, field("id"));
        let rec = doc.add_child(doc.root(), structure("rec"));
        let copies = doc.clone_children_into(tmpl, rec);
        assert_eq!(copies.len(), 1);
        assert_eq!(doc.lookup("rec.id"), Some(copies[0]));
        assert_eq!(doc.lookup("hdr.id").map(|n| n != copies[0]), Some(true));
        assert!(doc.errors().is_empty());
    }

    #[test]
    fn array_path_lists_repeated_nodes_outermost_first() {
        let mut doc = Document::new("layout");
        let mut outer = StructAttrs::default();
        outer.count = IntAttr::Literal(3);
        let a = doc.add_child(
            doc.root(),
            SchemaNode::new("a", Usage::Inherit, NodeBody::Struct(outer)),
        );
        let b = doc.add_child(a, structure("b"));
        let mut d = DataAttrs::new(DataKind::Character);
        d.length = IntAttr::Literal(1);
        d.count = IntAttr::Literal(2);
        let c = doc.add_child(b, SchemaNode::new("c", Usage::Inherit, NodeBody::Data(d)));
        assert_eq!(doc.array_path(c), vec![a, c]);
        assert_eq!(doc.array_path(b), vec![a]);
    }
}
