//! Struct expansion.
//!
//! After ingestion every struct-typed data field is still a leaf naming a
//! struct. This pass copies the named struct's children into each such leaf,
//! turning it into a container, and recurses into the copies. Afterwards the
//! tree's shape is final.
//!
//! Cycles are detected against the active expansion path, not a global
//! visited set: one struct may be expanded on any number of independent
//! branches, but never inside itself.

use std::collections::HashSet;

use tracing::debug;

use reclay_core::{DataKind, NodeId, NodeKind, SpecificationError};

use crate::document::Document;
use crate::node::NodeBody;
use crate::resolve::resolve_relative_node;

/// Outcome of [`expand_structs`].
#[derive(Clone, Debug, Default)]
pub struct Expansion {
    /// Structs that were used as expansion templates at least once.
    pub templates: HashSet<NodeId>,
    /// Number of struct-typed fields expanded, clones included.
    pub expanded: usize,
}

/// Expand every struct-typed field in `doc`, recording defects on it.
pub fn expand_structs(doc: &mut Document) -> Expansion {
    let mut expansion = Expansion::default();
    let mut path = Vec::new();
    let top: Vec<NodeId> = doc.children(doc.root()).to_vec();
    for id in top {
        walk(doc, id, &mut path, &mut expansion);
    }
    debug!(
        expanded = expansion.expanded,
        templates = expansion.templates.len(),
        "struct expansion complete"
    );
    expansion
}

fn walk(doc: &mut Document, id: NodeId, path: &mut Vec<NodeId>, out: &mut Expansion) {
    match doc.node(id).kind() {
        NodeKind::Struct => {
            path.push(id);
            walk_children(doc, id, path, out);
            path.pop();
        }
        NodeKind::Data if doc.node(id).data_kind() == Some(DataKind::Struct) => {
            expand_field(doc, id, path, out);
        }
        _ => {}
    }
}

fn walk_children(doc: &mut Document, id: NodeId, path: &mut Vec<NodeId>, out: &mut Expansion) {
    let children = doc.children(id).to_vec();
    for child in children {
        walk(doc, child, path, out);
    }
}

fn expand_field(doc: &mut Document, id: NodeId, path: &mut Vec<NodeId>, out: &mut Expansion) {
    if doc.node(id).expansion_failed {
        // Copied from a branch whose defect is already reported.
        return;
    }
    let Some(target) = struct_target(doc, id) else {
        doc.node_mut(id).expansion_failed = true;
        return;
    };
    doc.node_mut(id).links.structure = Some(target);

    // A field with children is a copy of an expansion already checked where
    // it was first made; only leaves can close a cycle.
    if doc.children(id).is_empty() {
        if path.contains(&target) {
            let error = SpecificationError::CircularStructReference {
                node: doc.name_for_exception(id),
                structure: doc.name_for_exception(target),
            };
            doc.record_error(error);
            doc.node_mut(id).expansion_failed = true;
            return;
        }
        doc.clone_children_into(target, id);
        out.templates.insert(target);
        out.expanded += 1;
    }
    path.push(target);
    walk_children(doc, id, path, out);
    path.pop();
}

/// The struct named by a struct-typed field, or `None` after recording why not.
fn struct_target(doc: &mut Document, id: NodeId) -> Option<NodeId> {
    let name = match &doc.node(id).body {
        NodeBody::Data(d) => d.structure.clone()?,
        _ => return None,
    };
    match resolve_relative_node(doc, id, &name) {
        None => {
            let error = SpecificationError::ReferenceNotFound {
                node: doc.name_for_exception(id),
                attribute: "struct".into(),
                reference: name,
            };
            doc.record_error(error);
            None
        }
        Some(target) if doc.node(target).kind() != NodeKind::Struct => {
            let error = SpecificationError::ReferenceWrongKind {
                node: doc.name_for_exception(id),
                attribute: "struct".into(),
                reference: name,
                expected: "struct",
            };
            doc.record_error(error);
            None
        }
        Some(target) => Some(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{DataAttrs, IntAttr, StructAttrs};
    use crate::node::SchemaNode;
    use reclay_core::Usage;

    fn structure(doc: &mut Document, parent: NodeId, name: &str) -> NodeId {
        doc.add_child(
            parent,
            SchemaNode::new(name, Usage::Inherit, NodeBody::Struct(StructAttrs::default())),
        )
    }

    fn scalar(doc: &mut Document, parent: NodeId, name: &str) -> NodeId {
        let mut d = DataAttrs::new(DataKind::Character);
        d.length = IntAttr::Literal(2);
        doc.add_child(parent, SchemaNode::new(name, Usage::Inherit, NodeBody::Data(d)))
    }

    fn struct_ref(doc: &mut Document, parent: NodeId, name: &str, target: &str) -> NodeId {
        let mut d = DataAttrs::new(DataKind::Struct);
        d.structure = Some(target.to_string());
        doc.add_child(parent, SchemaNode::new(name, Usage::Inherit, NodeBody::Data(d)))
    }

    fn circular_count(doc: &Document) -> usize {
        doc.errors()
            .iter()
            .filter(|e| e.key() == "spec.circular_struct_reference")
            .count()
    }

    #[test]
    fn expands_referenced_struct_in_place() {
        let mut doc = Document::new("layout");
        let root = doc.root();
        let hdr = structure(&mut doc, root, "hdr");
        scalar(&mut doc, hdr, "id");
        scalar(&mut doc, hdr, "ver");
        let rec = structure(&mut doc, root, "rec");
        let h = struct_ref(&mut doc, rec, "h", "hdr");

        let out = expand_structs(&mut doc);
        assert!(doc.errors().is_empty());
        assert_eq!(doc.children(h).len(), 2);
        assert!(doc.lookup("rec.h.id").is_some());
        assert!(doc.lookup("rec.h.ver").is_some());
        assert!(out.templates.contains(&hdr));
        assert_eq!(doc.node(h).links().structure, Some(hdr));
    }

    #[test]
    fn nested_expansion_reaches_inner_templates() {
        let mut doc = Document::new("layout");
        let root = doc.root();
        let point = structure(&mut doc, root, "point");
        scalar(&mut doc, point, "x");
        let line = structure(&mut doc, root, "line");
        struct_ref(&mut doc, line, "from", "point");
        struct_ref(&mut doc, line, "to", "point");
        let rec = structure(&mut doc, root, "rec");
        struct_ref(&mut doc, rec, "edge", "line");

        expand_structs(&mut doc);
        assert!(doc.errors().is_empty());
        assert!(doc.lookup("rec.edge.from.x").is_some());
        assert!(doc.lookup("rec.edge.to.x").is_some());
    }

    #[test]
    fn self_reference_reports_once() {
        let mut doc = Document::new("layout");
        let root = doc.root();
        let a = structure(&mut doc, root, "a");
        struct_ref(&mut doc, a, "again", "a");
        expand_structs(&mut doc);
        assert_eq!(circular_count(&doc), 1);
    }

    #[test]
    fn mutual_cycle_reports_once() {
        let mut doc = Document::new("layout");
        let root = doc.root();
        let a = structure(&mut doc, root, "a");
        struct_ref(&mut doc, a, "b_ref", "b");
        let b = structure(&mut doc, root, "b");
        struct_ref(&mut doc, b, "a_ref", "a");
        expand_structs(&mut doc);
        assert_eq!(circular_count(&doc), 1);
    }

    #[test]
    fn transitive_cycle_reports_once() {
        let mut doc = Document::new("layout");
        let root = doc.root();
        for (name, next) in [("a", "b"), ("b", "c"), ("c", "a")] {
            let s = structure(&mut doc, root, name);
            struct_ref(&mut doc, s, "next", next);
        }
        expand_structs(&mut doc);
        assert_eq!(circular_count(&doc), 1);
    }

    #[test]
    fn reuse_on_independent_branches_is_not_a_cycle() {
        let mut doc = Document::new("layout");
        let root = doc.root();
        let leaf = structure(&mut doc, root, "leaf");
        scalar(&mut doc, leaf, "v");
        let pair = structure(&mut doc, root, "pair");
        struct_ref(&mut doc, pair, "l", "leaf");
        struct_ref(&mut doc, pair, "r", "leaf");
        expand_structs(&mut doc);
        assert!(doc.errors().is_empty());
    }

    #[test]
    fn missing_and_wrong_kind_references() {
        let mut doc = Document::new("layout");
        let root = doc.root();
        let rec = structure(&mut doc, root, "rec");
        scalar(&mut doc, rec, "plain");
        struct_ref(&mut doc, rec, "m", "nowhere");
        struct_ref(&mut doc, rec, "w", "rec.plain");
        expand_structs(&mut doc);
        let keys: Vec<_> = doc.errors().iter().map(|e| e.key()).collect();
        assert_eq!(
            keys,
            vec!["spec.reference_not_found", "spec.reference_wrong_kind"]
        );
    }
}
