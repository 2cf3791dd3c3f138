//! Schema ingestion: building a [`Document`] from a stream of tag events.
//!
//! Loading runs in phases. The tag stream is walked once to build the tree
//! and parse attributes; then struct-typed fields are expanded and every
//! reference attribute is linked. Specification errors from all phases are
//! collected and reported together.

use indexmap::IndexMap;
use tracing::debug;

use reclay_core::{
    DataKind, LoadError, NodeId, NodeKind, ParseError, ParseErrors, SpecificationError, Usage,
};

use crate::attr::{
    is_valid_name, AttrParser, DataAttrs, DATA_ATTRIBUTES, DOCUMENT_ATTRIBUTES, STRUCT_ATTRIBUTES,
};
use crate::document::Document;
use crate::expand::expand_structs;
use crate::link::link_references;
use crate::node::{NodeBody, SchemaNode};

/// Tag name of struct nodes.
pub const STRUCT_TAG: &str = "struct";
/// Tag name of data nodes.
pub const DATA_TAG: &str = "data";

/// One tokenized tag, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagEvent {
    /// An opening tag with its attributes in declaration order.
    Open {
        /// Tag name.
        tag: String,
        /// Attribute map.
        attrs: IndexMap<String, String>,
    },
    /// Closes the innermost open tag.
    Close,
}

impl TagEvent {
    /// Convenience constructor for an opening tag.
    pub fn open<'a>(tag: &str, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::Open {
            tag: tag.to_string(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Loader settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Tag name of the document root.
    pub document_tag: String,
    /// Grammar resources a source may name in its document type declaration.
    pub grammars: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            document_tag: "layout".into(),
            grammars: vec!["layout.dtd".into()],
        }
    }
}

impl LoadOptions {
    /// Whether `resource` is a known grammar.
    pub fn knows_grammar(&self, resource: &str) -> bool {
        self.grammars.iter().any(|g| g == resource)
    }
}

struct Frame {
    tag: String,
    /// `None` while skipping the subtree of a rejected tag.
    node: Option<NodeId>,
}

/// Build, expand and link a document from `events`.
///
/// Fails with [`LoadError::Parse`] when the stream itself is malformed, and
/// otherwise with [`LoadError::Specification`] listing every schema defect.
pub fn load<I>(events: I, options: &LoadOptions) -> Result<Document, LoadError>
where
    I: IntoIterator<Item = TagEvent>,
{
    let mut doc = Document::new("");
    let mut parse_errors = ParseErrors::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut seen_root = false;
    let mut count = 0usize;

    for (index, event) in events.into_iter().enumerate() {
        count += 1;
        match event {
            TagEvent::Open { tag, attrs } => {
                let frame = open_tag(&mut doc, &stack, &mut seen_root, tag, &attrs, options);
                stack.push(frame);
            }
            TagEvent::Close => {
                if stack.pop().is_none() {
                    parse_errors.push(ParseError::UnbalancedClose { event: index });
                }
            }
        }
    }
    if let Some(frame) = stack.last() {
        parse_errors.push(ParseError::UnclosedTag {
            tag: frame.tag.clone(),
        });
    }
    if !seen_root && parse_errors.is_empty() {
        parse_errors.push(ParseError::Syntax {
            position: 0,
            detail: format!("no <{}> element", options.document_tag),
        });
    }
    if !parse_errors.is_empty() {
        return Err(LoadError::Parse(parse_errors));
    }
    debug!(events = count, nodes = doc.len(), "schema tree built");

    let expansion = expand_structs(&mut doc);
    link_references(&mut doc, &expansion.templates);

    let errors = doc.take_errors();
    if !errors.is_empty() {
        debug!(errors = errors.len(), "schema rejected");
        return Err(LoadError::Specification(errors));
    }
    debug!(
        nodes = doc.len(),
        names = doc.qualified_names().count(),
        "schema loaded"
    );
    Ok(doc)
}

fn open_tag(
    doc: &mut Document,
    stack: &[Frame],
    seen_root: &mut bool,
    tag: String,
    attrs: &IndexMap<String, String>,
    options: &LoadOptions,
) -> Frame {
    let parent = match stack.last() {
        None => {
            if *seen_root {
                doc.record_error(SpecificationError::TagNotAllowed {
                    tag: tag.clone(),
                    parent: String::new(),
                });
                return Frame { tag, node: None };
            }
            *seen_root = true;
            if tag != options.document_tag {
                doc.record_error(SpecificationError::UnknownTag {
                    tag: tag.clone(),
                    parent: String::new(),
                });
                return Frame { tag, node: None };
            }
            open_document(doc, attrs);
            return Frame {
                tag,
                node: Some(doc.root()),
            };
        }
        Some(Frame { node: None, .. }) => return Frame { tag, node: None },
        Some(Frame {
            node: Some(parent),
            tag: parent_tag,
        }) => (*parent, parent_tag.as_str()),
    };
    let (parent, parent_tag) = parent;

    if tag != STRUCT_TAG && tag != DATA_TAG {
        doc.record_error(SpecificationError::UnknownTag {
            tag: tag.clone(),
            parent: parent_tag.to_string(),
        });
        return Frame { tag, node: None };
    }
    if doc.node(parent).kind() == NodeKind::Data {
        doc.record_error(SpecificationError::TagNotAllowed {
            tag: tag.clone(),
            parent: doc.name_for_exception(parent),
        });
        return Frame { tag, node: None };
    }

    let id = open_node(doc, parent, &tag, attrs);
    Frame { tag, node: Some(id) }
}

fn open_document(doc: &mut Document, attrs: &IndexMap<String, String>) {
    let root = doc.root();
    let mut parser = AttrParser::new("", attrs);
    parser.check_known(DOCUMENT_ATTRIBUTES);
    for error in parser.finish() {
        doc.record_error(error);
    }
    doc.node_mut(root).name = attrs.get("name").cloned().unwrap_or_default();
}

fn open_node(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    attrs: &IndexMap<String, String>,
) -> NodeId {
    let name = attrs.get("name").cloned().unwrap_or_default();
    let name_ok = name.is_empty() || (is_valid_name(&name) && !name.contains('.'));
    let placeholder = if tag == STRUCT_TAG {
        NodeBody::Struct(Default::default())
    } else {
        NodeBody::Data(DataAttrs::new(DataKind::Character))
    };
    let stored_name = if name_ok { name.clone() } else { String::new() };
    let id = doc.add_child(parent, SchemaNode::new(stored_name, Usage::Inherit, placeholder));

    let display = doc.name_for_exception(id);
    let mut parser = AttrParser::new(&display, attrs);
    let (usage, body) = if tag == STRUCT_TAG {
        parser.check_known(STRUCT_ATTRIBUTES);
        (parser.usage(), NodeBody::Struct(parser.struct_attrs()))
    } else {
        parser.check_known(DATA_ATTRIBUTES);
        (parser.usage(), NodeBody::Data(parser.data_attrs()))
    };
    let mut errors = parser.finish();
    if !name_ok {
        errors.insert(
            0,
            SpecificationError::BadAttributeValue {
                node: display.clone(),
                attribute: "name".into(),
                value: name,
            },
        );
    }
    for error in errors {
        doc.record_error(error);
    }

    let node = doc.node_mut(id);
    node.usage = usage;
    node.body = body;
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(tag: &str) -> TagEvent {
        TagEvent::Open {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
        }
    }

    fn data<'a>(pairs: &[(&'a str, &'a str)]) -> TagEvent {
        TagEvent::open(DATA_TAG, pairs.iter().copied())
    }

    fn structure(name: &str) -> TagEvent {
        TagEvent::open(STRUCT_TAG, [("name", name)])
    }

    fn layout(body: Vec<TagEvent>) -> Vec<TagEvent> {
        let mut events = vec![TagEvent::open("layout", [("name", "test")])];
        events.extend(body);
        events.push(TagEvent::Close);
        events
    }

    #[test]
    fn builds_tree_and_parses_attributes() {
        let events = layout(vec![
            structure("rec"),
            data(&[("name", "n"), ("type", "int"), ("length", "4")]),
            TagEvent::Close,
            data(&[("name", "items"), ("type", "char"), ("length", "3"), ("count", "n")]),
            TagEvent::Close,
            TagEvent::Close,
        ]);
        let doc = load(events, &LoadOptions::default()).unwrap();
        assert_eq!(doc.node(doc.root()).name(), "test");
        let n = doc.lookup("rec.n").unwrap();
        let items = doc.lookup("rec.items").unwrap();
        assert_eq!(doc.node(n).data_kind(), Some(DataKind::Binary));
        assert_eq!(doc.node(items).links().count, Some(n));
    }

    #[test]
    fn unbalanced_close_is_a_parse_error() {
        let mut events = layout(vec![]);
        events.push(TagEvent::Close);
        let err = load(events, &LoadOptions::default()).unwrap_err();
        let LoadError::Parse(errors) = err else {
            panic!("expected parse error, got {err:?}");
        };
        assert_eq!(errors.errors(), &[ParseError::UnbalancedClose { event: 2 }]);
    }

    #[test]
    fn unclosed_tag_is_a_parse_error() {
        let events = vec![bare("layout"), structure("rec")];
        let err = load(events, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse(ref e) if e.errors()[0].key() == "parse.unclosed_tag"
        ));
    }

    #[test]
    fn all_specification_errors_are_reported_together() {
        let events = layout(vec![
            structure("rec"),
            data(&[("name", "a"), ("type", "int"), ("length", "3")]),
            TagEvent::Close,
            data(&[("name", "b"), ("type", "char"), ("length", "2"), ("colour", "red")]),
            TagEvent::Close,
            bare("widget"),
            data(&[("name", "hidden"), ("type", "char")]),
            TagEvent::Close,
            TagEvent::Close,
            data(&[("name", "a"), ("type", "char"), ("length", "1")]),
            TagEvent::Close,
            TagEvent::Close,
        ]);
        let err = load(events, &LoadOptions::default()).unwrap_err();
        let keys: Vec<_> = err.specification_errors().iter().map(|e| e.key()).collect();
        assert_eq!(
            keys,
            vec![
                "spec.bad_attribute_value",
                "spec.unknown_attribute",
                "spec.unknown_tag",
                "spec.duplicate_name",
            ]
        );
    }

    #[test]
    fn data_cannot_contain_tags() {
        let events = layout(vec![
            data(&[("name", "x"), ("type", "char"), ("length", "1")]),
            data(&[("name", "y"), ("type", "char"), ("length", "1")]),
            TagEvent::Close,
            TagEvent::Close,
        ]);
        let err = load(events, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.specification_errors()[0].key(), "spec.tag_not_allowed");
    }

    #[test]
    fn wrong_root_tag_is_unknown() {
        let events = vec![bare("pcml"), TagEvent::Close];
        let err = load(events, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.specification_errors()[0].key(), "spec.unknown_tag");
    }

    #[test]
    fn dotted_node_name_is_rejected() {
        let events = layout(vec![
            data(&[("name", "a.b"), ("type", "char"), ("length", "1")]),
            TagEvent::Close,
        ]);
        let err = load(events, &LoadOptions::default()).unwrap_err();
        assert_eq!(
            err.specification_errors(),
            &[SpecificationError::BadAttributeValue {
                node: "[0]".into(),
                attribute: "name".into(),
                value: "a.b".into(),
            }]
        );
    }

    #[test]
    fn empty_stream_fails_to_parse() {
        let err = load(Vec::new(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }
}
