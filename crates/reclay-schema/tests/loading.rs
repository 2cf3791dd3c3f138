//! Schema loading from markup and tag scripts: tree shape, names, expansion,
//! linking, and aggregated error reporting.

use proptest::prelude::*;

use reclay_core::{LoadError, NodeKind, SpecificationError, Usage};
use reclay_schema::{load_xml, LoadOptions};
use reclay_test_utils::fixtures::header_and_items;
use reclay_test_utils::TagScript;

const ORDER: &str = r#"<?xml version="1.0"?>
<!DOCTYPE layout SYSTEM "layout.dtd">
<layout name="orders" version="1">
  <!-- a reusable party block -->
  <struct name="party">
    <data name="id" type="int" length="4"/>
    <data name="name" type="char" length="20" trim="right"/>
  </struct>
  <struct name="order" usage="input">
    <data name="lines" type="int" length="2"/>
    <data name="buyer" type="struct" struct="party"/>
    <struct name="line" count="lines">
      <data name="sku" type="char" length="8"/>
      <data name="qty" type="packed" length="7" precision="2" usage="inputoutput"/>
    </struct>
  </struct>
</layout>
"#;

fn spec_errors(result: Result<reclay_schema::Document, LoadError>) -> Vec<SpecificationError> {
    match result {
        Err(LoadError::Specification(errors)) => errors,
        other => panic!("expected specification errors, got {other:?}"),
    }
}

#[test]
fn markup_loads_into_a_linked_tree() {
    let doc = load_xml(ORDER, &LoadOptions::default()).unwrap();
    assert_eq!(doc.node(doc.root()).name(), "orders");

    let buyer_name = doc.lookup("order.buyer.name").unwrap();
    assert_eq!(doc.name_for_exception(buyer_name), "order.buyer.name");
    let buyer = doc.lookup("order.buyer").unwrap();
    assert_eq!(doc.node(buyer).kind(), NodeKind::Data);
    assert!(doc.node(buyer).is_container());
    assert_eq!(doc.children(buyer).len(), 2);

    let line = doc.lookup("order.line").unwrap();
    let lines = doc.lookup("order.lines").unwrap();
    assert_eq!(doc.node(line).links().count, Some(lines));

    let qty = doc.lookup("order.line.qty").unwrap();
    assert_eq!(doc.array_path(qty), vec![line]);
    assert_eq!(doc.effective_usage(qty), Usage::InputOutput);
    assert_eq!(doc.effective_usage(lines), Usage::Input);
    let party_id = doc.lookup("party.id").unwrap();
    assert_eq!(doc.effective_usage(party_id), Usage::InputOutput);
}

#[test]
fn script_and_markup_agree() {
    let src = r#"<layout>
        <struct name="rec">
          <struct name="hdr">
            <data name="tag" type="char" length="4"/>
            <data name="n" type="int" length="2"/>
          </struct>
          <struct name="item" count="hdr.n">
            <data name="id" type="int" length="4"/>
            <data name="amount" type="packed" length="5" precision="2"/>
          </struct>
          <data name="note" type="char" length="6"/>
        </struct>
      </layout>"#;
    let from_markup = load_xml(src, &LoadOptions::default()).unwrap();
    let from_script = header_and_items().load().unwrap();
    let names = |d: &reclay_schema::Document| {
        d.qualified_names()
            .map(|(n, _)| n.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&from_markup), names(&from_script));
}

#[test]
fn every_defect_is_reported_at_once() {
    let errors = spec_errors(
        TagScript::new()
            .open_struct("rec", &[])
            .data("a", &[("type", "char")])
            .data("b", &[("type", "char"), ("length", "2"), ("colour", "red")])
            .data("c", &[("type", "char"), ("length", "nosuch")])
            .data("a", &[("type", "char"), ("length", "1")])
            .close()
            .load(),
    );
    assert!(errors.contains(&SpecificationError::MissingAttribute {
        node: "rec.a".into(),
        attribute: "length".into(),
    }));
    assert!(errors.contains(&SpecificationError::UnknownAttribute {
        node: "rec.b".into(),
        attribute: "colour".into(),
    }));
    assert!(errors.contains(&SpecificationError::ReferenceNotFound {
        node: "rec.c".into(),
        attribute: "length".into(),
        reference: "nosuch".into(),
    }));
    assert!(errors.contains(&SpecificationError::DuplicateName {
        name: "rec.a".into(),
    }));
    assert_eq!(errors.len(), 4);
}

#[test]
fn self_referencing_struct_is_circular() {
    let errors = spec_errors(
        TagScript::new()
            .open_struct("node", &[])
            .data("v", &[("type", "int"), ("length", "4")])
            .data("next", &[("type", "struct"), ("struct", "node")])
            .close()
            .load(),
    );
    assert!(errors
        .iter()
        .any(|e| matches!(e, SpecificationError::CircularStructReference { .. })));
}

#[test]
fn one_struct_may_be_expanded_on_many_branches() {
    let doc = TagScript::new()
        .open_struct("pt", &[])
        .data("x", &[("type", "int"), ("length", "2")])
        .data("y", &[("type", "int"), ("length", "2")])
        .close()
        .open_struct("seg", &[])
        .data("from", &[("type", "struct"), ("struct", "pt")])
        .data("to", &[("type", "struct"), ("struct", "pt")])
        .close()
        .load()
        .unwrap();
    assert!(doc.lookup("seg.from.x").is_some());
    assert!(doc.lookup("seg.to.y").is_some());
}

#[test]
fn count_must_name_a_data_field() {
    let errors = spec_errors(
        TagScript::new()
            .open_struct("rec", &[])
            .open_struct("s", &[])
            .data("x", &[("type", "char"), ("length", "1")])
            .close()
            .open_struct("arr", &[("count", "s")])
            .data("y", &[("type", "char"), ("length", "1")])
            .close()
            .close()
            .load(),
    );
    assert!(matches!(
        &errors[..],
        [SpecificationError::ReferenceWrongKind { node, attribute, .. }]
            if node == "rec.arr" && attribute == "count"
    ));
}

#[test]
fn offsetfrom_must_be_an_ancestor() {
    let errors = spec_errors(
        TagScript::new()
            .open_struct("rec", &[])
            .open_struct("a", &[])
            .data("x", &[("type", "char"), ("length", "1")])
            .close()
            .data(
                "y",
                &[
                    ("type", "char"),
                    ("length", "1"),
                    ("offset", "0"),
                    ("offsetfrom", "a"),
                ],
            )
            .close()
            .load(),
    );
    assert!(errors
        .iter()
        .any(|e| matches!(e, SpecificationError::OffsetFromNotAncestor { .. })));
}

#[test]
fn data_cannot_contain_tags() {
    let errors = spec_errors(
        TagScript::new()
            .open_struct("rec", &[])
            .open_data("d", &[("type", "char"), ("length", "1")])
            .data("inner", &[("type", "char"), ("length", "1")])
            .close()
            .close()
            .load(),
    );
    assert_eq!(
        errors,
        vec![SpecificationError::TagNotAllowed {
            tag: "data".into(),
            parent: "rec.d".into(),
        }]
    );
}

#[test]
fn length_cannot_refer_to_itself() {
    let errors = spec_errors(
        TagScript::new()
            .open_struct("rec", &[])
            .data("s", &[("type", "char"), ("length", "s")])
            .close()
            .load(),
    );
    assert!(matches!(
        &errors[..],
        [SpecificationError::SelfReference { node, attribute, .. }]
            if node == "rec.s" && attribute == "length"
    ));
}

#[test]
fn unbalanced_script_is_a_parse_error() {
    let events = TagScript::new()
        .open_struct("rec", &[])
        .unbalanced();
    match reclay_schema::load(events, &LoadOptions::default()) {
        Err(LoadError::Parse(errors)) => {
            assert_eq!(errors.errors()[0].key(), "parse.unclosed_tag");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn unknown_grammar_in_markup() {
    let src = r#"<!DOCTYPE layout SYSTEM "legacy.dtd"><layout/>"#;
    match load_xml(src, &LoadOptions::default()) {
        Err(LoadError::Parse(errors)) => {
            assert_eq!(errors.errors()[0].key(), "parse.missing_grammar");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    let options = LoadOptions {
        grammars: vec!["legacy.dtd".into()],
        ..LoadOptions::default()
    };
    assert!(load_xml(src, &options).is_ok());
}

proptest! {
    #[test]
    fn every_named_field_is_registered(count in 1usize..12) {
        let mut script = TagScript::new().open_struct("rec", &[]);
        let names: Vec<String> = (0..count).map(|i| format!("f{i}")).collect();
        for name in &names {
            script = script.data(name, &[("type", "char"), ("length", "1")]);
        }
        let doc = script.close().load().unwrap();
        // root, rec, and the fields
        prop_assert_eq!(doc.len(), count + 2);
        for name in &names {
            let id = doc.lookup(&format!("rec.{name}"));
            prop_assert!(id.is_some());
            prop_assert_eq!(doc.name_for_exception(id.unwrap()), format!("rec.{name}"));
        }
    }
}
