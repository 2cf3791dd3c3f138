//! Positioning rules: explicit offsets, anchors, overlays, references
//! resolved against the nearest scope, and struct-typed fields.

use std::sync::Arc;

use reclay_core::{DataError, Dimensions, Value};
use reclay_engine::{CodecRegistry, EngineConfig, Record};
use reclay_test_utils::{load_script, MockCodecFactory, TagScript};

fn record(script: TagScript) -> Record {
    let codecs = Arc::new(CodecRegistry::new(
        Arc::new(MockCodecFactory::new()),
        EngineConfig::DEFAULT_ENCODING,
    ));
    Record::new(load_script(script), "rec", codecs, EngineConfig::default()).unwrap()
}

fn none() -> Dimensions {
    Dimensions::new()
}

fn chars(n: &str) -> [(&'static str, &str); 2] {
    [("type", "char"), ("length", n)]
}

/// `pad` fills 100 bytes, so `blk` starts at 100 and `f` sits 10 bytes in.
fn anchored() -> TagScript {
    TagScript::new()
        .open_struct("rec", &[])
        .data("pad", &chars("100"))
        .open_struct("blk", &[])
        .data("a", &chars("2"))
        .data(
            "f",
            &[
                ("type", "char"),
                ("length", "3"),
                ("offset", "10"),
                ("offsetfrom", "blk"),
            ],
        )
        .close()
        .close()
}

#[test]
fn offset_from_anchor_skips_the_gap() {
    let mut rec = record(anchored());
    rec.set_value("pad", &none(), "".into()).unwrap();
    rec.set_value("blk.a", &none(), "ab".into()).unwrap();
    rec.set_value("blk.f", &none(), "xyz".into()).unwrap();
    assert_eq!(rec.byte_length().unwrap(), 113);

    let image = rec.serialize().unwrap();
    assert_eq!(image.len(), 113);
    assert_eq!(&image[100..102], b"ab");
    assert!(image[102..110].iter().all(|&b| b == 0));
    assert_eq!(&image[110..], b"xyz");

    let mut back = record(anchored());
    back.parse(&image).unwrap();
    assert_eq!(
        back.get_value("rec.blk.f", &none()).unwrap(),
        Some(Value::from("xyz"))
    );
}

#[test]
fn offset_from_anchor_past_the_input() {
    let mut rec = record(anchored());
    let input = vec![b' '; 105];
    match rec.parse(&input) {
        Err(DataError::BadTotalOffset {
            field,
            offset,
            anchor,
            base,
            buffer_len,
        }) => {
            assert_eq!(field, "rec.blk.f");
            assert_eq!(offset, 10);
            assert_eq!(anchor, "blk");
            assert_eq!(base, 100);
            assert_eq!(buffer_len, 105);
        }
        other => panic!("expected BadTotalOffset, got {other:?}"),
    }
}

#[test]
fn backward_offset_overlays() {
    let script = TagScript::new()
        .open_struct("rec", &[])
        .data("a", &chars("4"))
        .data("b", &[("type", "char"), ("length", "2"), ("offset", "1")])
        .close();
    let mut rec = record(script.clone());
    rec.set_value("a", &none(), "WXYZ".into()).unwrap();
    rec.set_value("b", &none(), "bc".into()).unwrap();
    // the cursor never moves backwards past what was already laid out
    assert_eq!(rec.serialize().unwrap(), b"WbcZ");

    let mut back = record(script);
    back.parse(b"WbcZ").unwrap();
    assert_eq!(back.get_value("b", &none()).unwrap(), Some(Value::from("bc")));
}

#[test]
fn offset_read_from_another_field() {
    let script = TagScript::new()
        .open_struct("rec", &[])
        .data("off", &[("type", "int"), ("length", "2")])
        .data("d", &[("type", "char"), ("length", "2"), ("offset", "off")])
        .close();
    let mut rec = record(script);
    rec.set_value("off", &none(), Value::Short(6)).unwrap();
    rec.set_value("d", &none(), "hi".into()).unwrap();
    assert_eq!(
        rec.serialize().unwrap(),
        vec![0, 6, 0, 0, 0, 0, b'h', b'i']
    );

    rec.set_value("off", &none(), Value::Short(-8)).unwrap();
    match rec.serialize() {
        Err(DataError::BadOffset { field, offset, .. }) => {
            assert_eq!(field, "rec.d");
            assert_eq!(offset, -8);
        }
        other => panic!("expected BadOffset, got {other:?}"),
    }
}

#[test]
fn literal_offsetfrom_is_an_absolute_base() {
    let script = TagScript::new()
        .open_struct("rec", &[])
        .data("a", &chars("2"))
        .open_struct("s", &[])
        .data(
            "b",
            &[
                ("type", "char"),
                ("length", "2"),
                ("offset", "3"),
                ("offsetfrom", "10"),
            ],
        )
        .close()
        .close();
    let mut rec = record(script);
    rec.set_value("a", &none(), "aa".into()).unwrap();
    rec.set_value("s.b", &none(), "bb".into()).unwrap();
    let image = rec.serialize().unwrap();
    assert_eq!(image.len(), 15);
    assert_eq!(&image[13..], b"bb");
}

#[test]
fn nearest_scope_wins_for_references() {
    let script = TagScript::new()
        .open_struct("rec", &[])
        .data("n", &[("type", "int"), ("length", "2")])
        .open_struct("sub", &[])
        .data("n", &[("type", "int"), ("length", "2")])
        .data("s", &[("type", "char"), ("length", "n")])
        .close()
        .close();
    let mut rec = record(script);
    rec.set_value("n", &none(), Value::Short(1)).unwrap();
    rec.set_value("sub.n", &none(), Value::Short(3)).unwrap();
    rec.set_value("sub.s", &none(), "abc".into()).unwrap();
    assert_eq!(rec.byte_length().unwrap(), 2 + 2 + 3);
    assert_eq!(rec.serialize().unwrap(), b"\0\x01\0\x03abc");
}

#[test]
fn length_follows_its_reference() {
    let script = TagScript::new()
        .open_struct("rec", &[])
        .data("len", &[("type", "int"), ("length", "2")])
        .data("s", &[("type", "char"), ("length", "len")])
        .close();
    let mut rec = record(script);
    rec.set_value("len", &none(), Value::Short(2)).unwrap();
    assert_eq!(rec.byte_length().unwrap(), 4);
    rec.set_value("len", &none(), Value::Short(5)).unwrap();
    assert_eq!(rec.byte_length().unwrap(), 7);
}

#[test]
fn struct_typed_field_repeats_the_template() {
    let script = TagScript::new()
        .open_struct("addr", &[])
        .data("street", &chars("5"))
        .data("zip", &chars("3"))
        .close()
        .open_struct("rec", &[])
        .data(
            "home",
            &[("type", "struct"), ("struct", "addr"), ("count", "2")],
        )
        .close();
    let mut rec = record(script);
    for i in 0..2u32 {
        let dims = Dimensions::from([i]);
        rec.set_value("home.street", &dims, format!("st{i}").into())
            .unwrap();
        rec.set_value("home.zip", &dims, "123".into()).unwrap();
    }
    let image = rec.serialize().unwrap();
    assert_eq!(image, b"st0  123st1  123");
}

#[test]
fn unset_reference_target_is_reported() {
    let script = TagScript::new()
        .open_struct("rec", &[])
        .data("len", &[("type", "int"), ("length", "2")])
        .data("s", &[("type", "char"), ("length", "len")])
        .close();
    let mut rec = record(script);
    match rec.byte_length() {
        Err(DataError::UnresolvedReference { field, reference }) => {
            assert_eq!(field, "rec.s");
            assert_eq!(reference, "rec.len");
        }
        other => panic!("expected UnresolvedReference, got {other:?}"),
    }
}
