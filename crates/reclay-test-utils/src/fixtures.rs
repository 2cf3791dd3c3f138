//! Schema fixtures built from tag scripts.
//!
//! [`TagScript`] writes the tag stream a tokenizer would produce, without
//! going through markup:
//!
//! ```ignore
//! let doc = load_script(
//!     TagScript::new()
//!         .open_struct("rec", &[])
//!         .data("n", &[("type", "int"), ("length", "2")])
//!         .data("s", &[("type", "char"), ("length", "n")]),
//! );
//! ```

use std::sync::Arc;

use reclay_core::LoadError;
use reclay_schema::{load, Document, LoadOptions, TagEvent};

/// Builder for a tag stream rooted at a `<layout>` element.
#[derive(Clone, Debug)]
pub struct TagScript {
    events: Vec<TagEvent>,
    depth: usize,
}

impl TagScript {
    /// A script whose document element carries no attributes.
    pub fn new() -> Self {
        Self::with_document(&[])
    }

    /// A script whose document element carries `attrs`.
    pub fn with_document(attrs: &[(&str, &str)]) -> Self {
        Self {
            events: vec![TagEvent::open("layout", attrs.iter().copied())],
            depth: 1,
        }
    }

    /// Open a `<struct>` named `name`; children follow until [`close`](Self::close).
    pub fn open_struct(self, name: &str, attrs: &[(&str, &str)]) -> Self {
        self.open("struct", name, attrs)
    }

    /// Open a `<data>` element without closing it, for nesting tests.
    pub fn open_data(self, name: &str, attrs: &[(&str, &str)]) -> Self {
        self.open("data", name, attrs)
    }

    /// A complete `<data/>` element.
    pub fn data(self, name: &str, attrs: &[(&str, &str)]) -> Self {
        self.open("data", name, attrs).close()
    }

    /// Open an arbitrary tag.
    pub fn open(mut self, tag: &str, name: &str, attrs: &[(&str, &str)]) -> Self {
        let all = std::iter::once(("name", name))
            .filter(|(_, v)| !v.is_empty())
            .chain(attrs.iter().copied());
        self.events.push(TagEvent::open(tag, all));
        self.depth += 1;
        self
    }

    /// Close the innermost open tag.
    pub fn close(mut self) -> Self {
        self.events.push(TagEvent::Close);
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// Append `event` verbatim, without tracking nesting.
    pub fn raw(mut self, event: TagEvent) -> Self {
        self.events.push(event);
        self
    }

    /// The events, with every open tag closed.
    pub fn events(mut self) -> Vec<TagEvent> {
        for _ in 0..self.depth {
            self.events.push(TagEvent::Close);
        }
        self.events
    }

    /// The events exactly as written.
    pub fn unbalanced(self) -> Vec<TagEvent> {
        self.events
    }

    /// Load the script with default options.
    pub fn load(self) -> Result<Document, LoadError> {
        load(self.events(), &LoadOptions::default())
    }
}

impl Default for TagScript {
    fn default() -> Self {
        Self::new()
    }
}

/// Load `script`, panicking with the full error report on failure.
pub fn load_script(script: TagScript) -> Arc<Document> {
    match script.load() {
        Ok(doc) => Arc::new(doc),
        Err(e) => panic!("fixture failed to load: {e}"),
    }
}

/// A header struct followed by a counted array of items:
///
/// ```text
/// rec
///   hdr
///     tag    char(4)
///     n      int(2)
///   item[hdr.n]
///     id     int(4)
///     amount packed(5,2)
///   note   char(6)
/// ```
pub fn header_and_items() -> TagScript {
    TagScript::new()
        .open_struct("rec", &[])
        .open_struct("hdr", &[])
        .data("tag", &[("type", "char"), ("length", "4")])
        .data("n", &[("type", "int"), ("length", "2")])
        .close()
        .open_struct("item", &[("count", "hdr.n")])
        .data("id", &[("type", "int"), ("length", "4")])
        .data(
            "amount",
            &[("type", "packed"), ("length", "5"), ("precision", "2")],
        )
        .close()
        .data("note", &[("type", "char"), ("length", "6")])
        .close()
}
