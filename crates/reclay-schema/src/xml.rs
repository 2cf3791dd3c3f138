//! XML front end: tokenizes layout markup into [`TagEvent`]s.
//!
//! Only element structure and attributes matter; text, comments and
//! processing instructions are ignored. A document type declaration naming
//! a grammar resource the loader does not know is reported once, and every
//! later error of the same read is counted as suppressed.

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use reclay_core::{LoadError, ParseError, ParseErrors};

use crate::document::Document;
use crate::ingest::{load, LoadOptions, TagEvent};

/// Tokenize `source` into tag events.
pub fn read_tags(source: &str, options: &LoadOptions) -> Result<Vec<TagEvent>, ParseErrors> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut events = Vec::new();
    let mut errors = ParseErrors::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match open_event(&reader, &e) {
                Ok(event) => events.push(event),
                Err(detail) => errors.push(syntax(&reader, detail)),
            },
            Ok(Event::Empty(e)) => match open_event(&reader, &e) {
                Ok(event) => {
                    events.push(event);
                    events.push(TagEvent::Close);
                }
                Err(detail) => errors.push(syntax(&reader, detail)),
            },
            Ok(Event::End(_)) => events.push(TagEvent::Close),
            Ok(Event::DocType(e)) => {
                let raw = String::from_utf8_lossy(e.as_ref());
                if let Some(resource) = grammar_resource(&raw) {
                    if !options.knows_grammar(resource) {
                        errors.push(ParseError::MissingGrammar {
                            resource: resource.to_string(),
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                errors.push(syntax(&reader, e.to_string()));
                break;
            }
        }
    }

    if errors.is_empty() {
        debug!(events = events.len(), "layout markup tokenized");
        Ok(events)
    } else {
        Err(errors)
    }
}

/// Tokenize and load `source` in one step.
pub fn load_xml(source: &str, options: &LoadOptions) -> Result<Document, LoadError> {
    let events = read_tags(source, options).map_err(LoadError::Parse)?;
    load(events, options)
}

fn syntax(reader: &Reader<&[u8]>, detail: String) -> ParseError {
    ParseError::Syntax {
        position: reader.error_position() as u64,
        detail,
    }
}

fn open_event(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<TagEvent, String> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| e.to_string())?
        .to_string();
    let mut attrs = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| e.to_string())?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(TagEvent::Open { tag, attrs })
}

/// The system identifier of a document type declaration, if it has one.
///
/// That is the last quoted literal before any internal subset.
fn grammar_resource(doctype: &str) -> Option<&str> {
    let external = doctype.split('[').next().unwrap_or_default();
    let mut last = None;
    let mut rest = external;
    while let Some(open) = rest.find(['"', '\'']) {
        let quote = rest[open..].chars().next()?;
        let body = &rest[open + 1..];
        let close = body.find(quote)?;
        last = Some(&body[..close]);
        rest = &body[close + 1..];
    }
    last
}
