//! Records: the values of one layout, marshalled to and from one buffer.
//!
//! A [`Record`] is rooted at a top-level struct of a shared [`Document`].
//! Every scalar position owns a [`ValueCache`], created on first touch;
//! repeated fields nest them in [`ArrayStore`]s. Lengths, counts and
//! offsets are resolved afresh on every access, so changing a referenced
//! field immediately changes the layout.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use reclay_core::{
    CharType, DataError, DataKind, Dimensions, InternalError, NodeId, NodeKind, TextOrdering,
    Tick, Value,
};
use reclay_schema::{resolve_integer, DataAttrs, Document, IntAttr, OffsetFrom, ValueLookup};

use crate::array::{ArrayStore, Entry};
use crate::cache::{CacheState, ValueCache};
use crate::codec::CodecRegistry;
use crate::coerce::{coerce, Shape};
use crate::config::EngineConfig;
use crate::layout::{byte_length, explicit_target, Base, Cursor, Geometry};

#[derive(Clone, Copy, Debug)]
enum Attr {
    Count,
    Length,
    Offset,
}

enum Pass<'a> {
    Parse(&'a [u8]),
    Serialize(Vec<u8>),
    Measure,
}

struct Traversal<'a> {
    pass: Pass<'a>,
    cursor: Cursor,
}

impl Traversal<'_> {
    /// Upper bound for explicit offsets: the input length when parsing.
    fn limit(&self) -> Option<usize> {
        match self.pass {
            Pass::Parse(bytes) => Some(bytes.len()),
            _ => None,
        }
    }

    /// Buffer length as reported in offset errors.
    fn extent(&self) -> usize {
        match &self.pass {
            Pass::Parse(bytes) => bytes.len(),
            Pass::Serialize(out) => out.len(),
            Pass::Measure => self.cursor.end,
        }
    }
}

/// Values of one layout and their wire image.
///
/// Not internally synchronized: mutation takes `&mut self`. The document
/// and codec registry are shared and may serve many records at once.
pub struct Record {
    doc: Arc<Document>,
    root: NodeId,
    codecs: Arc<CodecRegistry>,
    config: EngineConfig,
    stores: Vec<Option<Entry>>,
    orderings: HashMap<NodeId, TextOrdering>,
}

impl Record {
    /// A record for the top-level struct `root`.
    ///
    /// `config` is expected to have passed [`EngineConfig::validate`].
    pub fn new(
        doc: Arc<Document>,
        root: &str,
        codecs: Arc<CodecRegistry>,
        config: EngineConfig,
    ) -> Result<Self, DataError> {
        let id = doc
            .lookup(root)
            .filter(|&id| {
                doc.parent(id) == Some(doc.root()) && doc.node(id).kind() == NodeKind::Struct
            })
            .ok_or_else(|| DataError::UnknownField {
                name: root.to_string(),
            })?;
        debug!(root, nodes = doc.len(), "record created");
        let stores = std::iter::repeat_with(|| None).take(doc.len()).collect();
        Ok(Self {
            doc,
            root: id,
            codecs,
            config,
            stores,
            orderings: HashMap::new(),
        })
    }

    /// The schema this record lays out.
    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    /// Handle of the record's root struct.
    pub fn root(&self) -> NodeId {
        self.root
    }

    // ── Marshalling ────────────────────────────────────────────────

    /// Take field bytes from `bytes`.
    ///
    /// Every byte must belong to some field; trailing input is an error.
    /// Fields whose usage is input-only are skipped over but not stored.
    pub fn parse(&mut self, bytes: &[u8]) -> Result<(), DataError> {
        debug!(len = bytes.len(), "parsing record");
        let mut t = Traversal {
            pass: Pass::Parse(bytes),
            cursor: Cursor::new(),
        };
        self.walk(self.root, &mut Dimensions::new(), &mut t)?;
        if t.cursor.end < bytes.len() {
            return Err(DataError::ExcessData {
                consumed: t.cursor.end,
                supplied: bytes.len(),
            });
        }
        Ok(())
    }

    /// Produce the wire image of the current values.
    ///
    /// Fields whose usage is output-only are written as zeros.
    pub fn serialize(&mut self) -> Result<Vec<u8>, DataError> {
        let mut t = Traversal {
            pass: Pass::Serialize(Vec::new()),
            cursor: Cursor::new(),
        };
        self.walk(self.root, &mut Dimensions::new(), &mut t)?;
        let Pass::Serialize(mut out) = t.pass else {
            return Ok(Vec::new());
        };
        // a trailing gap still counts toward the layout
        out.resize(t.cursor.end.max(out.len()), 0);
        debug!(len = out.len(), "record serialized");
        Ok(out)
    }

    /// Length [`serialize`](Self::serialize) would produce, without encoding
    /// any value.
    pub fn byte_length(&mut self) -> Result<usize, DataError> {
        let mut t = Traversal {
            pass: Pass::Measure,
            cursor: Cursor::new(),
        };
        self.walk(self.root, &mut Dimensions::new(), &mut t)?;
        Ok(t.cursor.end)
    }

    // ── Field access ───────────────────────────────────────────────

    /// Current value of field `name` at `dims`.
    ///
    /// Decodes when the bytes are newer than the value; falls back to the
    /// declared initial value. `Ok(None)` when there is neither.
    pub fn get_value(&mut self, name: &str, dims: &Dimensions) -> Result<Option<Value>, DataError> {
        let node = self.field(name)?;
        self.value_at(node, dims)
    }

    /// Assign a native value, coerced to the field's shape.
    pub fn set_value(
        &mut self,
        name: &str,
        dims: &Dimensions,
        value: Value,
    ) -> Result<(), DataError> {
        let node = self.field(name)?;
        self.store_value(node, dims, value)
    }

    /// Assign raw wire bytes. The bytes are copied.
    pub fn set_bytes(
        &mut self,
        name: &str,
        dims: &Dimensions,
        bytes: &[u8],
    ) -> Result<(), DataError> {
        let node = self.field(name)?;
        self.scalar(node)?;
        self.cache_mut(node, dims)?.set_bytes(bytes);
        Ok(())
    }

    /// Current wire bytes of a field, when they are held.
    pub fn get_bytes(
        &mut self,
        name: &str,
        dims: &Dimensions,
    ) -> Result<Option<Vec<u8>>, DataError> {
        let node = self.field(name)?;
        self.scalar(node)?;
        Ok(self.cache_mut(node, dims)?.bytes().map(<[u8]>::to_vec))
    }

    /// Freshness state of one position.
    pub fn cache_state(&mut self, name: &str, dims: &Dimensions) -> Result<CacheState, DataError> {
        let node = self.field(name)?;
        self.scalar(node)?;
        Ok(self.cache_mut(node, dims)?.state())
    }

    /// Change the text ordering handed to a field's codec.
    ///
    /// Native values decoded under the old ordering are dropped; values that
    /// were assigned directly are kept.
    pub fn set_text_ordering(
        &mut self,
        name: &str,
        ordering: TextOrdering,
    ) -> Result<(), DataError> {
        let node = self.field(name)?;
        self.scalar(node)?;
        self.orderings.insert(node, ordering);
        if let Some(entry) = self.stores[node.index()].as_mut() {
            entry.for_each_cache(&mut ValueCache::invalidate_value);
        }
        Ok(())
    }

    /// Discard every value and byte held by the record.
    pub fn flush(&mut self) {
        debug!("record flushed");
        self.stores.iter_mut().for_each(|s| *s = None);
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Resolve a field name: qualified, or relative to the record root.
    fn field(&self, name: &str) -> Result<NodeId, DataError> {
        let in_record = |id: NodeId| id == self.root || self.doc.is_ancestor(self.root, id);
        let relative = || {
            let root = self.doc.qualified_name(self.root);
            self.doc.lookup(&format!("{root}.{name}"))
        };
        self.doc
            .lookup(name)
            .filter(|&id| in_record(id))
            .or_else(relative)
            .ok_or_else(|| DataError::UnknownField {
                name: name.to_string(),
            })
    }

    /// Data attributes of a scalar field.
    fn scalar(&self, node: NodeId) -> Result<&DataAttrs, DataError> {
        let n = self.doc.node(node);
        match n.data() {
            Some(data) if !n.is_container() => Ok(data),
            _ => Err(DataError::StructValueAccess {
                field: self.doc.name_for_exception(node),
            }),
        }
    }

    fn resolve_attr(
        &mut self,
        node: NodeId,
        which: Attr,
        dims: &Dimensions,
    ) -> Result<Option<i64>, DataError> {
        let doc = Arc::clone(&self.doc);
        let n = doc.node(node);
        let unset = IntAttr::Unset;
        let (attr, link) = match which {
            Attr::Count => (n.count(), n.links().count),
            Attr::Offset => (n.offset(), n.links().offset),
            Attr::Length => (n.data().map_or(&unset, |d| &d.length), n.links().length),
        };
        resolve_integer(&doc, self, node, attr, link, dims)
    }

    /// Resolved repetition count of `node`, addressed by the indices of its
    /// enclosing arrays.
    fn resolved_count(&mut self, node: NodeId, dims: &Dimensions) -> Result<u32, DataError> {
        let count = self.resolve_attr(node, Attr::Count, dims)?.unwrap_or(1);
        u32::try_from(count)
            .ok()
            .filter(|&c| c <= self.config.max_count)
            .ok_or_else(|| DataError::BadCount {
                field: self.doc.name_for_exception(node),
                count,
            })
    }

    fn geometry(&mut self, node: NodeId, dims: &Dimensions) -> Result<Geometry, DataError> {
        let data = self.scalar(node)?.clone();
        let length = match self.resolve_attr(node, Attr::Length, dims)? {
            Some(length) => length,
            None => data.kind.default_length().unwrap_or(0),
        };
        let field = || self.doc.name_for_exception(node);
        let bad_length = |length: i64| DataError::BadLength {
            field: field(),
            length,
        };
        let fixed_ok = match data.kind {
            DataKind::Binary => matches!(length, 2 | 4 | 8),
            DataKind::Float => matches!(length, 4 | 8),
            _ => length >= 0,
        };
        if !fixed_ok {
            return Err(bad_length(length));
        }
        let units = if data.kind == DataKind::Character && data.char_type == CharType::TwoByte {
            length.saturating_mul(2)
        } else {
            length
        };
        let units = u32::try_from(units).map_err(|_| bad_length(length))?;
        let bytes = byte_length(data.kind, units);
        if bytes > self.config.max_field_length {
            return Err(DataError::FieldTooLarge {
                field: field(),
                length,
                bytes,
                max: self.config.max_field_length,
            });
        }
        Ok(Geometry {
            kind: data.kind,
            length: units,
            byte_length: bytes,
            precision: data.effective_precision(length),
            encoding: data.encoding.unwrap_or(self.config.default_encoding),
            ordering: self.orderings.get(&node).copied().unwrap_or(data.ordering),
        })
    }

    /// The cache of `node` at `dims`, redimensioning enclosing array levels
    /// whose resolved count changed.
    fn cache_mut(&mut self, node: NodeId, dims: &Dimensions) -> Result<&mut ValueCache, DataError> {
        let path = self.doc.array_path(node);
        if dims.len() != path.len() {
            return Err(DataError::WrongDimensions {
                field: self.doc.name_for_exception(node),
                expected: path.len(),
                actual: dims.len(),
            });
        }
        let mut sizes = Vec::with_capacity(path.len());
        let mut counted = Vec::with_capacity(path.len());
        for (level, &array) in path.iter().enumerate() {
            let outer = dims.prefix(level);
            sizes.push(self.resolved_count(array, &outer)?);
            counted.push(self.count_written(array, &outer));
        }

        let doc = &self.doc;
        let make = |level: usize| match sizes.get(level) {
            Some(&size) => Entry::Array(ArrayStore::new(size)),
            None => Entry::Cache(ValueCache::new()),
        };
        let mut entry = self.stores[node.index()].get_or_insert_with(|| make(0));
        for (level, &size) in sizes.iter().enumerate() {
            let Entry::Array(store) = entry else {
                break;
            };
            if store.len() != size || store.resized_at() < counted[level] {
                trace!(
                    field = %doc.name_for_exception(node),
                    level,
                    size,
                    dropped = store.populated(),
                    "redimension"
                );
                store.redimension(size);
            }
            let index = dims.at(level).unwrap_or(0);
            entry = store
                .get_or_insert_with(index, || make(level + 1))
                .ok_or_else(|| DataError::IndexOutOfBounds {
                    field: doc.name_for_exception(node),
                    index,
                    size,
                })?;
        }
        match entry {
            Entry::Cache(cache) => Ok(cache),
            Entry::Array(_) => Err(InternalError::StorageShape {
                field: doc.name_for_exception(node),
                depth: sizes.len(),
            }
            .into()),
        }
    }

    /// Tick of the last write to the field `array`'s count refers to, or
    /// [`Tick::ZERO`] for a literal or unset count.
    fn count_written(&self, array: NodeId, outer: &Dimensions) -> Tick {
        let Some(target) = self.doc.node(array).links().count else {
            return Tick::ZERO;
        };
        let target_dims = outer.prefix(self.doc.array_path(target).len());
        let mut entry = self.stores[target.index()].as_ref();
        for &index in target_dims.as_slice() {
            entry = match entry {
                Some(Entry::Array(store)) => store.get(index),
                _ => None,
            };
        }
        match entry {
            Some(Entry::Cache(cache)) => cache.updated(),
            _ => Tick::ZERO,
        }
    }

    fn value_at(&mut self, node: NodeId, dims: &Dimensions) -> Result<Option<Value>, DataError> {
        let data = self.scalar(node)?.clone();
        let cache = self.cache_mut(node, dims)?;
        if let Some(value) = cache.value() {
            return Ok(Some(value.clone()));
        }
        if cache.needs_decode() {
            let bytes = cache.bytes().map(<[u8]>::to_vec).unwrap_or_default();
            let geometry = self.geometry(node, dims)?;
            let codec = self
                .codecs
                .codec(&geometry.signature())
                .map_err(|e| self.codec_error(node, e))?;
            let value = match codec.decode(&bytes, geometry.ordering) {
                Ok(Value::Text(text)) if data.kind == DataKind::Character => {
                    Value::Text(data.trim.apply(&text))
                }
                Ok(value) => value,
                Err(e) => return Err(self.codec_error(node, e)),
            };
            trace!(field = %self.doc.name_for_exception(node), %dims, "decoded");
            self.cache_mut(node, dims)?.reconcile_value(value.clone());
            return Ok(Some(value));
        }
        match data.init {
            Some(init) => {
                self.store_value(node, dims, Value::Text(init))?;
                Ok(self.cache_mut(node, dims)?.value().cloned())
            }
            None => Ok(None),
        }
    }

    fn store_value(
        &mut self,
        node: NodeId,
        dims: &Dimensions,
        value: Value,
    ) -> Result<(), DataError> {
        let kind = self.scalar(node)?.kind;
        let shape = if kind.is_textual() {
            Shape {
                kind,
                length: 0,
                precision: 0,
            }
        } else {
            self.geometry(node, dims)?.shape()
        };
        let value = coerce(&self.doc.name_for_exception(node), shape, value)?;
        self.cache_mut(node, dims)?.set_value(value);
        Ok(())
    }

    /// Bytes to write for `node` at `dims`, encoding the value if needed.
    fn encoded(
        &mut self,
        node: NodeId,
        dims: &Dimensions,
        geometry: &Geometry,
    ) -> Result<Vec<u8>, DataError> {
        let cache = self.cache_mut(node, dims)?;
        let state = cache.state();
        if let Some(bytes) = cache.bytes().map(<[u8]>::to_vec) {
            if bytes.len() == geometry.byte_length {
                return Ok(bytes);
            }
            // raw bytes of the wrong size have no value to re-encode from
            if state == CacheState::Bytes {
                return Err(DataError::CodecLength {
                    field: self.doc.name_for_exception(node),
                    expected: geometry.byte_length,
                    actual: bytes.len(),
                });
            }
        }
        let value = self
            .value_at(node, dims)?
            .ok_or_else(|| DataError::NullValue {
                field: self.doc.name_for_exception(node),
            })?;
        let codec = self
            .codecs
            .codec(&geometry.signature())
            .map_err(|e| self.codec_error(node, e))?;
        let bytes = codec
            .encode(&value, geometry.ordering)
            .map_err(|e| self.codec_error(node, e))?;
        if bytes.len() != geometry.byte_length {
            return Err(DataError::CodecLength {
                field: self.doc.name_for_exception(node),
                expected: geometry.byte_length,
                actual: bytes.len(),
            });
        }
        self.cache_mut(node, dims)?.reconcile_bytes(bytes.clone());
        Ok(bytes)
    }

    fn codec_error(&self, node: NodeId, e: reclay_core::CodecError) -> DataError {
        DataError::Codec {
            field: self.doc.name_for_exception(node),
            detail: e.detail,
        }
    }

    // ── Traversal ──────────────────────────────────────────────────

    fn walk(
        &mut self,
        node: NodeId,
        dims: &mut Dimensions,
        t: &mut Traversal<'_>,
    ) -> Result<(), DataError> {
        if !self.doc.node(node).is_array() {
            return self.walk_instance(node, dims, t);
        }
        let count = self.resolved_count(node, dims)?;
        for index in 0..count {
            dims.push(index);
            let result = self.walk_instance(node, dims, t);
            dims.pop();
            result?;
        }
        Ok(())
    }

    fn walk_instance(
        &mut self,
        node: NodeId,
        dims: &mut Dimensions,
        t: &mut Traversal<'_>,
    ) -> Result<(), DataError> {
        let doc = Arc::clone(&self.doc);
        let n = doc.node(node);
        let sequential = t.cursor.pos;
        let explicit = self.explicit_position(node, dims, t)?;
        if let Some(target) = explicit {
            t.cursor.pos = target;
        }

        match n.kind() {
            NodeKind::Struct | NodeKind::Data if n.is_container() => {
                t.cursor.enter(node);
                for &child in doc.children(node) {
                    self.walk(child, dims, t)?;
                }
                t.cursor.leave();
            }
            NodeKind::Data => self.walk_scalar(node, dims, t)?,
            other => {
                return Err(InternalError::UnrecognizedNodeKind {
                    node: doc.name_for_exception(node),
                    kind: other.to_string(),
                }
                .into())
            }
        }

        if explicit.is_some() {
            t.cursor.pos = t.cursor.pos.max(sequential);
        }
        Ok(())
    }

    fn explicit_position(
        &mut self,
        node: NodeId,
        dims: &Dimensions,
        t: &Traversal<'_>,
    ) -> Result<Option<usize>, DataError> {
        let Some(offset) = self.resolve_attr(node, Attr::Offset, dims)? else {
            return Ok(None);
        };
        let doc = Arc::clone(&self.doc);
        let n = doc.node(node);
        let base = match n.offsetfrom() {
            OffsetFrom::Parent => Base::Parent(t.cursor.parent_start()),
            OffsetFrom::Literal(v) => Base::Literal(*v),
            OffsetFrom::Anchor(name) => {
                let start = n
                    .links()
                    .anchor
                    .and_then(|anchor| t.cursor.start_of(anchor))
                    .ok_or_else(|| DataError::UnresolvedReference {
                        field: doc.name_for_exception(node),
                        reference: name.clone(),
                    })?;
                Base::Anchor {
                    name: name.clone(),
                    start,
                }
            }
        };
        let field = doc.name_for_exception(node);
        explicit_target(&field, offset, &base, t.limit(), t.extent()).map(Some)
    }

    fn walk_scalar(
        &mut self,
        node: NodeId,
        dims: &Dimensions,
        t: &mut Traversal<'_>,
    ) -> Result<(), DataError> {
        let geometry = self.geometry(node, dims)?;
        let pos = t.cursor.pos;
        let len = geometry.byte_length;
        let usage = self.doc.effective_usage(node);
        trace!(field = %self.doc.name_for_exception(node), %dims, pos, len, "scalar");

        if !matches!(t.pass, Pass::Parse(_)) && pos + len > self.config.max_record_length {
            return Err(DataError::RecordTooLarge {
                length: pos + len,
                max: self.config.max_record_length,
            });
        }
        match &mut t.pass {
            Pass::Parse(bytes) => {
                let bytes = *bytes;
                let available = bytes.len().saturating_sub(pos);
                if len > available {
                    return Err(DataError::NotEnoughData {
                        field: self.doc.name_for_exception(node),
                        needed: len,
                        available,
                    });
                }
                if usage.is_output() {
                    self.cache_mut(node, dims)?.set_bytes(&bytes[pos..pos + len]);
                }
            }
            Pass::Serialize(out) => {
                let encoded = if usage.is_input() {
                    self.encoded(node, dims, &geometry)?
                } else {
                    vec![0; len]
                };
                if out.len() < pos + len {
                    out.resize(pos + len, 0);
                }
                out[pos..pos + len].copy_from_slice(&encoded);
            }
            Pass::Measure => {}
        }
        t.cursor.advance(len);
        Ok(())
    }
}

impl ValueLookup for Record {
    fn current_value(
        &mut self,
        node: NodeId,
        dims: &Dimensions,
    ) -> Result<Option<Value>, DataError> {
        self.value_at(node, dims)
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("root", &self.doc.name_for_exception(self.root))
            .field("touched", &self.stores.iter().filter(|s| s.is_some()).count())
            .finish()
    }
}
