//! Per-position store reconciling a native value with its wire bytes.
//!
//! A cache holds at most one authoritative representation, or a consistent
//! pair. Writes move it to the written representation with a fresh
//! [`Tick`]; conversions in either direction move it to [`CacheState::Both`]
//! without advancing the tick of the side that was already there, and
//! without advancing [`ValueCache::updated`].

use reclay_core::{Tick, Value};

/// Which representations a [`ValueCache`] currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing written since creation or the last reset.
    Empty,
    /// Only a native value.
    Value,
    /// Only wire bytes.
    Bytes,
    /// A native value and the bytes it encodes to, in agreement.
    Both,
}

#[derive(Clone, Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Value {
        value: Value,
        at: Tick,
    },
    Bytes {
        bytes: Vec<u8>,
        at: Tick,
    },
    Both {
        value: Value,
        value_at: Tick,
        bytes: Vec<u8>,
        bytes_at: Tick,
    },
}

/// Native value and/or wire bytes of one scalar position.
#[derive(Clone, Debug)]
pub struct ValueCache {
    slot: Slot,
    written: Tick,
}

impl Default for ValueCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            slot: Slot::Empty,
            written: Tick::ZERO,
        }
    }

    /// Current state.
    pub fn state(&self) -> CacheState {
        match self.slot {
            Slot::Empty => CacheState::Empty,
            Slot::Value { .. } => CacheState::Value,
            Slot::Bytes { .. } => CacheState::Bytes,
            Slot::Both { .. } => CacheState::Both,
        }
    }

    /// Store a native value, discarding any bytes.
    pub fn set_value(&mut self, value: Value) {
        let at = Tick::next();
        self.slot = Slot::Value { value, at };
        self.written = at;
    }

    /// Store a private copy of `bytes`, discarding any native value.
    pub fn set_bytes(&mut self, bytes: &[u8]) {
        let at = Tick::next();
        self.slot = Slot::Bytes {
            bytes: bytes.to_vec(),
            at,
        };
        self.written = at;
    }

    /// The native value, if one is held.
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Value { value, .. } | Slot::Both { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The wire bytes, if held.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.slot {
            Slot::Bytes { bytes, .. } | Slot::Both { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// Whether the bytes are newer than any native value, so reading the
    /// value requires a decode.
    pub fn needs_decode(&self) -> bool {
        matches!(self.slot, Slot::Bytes { .. })
    }

    /// Record the value decoded from the held bytes.
    ///
    /// Only meaningful in [`CacheState::Bytes`]; otherwise the value simply
    /// replaces the cache contents.
    pub fn reconcile_value(&mut self, value: Value) {
        self.slot = match std::mem::take(&mut self.slot) {
            Slot::Bytes { bytes, at } => Slot::Both {
                value,
                value_at: Tick::next(),
                bytes,
                bytes_at: at,
            },
            _ => {
                let at = Tick::next();
                self.written = at;
                Slot::Value { value, at }
            }
        };
    }

    /// Record the bytes encoded from the held value.
    ///
    /// Only meaningful in [`CacheState::Value`] or [`CacheState::Both`];
    /// otherwise the bytes simply replace the cache contents.
    pub fn reconcile_bytes(&mut self, bytes: Vec<u8>) {
        self.slot = match std::mem::take(&mut self.slot) {
            Slot::Value { value, at } | Slot::Both { value, value_at: at, .. } => Slot::Both {
                value,
                value_at: at,
                bytes,
                bytes_at: Tick::next(),
            },
            _ => {
                let at = Tick::next();
                self.written = at;
                Slot::Bytes { bytes, at }
            }
        };
    }

    /// Drop a native value that was derived from held bytes.
    ///
    /// A value with no bytes behind it is kept: it is the only copy.
    pub fn invalidate_value(&mut self) {
        self.slot = match std::mem::take(&mut self.slot) {
            Slot::Both {
                bytes, bytes_at, ..
            } => Slot::Bytes {
                bytes,
                at: bytes_at,
            },
            other => other,
        };
    }

    /// Tick of the most recent write to either representation.
    ///
    /// Decoding or encoding the held representation is not a write.
    pub fn updated(&self) -> Tick {
        self.written
    }
}
