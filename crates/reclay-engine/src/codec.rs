//! Codec registry: one shared codec instance per signature.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use reclay_core::{
    Codec, CodecError, CodecFactory, CodecSignature, DataKind, TextOrdering, Value,
};

/// A codec instance that may be used from several records.
///
/// Calls are serialized through the instance's own lock.
#[derive(Clone)]
pub struct SharedCodec {
    inner: Arc<Mutex<Box<dyn Codec>>>,
}

impl SharedCodec {
    fn new(codec: Box<dyn Codec>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(codec)),
        }
    }

    /// Encode `value`.
    pub fn encode(&self, value: &Value, ordering: TextOrdering) -> Result<Vec<u8>, CodecError> {
        self.inner.lock().encode(value, ordering)
    }

    /// Decode `bytes`.
    pub fn decode(&self, bytes: &[u8], ordering: TextOrdering) -> Result<Value, CodecError> {
        self.inner.lock().decode(bytes, ordering)
    }

    /// Whether both handles refer to the same instance.
    pub fn same_instance(&self, other: &SharedCodec) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCodec").finish_non_exhaustive()
    }
}

/// Hands out codecs, creating each signature's instance once.
///
/// Character codecs for an encoding other than the default are created per
/// request and never shared.
pub struct CodecRegistry {
    factory: Arc<dyn CodecFactory>,
    default_encoding: u32,
    shared: Mutex<HashMap<CodecSignature, SharedCodec>>,
}

impl CodecRegistry {
    /// A registry over `factory`.
    pub fn new(factory: Arc<dyn CodecFactory>, default_encoding: u32) -> Self {
        Self {
            factory,
            default_encoding,
            shared: Mutex::new(HashMap::new()),
        }
    }

    /// The codec for `signature`.
    pub fn codec(&self, signature: &CodecSignature) -> Result<SharedCodec, CodecError> {
        if !self.is_shareable(signature) {
            trace!(?signature, "creating private codec");
            return self.factory.create(signature).map(SharedCodec::new);
        }
        let mut shared = self.shared.lock();
        if let Some(codec) = shared.get(signature) {
            return Ok(codec.clone());
        }
        trace!(?signature, "creating shared codec");
        let codec = SharedCodec::new(self.factory.create(signature)?);
        shared.insert(*signature, codec.clone());
        Ok(codec)
    }

    /// Number of shared instances created so far.
    pub fn shared_count(&self) -> usize {
        self.shared.lock().len()
    }

    fn is_shareable(&self, signature: &CodecSignature) -> bool {
        signature.kind != DataKind::Character || signature.encoding == self.default_encoding
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("default_encoding", &self.default_encoding)
            .field("shared", &self.shared_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    impl Codec for Echo {
        fn encode(&mut self, value: &Value, _: TextOrdering) -> Result<Vec<u8>, CodecError> {
            Ok(value.to_string().into_bytes())
        }

        fn decode(&mut self, bytes: &[u8], _: TextOrdering) -> Result<Value, CodecError> {
            Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl CodecFactory for Counting {
        fn create(&self, _: &CodecSignature) -> Result<Box<dyn Codec>, CodecError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(Box::new(Echo))
        }
    }

    fn sig(kind: DataKind, encoding: u32) -> CodecSignature {
        CodecSignature {
            kind,
            length: 4,
            precision: 0,
            encoding,
        }
    }

    #[test]
    fn equal_signatures_share_one_instance() {
        let factory = Arc::new(Counting::default());
        let registry = CodecRegistry::new(factory.clone(), 37);
        let a = registry.codec(&sig(DataKind::Binary, 37)).unwrap();
        let b = registry.codec(&sig(DataKind::Binary, 37)).unwrap();
        assert!(a.same_instance(&b));
        assert_eq!(factory.0.load(Ordering::Relaxed), 1);
        assert_eq!(registry.shared_count(), 1);
    }

    #[test]
    fn non_default_character_encoding_is_private() {
        let factory = Arc::new(Counting::default());
        let registry = CodecRegistry::new(factory.clone(), 37);
        let a = registry.codec(&sig(DataKind::Character, 1200)).unwrap();
        let b = registry.codec(&sig(DataKind::Character, 1200)).unwrap();
        assert!(!a.same_instance(&b));
        assert_eq!(registry.shared_count(), 0);

        let c = registry.codec(&sig(DataKind::Character, 37)).unwrap();
        let d = registry.codec(&sig(DataKind::Character, 37)).unwrap();
        assert!(c.same_instance(&d));
        assert_eq!(c.encode(&Value::from("x"), TextOrdering::Default).unwrap(), b"x");
    }
}
