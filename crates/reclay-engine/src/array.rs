//! Resizable, lazily populated storage for repeated fields.

use reclay_core::Tick;

use crate::cache::ValueCache;

/// One element of an [`ArrayStore`], or the storage of a whole field.
#[derive(Clone, Debug)]
pub enum Entry {
    /// A scalar position.
    Cache(ValueCache),
    /// A nested repetition level.
    Array(ArrayStore),
}

impl Entry {
    /// Apply `f` to every cache reachable from this entry.
    pub fn for_each_cache(&mut self, f: &mut impl FnMut(&mut ValueCache)) {
        match self {
            Self::Cache(cache) => f(cache),
            Self::Array(store) => {
                for entry in store.entries.iter_mut().flatten() {
                    entry.for_each_cache(f);
                }
            }
        }
    }
}

/// Elements of one repetition level.
///
/// The size equals the repeated node's resolved count as of the last
/// [`redimension`](Self::redimension). Elements are created on first touch.
#[derive(Clone, Debug)]
pub struct ArrayStore {
    entries: Vec<Option<Entry>>,
    resized: Tick,
}

impl ArrayStore {
    /// A store of `size` untouched elements.
    pub fn new(size: u32) -> Self {
        Self {
            entries: vec_of_none(size),
            resized: Tick::next(),
        }
    }

    /// Current size.
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Whether the size is zero.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tick of the last resize.
    pub fn resized_at(&self) -> Tick {
        self.resized
    }

    /// Resize to `size`. Every element is invalidated, including the ones
    /// whose index survives.
    pub fn redimension(&mut self, size: u32) {
        self.entries = vec_of_none(size);
        self.resized = Tick::next();
    }

    /// Element `index`, if it is in range and has been touched.
    pub fn get(&self, index: u32) -> Option<&Entry> {
        self.entries.get(index as usize).and_then(Option::as_ref)
    }

    /// Element `index`, created with `make` on first touch. `None` when out
    /// of range.
    pub fn get_or_insert_with(
        &mut self,
        index: u32,
        make: impl FnOnce() -> Entry,
    ) -> Option<&mut Entry> {
        self.entries
            .get_mut(index as usize)
            .map(|slot| slot.get_or_insert_with(make))
    }

    /// Number of touched elements.
    pub fn populated(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

fn vec_of_none(size: u32) -> Vec<Option<Entry>> {
    std::iter::repeat_with(|| None).take(size as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reclay_core::Value;

    fn touch(store: &mut ArrayStore, index: u32, v: i16) {
        let Some(Entry::Cache(cache)) =
            store.get_or_insert_with(index, || Entry::Cache(ValueCache::new()))
        else {
            panic!("index {index} out of range");
        };
        cache.set_value(Value::Short(v));
    }

    #[test]
    fn elements_are_created_lazily() {
        let mut store = ArrayStore::new(3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.populated(), 0);
        touch(&mut store, 1, 5);
        assert_eq!(store.populated(), 1);
        assert!(store.get(0).is_none());
        assert!(store.get(1).is_some());
    }

    #[test]
    fn out_of_range_is_none() {
        let mut store = ArrayStore::new(2);
        assert!(store
            .get_or_insert_with(2, || Entry::Cache(ValueCache::new()))
            .is_none());
    }

    #[test]
    fn nested_caches_are_visited() {
        let mut inner = ArrayStore::new(2);
        touch(&mut inner, 0, 1);
        touch(&mut inner, 1, 2);
        let mut entry = Entry::Array(inner);
        let mut seen = 0;
        entry.for_each_cache(&mut |_| seen += 1);
        assert_eq!(seen, 2);
    }

    proptest! {
        #[test]
        fn redimension_invalidates_every_element(size in 1u32..16, new_size in 0u32..16) {
            let mut store = ArrayStore::new(size);
            for i in 0..size {
                touch(&mut store, i, i as i16);
            }
            let before = store.resized_at();
            store.redimension(new_size);
            prop_assert_eq!(store.len(), new_size);
            prop_assert_eq!(store.populated(), 0);
            prop_assert!(store.resized_at() > before);
        }
    }
}
