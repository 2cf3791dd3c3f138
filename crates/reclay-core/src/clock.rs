//! The process-wide correlation clock.
//!
//! Every mutation of a field's native value or wire bytes is stamped with a
//! [`Tick`]. Comparing the ticks of the two representations decides which one
//! is authoritative.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter backing [`Tick::next`]. Zero is reserved for "never written".
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A stamp from the correlation clock.
///
/// Ticks are totally ordered and strictly increasing across the whole
/// process: two calls to [`Tick::next`] never return the same value, even
/// from different threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tick(u64);

impl Tick {
    /// The tick older than every tick returned by [`Tick::next`].
    pub const ZERO: Tick = Tick(0);

    /// Draw the next tick from the clock. Thread-safe.
    pub fn next() -> Self {
        Self(CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn next_is_newer_than_zero() {
        assert!(Tick::next() > Tick::ZERO);
    }

    #[test]
    fn ticks_are_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..1000).map(|_| Tick::next()).collect::<Vec<_>>()))
            .collect();
        let mut all: Vec<Tick> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    proptest! {
        #[test]
        fn successive_ticks_strictly_increase(n in 1usize..200) {
            let mut prev = Tick::next();
            for _ in 0..n {
                let t = Tick::next();
                prop_assert!(t > prev);
                prev = t;
            }
        }
    }
}
