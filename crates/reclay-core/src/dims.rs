//! Array positions within nested repeated fields.

use smallvec::SmallVec;
use std::fmt;

/// An ordered sequence of 0-based indices, one per enclosing repeated node.
///
/// Index `i` selects an element of the `i`-th array on the path from the
/// record root down to a field. Uses `SmallVec<[u32; 4]>` so typical nesting
/// depths never allocate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimensions(SmallVec<[u32; 4]>);

impl Dimensions {
    /// The empty position (a field with no repeated ancestors).
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no indices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index at nesting level `level`, if present.
    pub fn at(&self, level: usize) -> Option<u32> {
        self.0.get(level).copied()
    }

    /// Append an innermost index.
    pub fn push(&mut self, index: u32) {
        self.0.push(index);
    }

    /// Remove and return the innermost index.
    pub fn pop(&mut self) -> Option<u32> {
        self.0.pop()
    }

    /// The first `len` indices (or all of them if shorter).
    pub fn prefix(&self, len: usize) -> Dimensions {
        Self(self.0.iter().take(len).copied().collect())
    }

    /// All indices as a slice.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl From<&[u32]> for Dimensions {
    fn from(indices: &[u32]) -> Self {
        Self(indices.iter().copied().collect())
    }
}

impl<const N: usize> From<[u32; N]> for Dimensions {
    fn from(indices: [u32; N]) -> Self {
        Self(indices.into_iter().collect())
    }
}

impl FromIterator<u32> for Dimensions {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_and_prefix() {
        let mut d = Dimensions::new();
        d.push(3);
        d.push(1);
        d.push(4);
        assert_eq!(d.len(), 3);
        assert_eq!(d.prefix(2).as_slice(), &[3, 1]);
        assert_eq!(d.prefix(9).as_slice(), &[3, 1, 4]);
        assert_eq!(d.pop(), Some(4));
        assert_eq!(d.at(1), Some(1));
        assert_eq!(d.at(2), None);
    }

    #[test]
    fn display_lists_indices() {
        assert_eq!(Dimensions::from([0, 12]).to_string(), "[0,12]");
        assert_eq!(Dimensions::new().to_string(), "[]");
    }
}
