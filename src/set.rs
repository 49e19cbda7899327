//! A branch-versioned hash set.

use std::collections::HashSet;
use std::hash::Hash;

use crate::strategy::SetUnion;
use crate::versioned::Versioned;

/// A set whose contents are versioned per branch.
///
/// Every branch inserts into its own snapshot from the fork point; at
/// join, the result is the union of both sides ([`SetUnion`]), each
/// element exactly once.
///
/// Cloning shares the same logical set; a detached copy is
/// [`snapshot`](Self::snapshot) plus [`From`].
///
/// # Example
///
/// ```
/// use revmem::{fork, VsSet};
///
/// let s: VsSet<i32> = [0, 1, 2].into_iter().collect();
/// let branch = {
///     let s = s.clone();
///     fork(move || {
///         s.insert(4);
///     })
/// };
/// s.insert(5);
/// branch.join();
/// assert_eq!(s.snapshot(), [0, 1, 2, 4, 5].into_iter().collect());
/// ```
pub struct VsSet<T> {
    inner: Versioned<HashSet<T>, SetUnion>,
}

impl<T> Clone for VsSet<T> {
    fn clone(&self) -> Self {
        VsSet {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Eq + Hash + Send + 'static> VsSet<T> {
    /// Create an empty set on the calling thread's branch.
    #[must_use]
    pub fn new() -> Self {
        VsSet {
            inner: Versioned::with_strategy(HashSet::new(), SetUnion),
        }
    }

    /// Insert an element into this branch's view.
    ///
    /// Returns `true` if the element was not already visible here.
    pub fn insert(&self, value: T) -> bool {
        self.inner.update(|set| set.insert(value))
    }

    /// Whether this branch's view contains `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.read(|set| set.contains(value))
    }

    /// Number of elements visible on this branch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read(HashSet::len)
    }

    /// Whether the set is empty on this branch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read(HashSet::is_empty)
    }

    /// A detached copy of this branch's view.
    #[must_use]
    pub fn snapshot(&self) -> HashSet<T> {
        self.inner.get()
    }
}

impl<T: Clone + Eq + Hash + Send + 'static> Default for VsSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash + Send + 'static> From<HashSet<T>> for VsSet<T> {
    fn from(set: HashSet<T>) -> Self {
        VsSet {
            inner: Versioned::with_strategy(set, SetUnion),
        }
    }
}

impl<T: Clone + Eq + Hash + Send + 'static> FromIterator<T> for VsSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<HashSet<T>>())
    }
}

impl<T: Clone + Eq + Hash + Send + 'static> IntoIterator for VsSet<T> {
    type Item = T;
    type IntoIter = std::collections::hash_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshot().into_iter()
    }
}

impl<T: Clone + Eq + Hash + Send + std::fmt::Debug + 'static> std::fmt::Debug for VsSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_get() {
            Ok(set) => f.debug_set().entries(set.iter()).finish(),
            Err(_) => f.write_str("VsSet(<unseeded branch>)"),
        }
    }
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for VsSet<T>
where
    T: Clone + Eq + Hash + Send + serde::Serialize + 'static,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for VsSet<T>
where
    T: Clone + Eq + Hash + Send + serde::Deserialize<'de> + 'static,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HashSet::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork;

    #[test]
    fn insert_and_contains() {
        let s = VsSet::new();
        assert!(s.insert("a"));
        assert!(!s.insert("a"));
        assert!(s.contains(&"a"));
        assert!(!s.contains(&"b"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn join_is_the_union() {
        let s: VsSet<i32> = [0, 1, 2, 3].into_iter().collect();
        let branch = {
            let s = s.clone();
            fork(move || {
                assert!(s.insert(4));
            })
        };
        assert!(s.insert(5));
        assert_eq!(s.snapshot(), [0, 1, 2, 3, 5].into_iter().collect());

        branch.join();
        assert_eq!(s.snapshot(), [0, 1, 2, 3, 4, 5].into_iter().collect());
    }

    #[test]
    fn same_insert_on_both_sides_appears_once() {
        let s: VsSet<i32> = VsSet::new();
        let branch = {
            let s = s.clone();
            fork(move || {
                s.insert(7);
            })
        };
        s.insert(7);
        branch.join();
        assert_eq!(s.len(), 1);
        assert!(s.contains(&7));
    }
}
