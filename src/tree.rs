//! A branch-versioned ordered set.

use std::collections::BTreeSet;

use crate::strategy::SetUnion;
use crate::versioned::Versioned;

/// An ordered set whose contents are versioned per branch.
///
/// Same merge behavior as [`VsSet`](crate::VsSet) — join yields the union
/// ([`SetUnion`]) — but elements are kept in ascending order, with
/// [`first`](Self::first)/[`last`](Self::last) lookups and an ordered
/// [`snapshot`](Self::snapshot).
///
/// # Example
///
/// ```
/// use revmem::VsTree;
///
/// let t: VsTree<i32> = [3, 1, 2].into_iter().collect();
/// assert_eq!(t.first(), Some(1));
/// assert_eq!(t.last(), Some(3));
/// assert_eq!(t.snapshot().into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
pub struct VsTree<T> {
    inner: Versioned<BTreeSet<T>, SetUnion>,
}

impl<T> Clone for VsTree<T> {
    fn clone(&self) -> Self {
        VsTree {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Ord + Send + 'static> VsTree<T> {
    /// Create an empty tree on the calling thread's branch.
    #[must_use]
    pub fn new() -> Self {
        VsTree {
            inner: Versioned::with_strategy(BTreeSet::new(), SetUnion),
        }
    }

    /// Insert an element into this branch's view.
    ///
    /// Returns `true` if the element was not already visible here.
    pub fn insert(&self, value: T) -> bool {
        self.inner.update(|tree| tree.insert(value))
    }

    /// Whether this branch's view contains `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.read(|tree| tree.contains(value))
    }

    /// The smallest element, cloned out.
    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.inner.read(|tree| tree.first().cloned())
    }

    /// The largest element, cloned out.
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.inner.read(|tree| tree.last().cloned())
    }

    /// Number of elements visible on this branch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read(BTreeSet::len)
    }

    /// Whether the tree is empty on this branch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read(BTreeSet::is_empty)
    }

    /// A detached copy of this branch's view, in ascending order.
    #[must_use]
    pub fn snapshot(&self) -> BTreeSet<T> {
        self.inner.get()
    }
}

impl<T: Clone + Ord + Send + 'static> Default for VsTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Ord + Send + 'static> From<BTreeSet<T>> for VsTree<T> {
    fn from(tree: BTreeSet<T>) -> Self {
        VsTree {
            inner: Versioned::with_strategy(tree, SetUnion),
        }
    }
}

impl<T: Clone + Ord + Send + 'static> FromIterator<T> for VsTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeSet<T>>())
    }
}

impl<T: Clone + Ord + Send + 'static> IntoIterator for VsTree<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshot().into_iter()
    }
}

impl<T: Clone + Ord + Send + std::fmt::Debug + 'static> std::fmt::Debug for VsTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_get() {
            Ok(tree) => f.debug_set().entries(tree.iter()).finish(),
            Err(_) => f.write_str("VsTree(<unseeded branch>)"),
        }
    }
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for VsTree<T>
where
    T: Clone + Ord + Send + serde::Serialize + 'static,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for VsTree<T>
where
    T: Clone + Ord + Send + serde::Deserialize<'de> + 'static,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeSet::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork;

    #[test]
    fn keeps_elements_ordered() {
        let t = VsTree::new();
        assert!(t.insert(3));
        assert!(t.insert(1));
        assert!(t.insert(2));
        assert!(!t.insert(2));
        assert_eq!(t.first(), Some(1));
        assert_eq!(t.last(), Some(3));
        assert_eq!(t.snapshot().into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn branch_insert_merges_into_order() {
        let t: VsTree<i32> = [10, 30].into_iter().collect();
        let branch = {
            let t = t.clone();
            fork(move || {
                t.insert(20);
            })
        };
        t.insert(40);
        branch.join();
        assert_eq!(
            t.snapshot().into_iter().collect::<Vec<_>>(),
            vec![10, 20, 30, 40]
        );
    }
}
