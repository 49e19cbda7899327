//! Merge strategies: how two divergent writes of the same variable
//! combine when a branch is joined.
//!
//! A strategy is stateless policy, chosen when the [`Versioned`]
//! variable is constructed and fixed for its lifetime. Strategies must be
//! total: a merge either succeeds deterministically or the program state
//! is inconsistent, so there is no fallible variant.
//!
//! [`Versioned`]: crate::Versioned

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;

/// Policy for combining a joined branch's value into the surviving one.
///
/// `dst` is the surviving (joining) branch's value, `src` the joined
/// branch's; after `merge` returns, `dst` is the reconciled result.
pub trait MergeStrategy<T>: Send + Sync + 'static {
    /// Combine all of `src` into `dst`.
    fn merge(&self, dst: &mut T, src: &T);
}

/// Element-level resolution for keyed collections.
///
/// Collection strategies distinguish "new key" from "key present on both
/// sides" using the collection's own lookup; keys present on both sides
/// are handed to [`merge_same_element`](Self::merge_same_element).
pub trait ElementStrategy<T, E>: MergeStrategy<T> {
    /// Resolve a single key present in both collections.
    fn merge_same_element(&self, dst: &mut T, ours: &E, theirs: &E);
}

/// Last writer wins: the joined branch's value replaces the surviving
/// one. The default for scalar-like values.
///
/// # Example
///
/// ```
/// use revmem::{Overwrite, Revision, Versioned};
///
/// let x: Versioned<i32, Overwrite> = Versioned::new(0);
/// let main = Revision::current_thread();
/// let child = main.fork();
/// x.set_in(&child, 1);
/// x.set(11);
/// main.join(child);
/// assert_eq!(x.get(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overwrite;

impl<T: Clone + Send + 'static> MergeStrategy<T> for Overwrite {
    fn merge(&self, dst: &mut T, src: &T) {
        *dst = src.clone();
    }
}

/// Set union: elements the joined branch added appear exactly once in the
/// result. An element present on both sides resolves to a no-op (the
/// sides agree on it by definition of a set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetUnion;

impl<T> MergeStrategy<HashSet<T>> for SetUnion
where
    T: Clone + Eq + Hash + Send + 'static,
{
    fn merge(&self, dst: &mut HashSet<T>, src: &HashSet<T>) {
        for elem in src {
            if dst.contains(elem) {
                self.merge_same_element(dst, elem, elem);
            } else {
                dst.insert(elem.clone());
            }
        }
    }
}

impl<T> ElementStrategy<HashSet<T>, T> for SetUnion
where
    T: Clone + Eq + Hash + Send + 'static,
{
    fn merge_same_element(&self, _dst: &mut HashSet<T>, _ours: &T, _theirs: &T) {}
}

impl<T> MergeStrategy<BTreeSet<T>> for SetUnion
where
    T: Clone + Ord + Send + 'static,
{
    fn merge(&self, dst: &mut BTreeSet<T>, src: &BTreeSet<T>) {
        for elem in src {
            if dst.contains(elem) {
                self.merge_same_element(dst, elem, elem);
            } else {
                dst.insert(elem.clone());
            }
        }
    }
}

impl<T> ElementStrategy<BTreeSet<T>, T> for SetUnion
where
    T: Clone + Ord + Send + 'static,
{
    fn merge_same_element(&self, _dst: &mut BTreeSet<T>, _ours: &T, _theirs: &T) {}
}

/// Queue concatenation: the joined branch's queue is appended onto the
/// surviving one, preserving order within each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueAppend;

impl<T: Clone + Send + 'static> MergeStrategy<VecDeque<T>> for QueueAppend {
    fn merge(&self, dst: &mut VecDeque<T>, src: &VecDeque<T>) {
        dst.extend(src.iter().cloned());
    }
}

/// Stack concatenation: the joined branch's elements are pushed onto the
/// surviving stack in pop order (its top lands deepest among the pushed
/// run, its bottom on top).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackAppend;

impl<T: Clone + Send + 'static> MergeStrategy<Vec<T>> for StackAppend {
    fn merge(&self, dst: &mut Vec<T>, src: &Vec<T>) {
        dst.extend(src.iter().rev().cloned());
    }
}

/// Lift a closure into a merge strategy, for one-off policies.
///
/// # Example
///
/// ```
/// use revmem::{MergeWith, Versioned};
///
/// let sum = Versioned::with_strategy(
///     0u64,
///     MergeWith::new(|dst: &mut u64, src: &u64| *dst += src),
/// );
/// assert_eq!(sum.get(), 0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MergeWith<F>(F);

impl<F> MergeWith<F> {
    /// Wrap `f` as a strategy; `f(dst, src)` must leave `dst` reconciled.
    pub fn new(f: F) -> Self {
        MergeWith(f)
    }
}

impl<T, F> MergeStrategy<T> for MergeWith<F>
where
    F: Fn(&mut T, &T) + Send + Sync + 'static,
{
    fn merge(&self, dst: &mut T, src: &T) {
        (self.0)(dst, src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_takes_the_source() {
        let mut dst = 1;
        Overwrite.merge(&mut dst, &2);
        assert_eq!(dst, 2);
    }

    #[test]
    fn set_union_is_exactly_once() {
        let mut dst: HashSet<i32> = [1, 2, 3].into_iter().collect();
        let src: HashSet<i32> = [2, 3, 4].into_iter().collect();
        SetUnion.merge(&mut dst, &src);
        assert_eq!(dst, [1, 2, 3, 4].into_iter().collect());
    }

    #[test]
    fn queue_append_preserves_both_orders() {
        let mut dst: VecDeque<i32> = [1, 2].into_iter().collect();
        let src: VecDeque<i32> = [3, 4].into_iter().collect();
        QueueAppend.merge(&mut dst, &src);
        assert_eq!(dst, [1, 2, 3, 4].into_iter().collect::<VecDeque<_>>());
    }

    #[test]
    fn stack_append_pushes_in_pop_order() {
        let mut dst = vec![1, 2];
        let src = vec![3, 4]; // top is 4
        StackAppend.merge(&mut dst, &src);
        assert_eq!(dst, vec![1, 2, 4, 3]);
    }

    #[test]
    fn merge_with_runs_the_closure() {
        let max = MergeWith::new(|dst: &mut i32, src: &i32| *dst = (*dst).max(*src));
        let mut dst = 3;
        max.merge(&mut dst, &7);
        assert_eq!(dst, 7);
    }
}
