//! Revisions: a thread's cursor into the branch history.
//!
//! A [`Revision`] pairs the segment that was current when the branch was
//! forked (`root`, the frozen view boundary) with the segment the branch is
//! actively writing into (`current`, the head). Each thread has exactly one
//! active revision; reads and writes on versioned values resolve against
//! it unless an explicit revision is supplied.

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use crate::segment::{lock, Segment};

thread_local! {
    static ACTIVE: RefCell<Option<Revision>> = const { RefCell::new(None) };
}

/// A branch cursor: where this line of history forked, and where it is
/// writing now.
///
/// `Revision` is a cheap shared handle; cloning it does not fork. Most
/// callers never touch revisions directly — [`fork`](crate::fork) and
/// [`Branch::join`](crate::Branch::join) manage them — but the explicit
/// [`fork`](Revision::fork)/[`join`](Revision::join) pair makes the whole
/// branch/merge protocol usable on a single thread, which is how the core
/// is tested.
///
/// # Example
///
/// ```
/// use revmem::{Revision, Versioned};
///
/// let main = Revision::current_thread();
/// let x = Versioned::new(0);
///
/// let child = main.fork();
/// x.set_in(&child, 1);
/// assert_eq!(x.get(), 0); // invisible to main until joined
///
/// main.join(child);
/// assert_eq!(x.get(), 1);
/// ```
#[derive(Clone)]
pub struct Revision {
    inner: Arc<Inner>,
}

struct Inner {
    root: Arc<Segment>,
    current: Mutex<Arc<Segment>>,
}

impl Revision {
    fn new(root: Arc<Segment>, current: Arc<Segment>) -> Revision {
        Revision {
            inner: Arc::new(Inner {
                root,
                current: Mutex::new(current),
            }),
        }
    }

    /// A fresh revision tree: root and head are the same new segment.
    fn bootstrap() -> Revision {
        let seg = Segment::root();
        Revision::new(Arc::clone(&seg), seg)
    }

    /// The calling thread's active revision.
    ///
    /// Threads spawned through [`fork`](crate::fork) arrive with the child
    /// revision already installed. Any other thread gets its own isolated
    /// root revision on first touch.
    pub fn current_thread() -> Revision {
        ACTIVE.with(|active| {
            active
                .borrow_mut()
                .get_or_insert_with(Revision::bootstrap)
                .clone()
        })
    }

    /// Swap the thread's active revision, returning the previous one.
    pub(crate) fn install(revision: Option<Revision>) -> Option<Revision> {
        ACTIVE.with(|active| std::mem::replace(&mut *active.borrow_mut(), revision))
    }

    pub(crate) fn root_segment(&self) -> &Arc<Segment> {
        &self.inner.root
    }

    pub(crate) fn current_segment(&self) -> Arc<Segment> {
        lock(&self.inner.current).clone()
    }

    /// Fork a child revision without spawning a thread.
    ///
    /// The child's root is this revision's pre-fork head, so the child sees
    /// everything written before the fork and nothing after: this
    /// revision's head advances to a fresh sibling segment, so parent and
    /// child write into disjoint segments from here on.
    pub fn fork(&self) -> Revision {
        let base = self.current_segment();
        let child_head = Segment::child(&base);
        let child = Revision::new(Arc::clone(&base), child_head);
        // The pre-fork head is no longer anyone's head, only a shared
        // ancestor; its two children keep it alive.
        base.release();
        *lock(&self.inner.current) = Segment::child(&base);
        child
    }

    /// Merge a forked revision's writes into this one, then compact.
    ///
    /// Walks the child's segment chain from its head up to (not including)
    /// its root; every value written on that path merges into this
    /// revision, with the "last write at the frontier" rule ensuring each
    /// value is applied once, from the segment nearest the child's head.
    /// The child's chain is then released and this revision's chain is
    /// collapsed.
    ///
    /// # Preconditions
    ///
    /// The child must be quiescent: if a thread was writing under it, that
    /// thread must have terminated ([`Branch::join`](crate::Branch::join)
    /// guarantees this). Joining a revision that was not forked from this
    /// one, or joining the same logical branch twice via cloned handles,
    /// is a precondition violation with unspecified merge results.
    pub fn join(&self, child: Revision) {
        let mut seg = child.current_segment();
        while !Arc::ptr_eq(&seg, child.root_segment()) {
            for slot in seg.written() {
                slot.merge(self, &child, &seg);
            }
            let Some(parent) = seg.parent() else { break };
            seg = parent;
        }

        child.current_segment().release();
        self.current_segment().collapse(self);
    }

    /// Number of segments from the head up to and including the root.
    #[cfg(test)]
    pub(crate) fn chain_len(&self) -> usize {
        let mut len = 1;
        let mut seg = self.current_segment();
        while let Some(parent) = seg.parent() {
            len += 1;
            seg = parent;
        }
        len
    }
}

impl std::fmt::Debug for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Revision")
            .field("root", &self.inner.root.version())
            .field("current", &self.current_segment().version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioned::Versioned;

    #[test]
    fn fork_advances_the_parent_head() {
        let main = Revision::current_thread();
        let before = main.current_segment();
        let child = main.fork();
        let after = main.current_segment();

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(Arc::ptr_eq(&before, child.root_segment()));
        // Pre-fork head is shared by both new heads.
        assert_eq!(before.refcount(), 2);
    }

    #[test]
    fn sibling_forks_are_mutually_invisible() {
        let main = Revision::current_thread();
        let x = Versioned::new(0);
        let a = main.fork();
        let b = main.fork();

        x.set_in(&a, 1);
        assert_eq!(x.get_in(&b), 0);
        x.set_in(&b, 2);
        assert_eq!(x.get_in(&a), 1);
    }

    #[test]
    fn join_makes_child_writes_visible() {
        let main = Revision::current_thread();
        let x = Versioned::new(0);
        let child = main.fork();
        x.set_in(&child, 7);
        assert_eq!(x.get(), 0);

        main.join(child);
        assert_eq!(x.get(), 7);
    }

    #[test]
    fn child_view_is_frozen_at_the_fork_point() {
        let main = Revision::current_thread();
        let x = Versioned::new(0);
        let child = main.fork();
        x.set(11);
        assert_eq!(x.get_in(&child), 0);
        assert_eq!(x.get(), 11);

        main.join(child);
        // Child never wrote, so the parent's write survives.
        assert_eq!(x.get(), 11);
    }

    #[test]
    fn join_collapses_exclusive_ancestors() {
        let main = Revision::current_thread();
        let x = Versioned::new(0);

        // Each fork/join round adds a sibling segment to the chain; the
        // collapse at join must keep the chain from growing.
        for round in 0..32 {
            let child = main.fork();
            x.set_in(&child, round);
            main.join(child);
            assert_eq!(x.get(), round);
        }
        assert!(main.chain_len() <= 3, "chain grew: {}", main.chain_len());
    }

    #[test]
    fn reads_are_identical_before_and_after_collapse() {
        let main = Revision::current_thread();
        let x = Versioned::new(1);
        let y = Versioned::new(2);

        let child = main.fork();
        x.set_in(&child, 10);
        let inner = child.fork();
        y.set_in(&inner, 20);
        child.join(inner);

        let x_before = x.get_in(&child);
        let y_before = y.get_in(&child);
        main.join(child);
        assert_eq!(x.get(), x_before);
        assert_eq!(y.get(), y_before);
    }
}
