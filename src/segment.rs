//! The branch-history graph.
//!
//! A [`Segment`] marks a point in branch history where state may diverge.
//! Every write to a versioned value is keyed by the version of the segment
//! that was the writing revision's head at the time. Segments carry a
//! *logical* reference count — the number of revisions whose head they are,
//! plus their direct children — which is distinct from the `Arc` memory
//! count: a segment whose logical count reaches zero has its recorded
//! writes dropped even though `Arc`s to it may still exist briefly.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::revision::Revision;
use crate::versioned::Slot;

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Segment and value state stays structurally valid across a panicking
/// branch (the panic propagates at join and the branch is discarded), so
/// poison here carries no information.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Source of process-wide unique segment versions. Never reused.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// A node in the branch-history tree.
pub(crate) struct Segment {
    version: u64,
    refcount: AtomicUsize,
    /// Re-pointed when an exclusively owned parent is folded away.
    parent: Mutex<Option<Arc<Segment>>>,
    /// Versioned values written while this segment was a head.
    written: Mutex<Vec<Arc<dyn Slot>>>,
}

impl Segment {
    /// The first segment of a revision tree: no parent, one owner.
    pub(crate) fn root() -> Arc<Self> {
        Arc::new(Segment {
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
            refcount: AtomicUsize::new(1),
            parent: Mutex::new(None),
            written: Mutex::new(Vec::new()),
        })
    }

    /// A new segment branching off `parent`, which gains an owner.
    pub(crate) fn child(parent: &Arc<Segment>) -> Arc<Self> {
        parent.refcount.fetch_add(1, Ordering::AcqRel);
        Arc::new(Segment {
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
            refcount: AtomicUsize::new(1),
            parent: Mutex::new(Some(Arc::clone(parent))),
            written: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn parent(&self) -> Option<Arc<Segment>> {
        lock(&self.parent).clone()
    }

    pub(crate) fn refcount(&self) -> usize {
        self.refcount.load(Ordering::Acquire)
    }

    /// Record that `slot` was written while this segment was a head.
    ///
    /// Callers register a value at most once per segment (on the vacant →
    /// occupied transition of its entry), so the list holds no duplicates.
    pub(crate) fn record_write(&self, slot: Arc<dyn Slot>) {
        lock(&self.written).push(slot);
    }

    /// Snapshot of the write list, so callers can walk it without holding
    /// the segment lock while calling into values.
    pub(crate) fn written(&self) -> Vec<Arc<dyn Slot>> {
        lock(&self.written).clone()
    }

    /// Drop one logical owner. On the transition to zero, every value
    /// written here drops its entry for this segment, then the parent is
    /// released in turn. Releasing a segment already at zero is a no-op.
    pub(crate) fn release(self: &Arc<Self>) {
        let newly_dead = self
            .refcount
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            == Ok(1);
        if !newly_dead {
            return;
        }

        let written = std::mem::take(&mut *lock(&self.written));
        for slot in written {
            slot.release(self.version);
        }
        if let Some(parent) = self.parent() {
            parent.release();
        }
    }

    /// Fold exclusively owned ancestors into this head.
    ///
    /// Walks upward while the parent is not `main`'s root and has exactly
    /// one owner: each of the parent's written entries moves forward into
    /// this segment (unless this segment already wrote that value), and the
    /// parent is spliced out of the chain. Shared parents stop the walk —
    /// another branch may still read through them.
    ///
    /// Only the joining thread runs this, after the joined branch has
    /// terminated, so the folded segments have no concurrent readers.
    pub(crate) fn collapse(self: &Arc<Self>, main: &Revision) {
        loop {
            let Some(parent) = self.parent() else { break };
            if Arc::ptr_eq(&parent, main.root_segment()) || parent.refcount() != 1 {
                break;
            }
            let written = std::mem::take(&mut *lock(&parent.written));
            for slot in written {
                slot.collapse(main, &parent);
            }
            *lock(&self.parent) = parent.parent();
        }
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("version", &self.version)
            .field("refcount", &self.refcount())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Slot stub that records which versions were released.
    struct Probe {
        released: Mutex<Vec<u64>>,
    }

    impl Slot for Probe {
        fn release(self: Arc<Self>, version: u64) {
            lock(&self.released).push(version);
        }

        fn collapse(self: Arc<Self>, _main: &Revision, _folded: &Segment) {}

        fn merge(self: Arc<Self>, _main: &Revision, _joined: &Revision, _frontier: &Segment) {}
    }

    #[test]
    fn versions_are_unique_and_increasing() {
        let a = Segment::root();
        let b = Segment::child(&a);
        let c = Segment::child(&b);
        assert!(a.version() < b.version());
        assert!(b.version() < c.version());
    }

    #[test]
    fn child_adds_an_owner_to_parent() {
        let parent = Segment::root();
        assert_eq!(parent.refcount(), 1);
        let _a = Segment::child(&parent);
        let _b = Segment::child(&parent);
        assert_eq!(parent.refcount(), 3);
    }

    #[test]
    fn release_cascades_to_parent_and_drops_written() {
        let parent = Segment::root();
        let child = Segment::child(&parent);
        parent.release(); // only the child keeps the parent alive now

        let probe = Arc::new(Probe {
            released: Mutex::new(Vec::new()),
        });
        child.record_write(probe.clone());
        parent.record_write(probe.clone());

        child.release();
        let released = lock(&probe.released).clone();
        assert_eq!(released, vec![child.version(), parent.version()]);
        assert_eq!(child.refcount(), 0);
        assert_eq!(parent.refcount(), 0);
    }

    #[test]
    fn release_at_zero_is_a_no_op() {
        let seg = Segment::root();
        seg.release();
        assert_eq!(seg.refcount(), 0);
        seg.release();
        seg.release();
        assert_eq!(seg.refcount(), 0);
    }

    #[test]
    fn shared_parent_survives_one_child_release() {
        let parent = Segment::root();
        let a = Segment::child(&parent);
        let _b = Segment::child(&parent);
        a.release();
        assert_eq!(parent.refcount(), 2); // own head reference plus `_b`
    }
}
