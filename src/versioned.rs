//! The generic versioned-value container.
//!
//! A [`Versioned<T>`] maps segment versions to snapshots of `T` and
//! resolves reads by walking the reading revision's ancestry to the
//! nearest segment that wrote it. Writes land in the writing revision's
//! head segment; the first write per segment registers the value in that
//! segment's write-set, which is what fork/join later walks to merge and
//! compact.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::BranchError;
use crate::revision::Revision;
use crate::segment::{lock, Segment};
use crate::strategy::{MergeStrategy, Overwrite};

/// Object-safe surface the segment graph uses to drive a versioned value
/// through release, collapse, and merge without knowing its element type.
pub(crate) trait Slot: Send + Sync {
    /// Drop the entry keyed by `version`, if any. Idempotent.
    fn release(self: Arc<Self>, version: u64);

    /// `folded` is being spliced out of `main`'s chain: move its entry
    /// forward into `main`'s head unless the head already wrote, then
    /// discard it.
    fn collapse(self: Arc<Self>, main: &Revision, folded: &Segment);

    /// Merge the joined branch's write at `frontier` into `main`, if and
    /// only if `frontier` holds the joined branch's last visible write.
    fn merge(self: Arc<Self>, main: &Revision, joined: &Revision, frontier: &Segment);
}

/// A branch-versioned variable.
///
/// Constructing one seeds an initial value on the constructing revision;
/// every branch then reads the nearest ancestor snapshot and writes its
/// own, and divergent writes are reconciled at join by the value's
/// [`MergeStrategy`] (by default [`Overwrite`]: the joined branch wins).
///
/// `Versioned` is a shared handle: clones refer to the same logical
/// variable, which is how a handle moves into a [`fork`](crate::fork)
/// closure.
///
/// # Example
///
/// ```
/// use revmem::{fork, Versioned};
///
/// let x = Versioned::new(0);
/// let branch = {
///     let x = x.clone();
///     fork(move || {
///         assert_eq!(x.get(), 0);
///         x.set(1);
///     })
/// };
///
/// x.set(11); // parent's own line of history
/// branch.join();
/// assert_eq!(x.get(), 1); // joined branch wrote last
/// ```
pub struct Versioned<T, S = Overwrite> {
    inner: Arc<Inner<T, S>>,
}

struct Inner<T, S> {
    versions: Mutex<HashMap<u64, T>>,
    strategy: S,
}

impl<T, S> Clone for Versioned<T, S> {
    fn clone(&self) -> Self {
        Versioned {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Versioned<T, Overwrite>
where
    T: Clone + Send + 'static,
{
    /// Create a variable seeded with `initial` on the calling thread's
    /// revision, merging by overwrite (the joined branch wins).
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_strategy(initial, Overwrite)
    }

    /// Create a variable seeded on an explicit revision.
    #[must_use]
    pub fn new_in(revision: &Revision, initial: T) -> Self {
        Self::seeded(revision.clone(), initial, Overwrite)
    }
}

impl<T, S> Versioned<T, S>
where
    T: Clone + Send + 'static,
    S: MergeStrategy<T>,
{
    /// Create a variable with an explicit merge strategy.
    ///
    /// The strategy is fixed for the lifetime of the variable and decides
    /// how a joined branch's value combines with the surviving one.
    ///
    /// # Example
    ///
    /// ```
    /// use revmem::{MergeWith, Revision, Versioned};
    ///
    /// // Keep the larger of two divergent writes.
    /// let x = Versioned::with_strategy(0, MergeWith::new(|dst: &mut i32, src: &i32| {
    ///     *dst = (*dst).max(*src);
    /// }));
    ///
    /// let main = Revision::current_thread();
    /// let child = main.fork();
    /// x.set_in(&child, 3);
    /// x.set(5);
    /// main.join(child);
    /// assert_eq!(x.get(), 5);
    /// ```
    #[must_use]
    pub fn with_strategy(initial: T, strategy: S) -> Self {
        Self::seeded(Revision::current_thread(), initial, strategy)
    }

    fn seeded(revision: Revision, initial: T, strategy: S) -> Self {
        let value = Versioned {
            inner: Arc::new(Inner {
                versions: Mutex::new(HashMap::new()),
                strategy,
            }),
        };
        value.set_in(&revision, initial);
        value
    }

    fn slot(&self) -> Arc<dyn Slot> {
        self.inner.clone()
    }

    /// The value visible on the calling thread's branch.
    ///
    /// # Panics
    ///
    /// Panics if no ancestor of the current branch ever wrote this
    /// variable (it was seeded on an unrelated branch). Use
    /// [`try_get`](Self::try_get) to observe this as an error instead.
    #[must_use]
    pub fn get(&self) -> T {
        self.get_in(&Revision::current_thread())
    }

    /// The value visible on an explicit revision.
    ///
    /// # Panics
    ///
    /// Panics on an unseeded read, like [`get`](Self::get).
    #[must_use]
    pub fn get_in(&self, revision: &Revision) -> T {
        match self.try_get_in(revision) {
            Ok(value) => value,
            Err(err) => panic!("versioned read failed: {err}"),
        }
    }

    /// Like [`get`](Self::get), but an unseeded read is an error.
    pub fn try_get(&self) -> Result<T, BranchError> {
        self.try_get_in(&Revision::current_thread())
    }

    /// Like [`get_in`](Self::get_in), but an unseeded read is an error.
    pub fn try_get_in(&self, revision: &Revision) -> Result<T, BranchError> {
        let versions = lock(&self.inner.versions);
        let mut seg = revision.current_segment();
        loop {
            if let Some(value) = versions.get(&seg.version()) {
                return Ok(value.clone());
            }
            match seg.parent() {
                Some(parent) => seg = parent,
                None => return Err(BranchError::Unseeded),
            }
        }
    }

    /// Apply `f` to the visible value without cloning it out.
    ///
    /// This is the read path for the collection adapters: `contains` or
    /// `len` on a large collection should not copy it.
    ///
    /// # Panics
    ///
    /// Panics on an unseeded read, like [`get`](Self::get).
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.read_in(&Revision::current_thread(), f)
    }

    /// Apply `f` to the value visible on an explicit revision.
    ///
    /// # Panics
    ///
    /// Panics on an unseeded read, like [`get`](Self::get).
    pub fn read_in<F, R>(&self, revision: &Revision, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let versions = lock(&self.inner.versions);
        let mut seg = revision.current_segment();
        loop {
            if let Some(value) = versions.get(&seg.version()) {
                return f(value);
            }
            match seg.parent() {
                Some(parent) => seg = parent,
                None => panic!("versioned read failed: {}", BranchError::Unseeded),
            }
        }
    }

    /// Write `value` on the calling thread's branch.
    ///
    /// The first write per segment registers this variable in the
    /// segment's write-set; later writes in the same segment overwrite in
    /// place. Returns `true` (the write surface reports whether the
    /// mutation took effect, which for a plain overwrite it always does;
    /// see [`update`](Self::update) for conditional mutations).
    pub fn set(&self, value: T) -> bool {
        self.set_in(&Revision::current_thread(), value)
    }

    /// Write `value` on an explicit revision.
    pub fn set_in(&self, revision: &Revision, value: T) -> bool {
        let mut versions = lock(&self.inner.versions);
        let head = revision.current_segment();
        if versions.insert(head.version(), value).is_none() {
            head.record_write(self.slot());
        }
        true
    }

    /// Mutate the value in place on the calling thread's branch.
    ///
    /// If the current segment has not written this variable yet, the
    /// nearest ancestor snapshot is cloned in first (one copy per segment,
    /// not per call — this is what makes adapter operations like push/pop
    /// cheap within a branch). Returns whatever `f` returns, so adapters
    /// can report "nothing to do" without writing.
    ///
    /// # Panics
    ///
    /// Panics on an unseeded read, like [`get`](Self::get).
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.update_in(&Revision::current_thread(), f)
    }

    /// Mutate the value in place on an explicit revision.
    ///
    /// # Panics
    ///
    /// Panics on an unseeded read, like [`get`](Self::get).
    pub fn update_in<F>(&self, revision: &Revision, f: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        let mut versions = lock(&self.inner.versions);
        let head = revision.current_segment();
        if !versions.contains_key(&head.version()) {
            let mut seg = head.parent();
            let snapshot = loop {
                match seg {
                    Some(s) => {
                        if let Some(value) = versions.get(&s.version()) {
                            break value.clone();
                        }
                        seg = s.parent();
                    }
                    None => panic!("versioned update failed: {}", BranchError::Unseeded),
                }
            };
            versions.insert(head.version(), snapshot);
            head.record_write(self.slot());
        }
        let value = versions
            .get_mut(&head.version())
            .expect("entry exists for the head segment");
        f(value)
    }
}

impl<T, S> Slot for Inner<T, S>
where
    T: Clone + Send + 'static,
    S: MergeStrategy<T>,
{
    fn release(self: Arc<Self>, version: u64) {
        lock(&self.versions).remove(&version);
    }

    fn collapse(self: Arc<Self>, main: &Revision, folded: &Segment) {
        let mut versions = lock(&self.versions);
        let Some(value) = versions.remove(&folded.version()) else {
            return;
        };
        let head = main.current_segment();
        if let Entry::Vacant(entry) = versions.entry(head.version()) {
            entry.insert(value);
            head.record_write(self.clone());
        }
    }

    fn merge(self: Arc<Self>, main: &Revision, joined: &Revision, frontier: &Segment) {
        let mut versions = lock(&self.versions);

        // Find the segment holding the joined branch's last visible write.
        // Only the frontier segment itself may merge: a write at an
        // ancestor either was already visible to main before the fork, or
        // will be (or was) handled when that ancestor is the frontier.
        let mut seg = joined.current_segment();
        let src = loop {
            if let Some(value) = versions.get(&seg.version()) {
                if seg.version() != frontier.version() {
                    return;
                }
                break value.clone();
            }
            match seg.parent() {
                Some(parent) => seg = parent,
                None => return,
            }
        };

        let head = main.current_segment();
        match versions.entry(head.version()) {
            Entry::Vacant(entry) => {
                entry.insert(src);
                head.record_write(self.clone());
            }
            Entry::Occupied(mut entry) => self.strategy.merge(entry.get_mut(), &src),
        }
    }
}
