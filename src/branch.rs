//! The thread wrapper: fork-on-construct, merge-on-join.

use std::thread;

use crate::error::BranchError;
use crate::revision::Revision;

/// Fork the calling thread's state onto a new thread.
///
/// The new thread sees everything written before the fork and nothing
/// after; its own writes stay invisible here until [`Branch::join`].
///
/// # Panics
///
/// Panics if the operating system cannot create the thread; use
/// [`Branch::try_fork`] to handle that as an error.
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
///         x.set(1);
///     })
/// };
/// assert_eq!(x.get(), 0);
/// branch.join();
/// assert_eq!(x.get(), 1);
/// ```
pub fn fork<F>(f: F) -> Branch
where
    F: FnOnce() + Send + 'static,
{
    match Branch::try_fork(f) {
        Ok(branch) => branch,
        Err(err) => panic!("fork failed: {err}"),
    }
}

/// A forked branch: a native thread plus the revision it writes under.
///
/// Joining is the only way to get the branch's writes back; there is
/// deliberately no `detach` — a detached branch would leak its segment
/// chain and its writes could never merge.
pub struct Branch {
    handle: thread::JoinHandle<()>,
    revision: Revision,
}

impl Branch {
    /// Fork, surfacing thread-creation failure instead of panicking.
    ///
    /// The child revision is created before the thread starts, so by the
    /// time `f` runs its view is already frozen at the fork point.
    pub fn try_fork<F>(f: F) -> Result<Branch, BranchError>
    where
        F: FnOnce() + Send + 'static,
    {
        let parent = Revision::current_thread();
        let revision = parent.fork();

        let body_revision = revision.clone();
        let spawned = thread::Builder::new()
            .name("revmem-branch".into())
            .spawn(move || {
                // Restore afterwards in case the host reuses threads.
                let previous = Revision::install(Some(body_revision));
                f();
                Revision::install(previous);
            });

        match spawned {
            Ok(handle) => Ok(Branch { handle, revision }),
            Err(err) => {
                // The branch never ran: drop its chain so the fork leaves
                // no trace beyond the parent's advanced head.
                revision.current_segment().release();
                Err(BranchError::Spawn(err))
            }
        }
    }

    /// Identifier of the underlying thread.
    #[must_use]
    pub fn id(&self) -> thread::ThreadId {
        self.handle.thread().id()
    }

    /// Whether the branch's thread has finished running.
    ///
    /// `false` means [`join`](Self::join) would block.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the branch finishes, then merge its writes into the
    /// calling thread's revision and compact the history.
    ///
    /// Must be called from the branch's logical parent — the thread whose
    /// active revision the branch was forked from (or one that has since
    /// absorbed it); joining from anywhere else merges into the wrong
    /// line of history.
    ///
    /// # Panics
    ///
    /// If the branch panicked, its writes are discarded and the panic is
    /// propagated here.
    pub fn join(self) {
        let parent = Revision::current_thread();
        match self.handle.join() {
            Ok(()) => parent.join(self.revision),
            Err(payload) => {
                self.revision.current_segment().release();
                std::panic::resume_unwind(payload);
            }
        }
    }
}

impl std::fmt::Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Branch")
            .field("thread", &self.id())
            .field("revision", &self.revision)
            .finish()
    }
}
