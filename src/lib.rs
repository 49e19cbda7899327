//! # revmem
//!
//! Branching, versioned in-process state: fork a computation onto a new
//! thread, let parent and child mutate shared logical variables
//! independently, and reconcile their divergent writes when the child is
//! joined — a git-like branch/merge model applied to variables instead of
//! files.
//!
//! Unlike locks or software transactional memory, branches never wait for
//! each other and never roll back: every branch works on its own logical
//! snapshot, and conflicts are resolved deterministically at join by a
//! per-variable [`MergeStrategy`].
//!
//! ## Quick Start
//!
//! ```
//! use revmem::prelude::*;
//!
//! let x = Versioned::new(0);
//! let y = Versioned::new(100);
//!
//! let branch = {
//!     let (x, y) = (x.clone(), y.clone());
//!     fork(move || {
//!         assert_eq!(x.get(), 0); // fork-point view, frozen
//!         assert_eq!(y.get(), 100);
//!         x.set(1);
//!     })
//! };
//!
//! y.set(111); // parent keeps writing, invisible to the branch
//! assert_eq!(x.get(), 0); // branch writes invisible until joined
//!
//! branch.join();
//! assert_eq!(x.get(), 1); // branch wrote x, parent didn't: branch's write lands
//! assert_eq!(y.get(), 111); // parent wrote y, branch didn't: untouched
//! ```
//!
//! ## The model
//!
//! Branch history is a tree of *segments*; each thread holds a
//! [`Revision`] — a cursor made of the segment where its view was frozen
//! and the segment it is writing into. A [`Versioned`] variable maps
//! segment identity to value snapshots and resolves a read by walking the
//! reading revision's ancestry to the nearest write. [`fork`] splits the
//! history in two; [`Branch::join`] blocks for the thread, replays its
//! write set under the merge strategies, and compacts the now-exclusive
//! history so ancestry chains stay short.
//!
//! Two rules give the isolation guarantees: a branch's writes are
//! invisible to its parent until joined, and the parent's post-fork
//! writes are invisible to the branch.
//!
//! ## Merge strategies
//!
//! The default for scalar-like values is [`Overwrite`] (the joined branch
//! wins). Collections ship richer defaults — [`SetUnion`],
//! [`QueueAppend`], [`StackAppend`] — and [`Versioned::with_strategy`] or
//! [`MergeWith`] accept custom policies. These defaults are documented
//! behavior, chosen at each variable's construction; nothing infers them
//! from the data.
//!
//! ## Collection adapters
//!
//! - [`VsQueue`] — FIFO queue, joined branch appended
//! - [`VsStack`] — LIFO stack, joined branch pushed in pop order
//! - [`VsSet`] — hash set, join is the union
//! - [`VsTree`] — ordered set, join is the union, ascending iteration
//!
//! ## What this is not
//!
//! No transactional rollback, no distributed replication, no persistence,
//! no detach: every forked branch must be joined exactly once, by its
//! logical parent.

#![warn(missing_docs)]

mod branch;
mod error;
mod queue;
mod revision;
mod segment;
mod set;
mod stack;
mod strategy;
mod tree;
mod versioned;

pub mod prelude;

pub use branch::{fork, Branch};
pub use error::BranchError;
pub use queue::VsQueue;
pub use revision::Revision;
pub use set::VsSet;
pub use stack::VsStack;
pub use strategy::{
    ElementStrategy, MergeStrategy, MergeWith, Overwrite, QueueAppend, SetUnion, StackAppend,
};
pub use tree::VsTree;
pub use versioned::Versioned;
