//! Error type for branch operations.

use std::fmt;
use std::io;

/// Error from reading a versioned value or forking a branch.
#[derive(Debug)]
pub enum BranchError {
    /// An ancestry walk reached the root without finding a value: the
    /// variable was never seeded on any ancestor of the reading branch.
    /// This is a programmer error (the variable belongs to an unrelated
    /// branch), surfaced explicitly rather than returning a stale
    /// sentinel.
    Unseeded,
    /// The operating system refused to create the branch thread.
    Spawn(io::Error),
}

impl fmt::Display for BranchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unseeded => {
                write!(f, "no ancestor of this branch ever wrote the value")
            }
            Self::Spawn(err) => write!(f, "failed to spawn branch thread: {err}"),
        }
    }
}

impl std::error::Error for BranchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unseeded => None,
            Self::Spawn(err) => Some(err),
        }
    }
}

impl PartialEq for BranchError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unseeded, Self::Unseeded) => true,
            (Self::Spawn(a), Self::Spawn(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}
