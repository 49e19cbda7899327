//! Convenient re-exports for common usage.
//!
//! ```
//! use revmem::prelude::*;
//! ```

pub use crate::fork;
pub use crate::Branch;
pub use crate::MergeStrategy;
pub use crate::Overwrite;
pub use crate::Revision;
pub use crate::Versioned;
pub use crate::VsQueue;
pub use crate::VsSet;
pub use crate::VsStack;
pub use crate::VsTree;
