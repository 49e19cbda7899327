//! A branch-versioned LIFO stack.

use crate::strategy::StackAppend;
use crate::versioned::Versioned;

/// A LIFO stack whose contents are versioned per branch.
///
/// Every branch mutates its own snapshot from the fork point; at join, the
/// joined branch's elements are pushed onto the surviving stack in pop
/// order ([`StackAppend`]), so the joined branch's bottom element ends up
/// on top.
///
/// Cloning shares the same logical stack; a detached copy is
/// [`snapshot`](Self::snapshot) plus [`From`].
///
/// # Example
///
/// ```
/// use revmem::VsStack;
///
/// let s = VsStack::new();
/// s.push("a");
/// s.push("b");
/// assert_eq!(s.top(), Some("b"));
/// assert_eq!(s.pop(), Some("b"));
/// assert_eq!(s.len(), 1);
/// ```
pub struct VsStack<T> {
    inner: Versioned<Vec<T>, StackAppend>,
}

impl<T> Clone for VsStack<T> {
    fn clone(&self) -> Self {
        VsStack {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> VsStack<T> {
    /// Create an empty stack on the calling thread's branch.
    #[must_use]
    pub fn new() -> Self {
        VsStack {
            inner: Versioned::with_strategy(Vec::new(), StackAppend),
        }
    }

    /// Push an element on top.
    pub fn push(&self, value: T) {
        self.inner.update(|stack| {
            stack.push(value);
            true
        });
    }

    /// Remove and return the top element, if any.
    pub fn pop(&self) -> Option<T> {
        let mut popped = None;
        self.inner.update(|stack| {
            popped = stack.pop();
            popped.is_some()
        });
        popped
    }

    /// The top element, cloned out.
    #[must_use]
    pub fn top(&self) -> Option<T> {
        self.inner.read(|stack| stack.last().cloned())
    }

    /// Number of elements visible on this branch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read(Vec::len)
    }

    /// Whether the stack is empty on this branch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read(Vec::is_empty)
    }

    /// A detached copy of this branch's view, bottom first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.get()
    }
}

impl<T: Clone + Send + 'static> Default for VsStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> From<Vec<T>> for VsStack<T> {
    fn from(stack: Vec<T>) -> Self {
        VsStack {
            inner: Versioned::with_strategy(stack, StackAppend),
        }
    }
}

impl<T: Clone + Send + 'static> FromIterator<T> for VsStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T: Clone + Send + 'static> IntoIterator for VsStack<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshot().into_iter()
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> std::fmt::Debug for VsStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_get() {
            Ok(stack) => f.debug_list().entries(stack.iter()).finish(),
            Err(_) => f.write_str("VsStack(<unseeded branch>)"),
        }
    }
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for VsStack<T>
where
    T: Clone + Send + serde::Serialize + 'static,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for VsStack<T>
where
    T: Clone + Send + serde::Deserialize<'de> + 'static,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::deserialize(deserializer).map(Self::from)
    }
}
