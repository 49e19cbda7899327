//! A branch-versioned FIFO queue.

use std::collections::VecDeque;

use crate::strategy::QueueAppend;
use crate::versioned::Versioned;

/// A FIFO queue whose contents are versioned per branch.
///
/// Every branch sees the queue as it was at its fork point and mutates its
/// own snapshot; at join, the joined branch's queue is appended onto the
/// surviving one ([`QueueAppend`]), preserving order within each side.
///
/// Cloning shares the same logical queue — that is how a handle moves into
/// a [`fork`](crate::fork) closure. A detached copy with no shared history
/// is [`snapshot`](Self::snapshot) plus [`From`].
///
/// # Example
///
/// ```
/// use std::collections::VecDeque;
///
/// use revmem::{fork, VsQueue};
///
/// let q: VsQueue<i32> = [1, 2, 3].into_iter().collect();
/// let branch = {
///     let q = q.clone();
///     fork(move || q.push(4))
/// };
/// let _ = q.pop();
/// branch.join();
/// // Parent's remainder, then the joined branch's whole queue.
/// assert_eq!(q.snapshot(), [2, 3, 1, 2, 3, 4].into_iter().collect::<VecDeque<_>>());
/// ```
pub struct VsQueue<T> {
    inner: Versioned<VecDeque<T>, QueueAppend>,
}

impl<T> Clone for VsQueue<T> {
    fn clone(&self) -> Self {
        VsQueue {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> VsQueue<T> {
    /// Create an empty queue on the calling thread's branch.
    #[must_use]
    pub fn new() -> Self {
        VsQueue {
            inner: Versioned::with_strategy(VecDeque::new(), QueueAppend),
        }
    }

    /// Append an element at the back.
    pub fn push(&self, value: T) {
        self.inner.update(|queue| {
            queue.push_back(value);
            true
        });
    }

    /// Remove and return the front element, if any.
    pub fn pop(&self) -> Option<T> {
        let mut popped = None;
        self.inner.update(|queue| {
            popped = queue.pop_front();
            popped.is_some()
        });
        popped
    }

    /// The front element, cloned out.
    #[must_use]
    pub fn front(&self) -> Option<T> {
        self.inner.read(|queue| queue.front().cloned())
    }

    /// The most recently pushed element, cloned out.
    #[must_use]
    pub fn back(&self) -> Option<T> {
        self.inner.read(|queue| queue.back().cloned())
    }

    /// Number of elements visible on this branch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read(VecDeque::len)
    }

    /// Whether the queue is empty on this branch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read(VecDeque::is_empty)
    }

    /// A detached copy of this branch's view.
    #[must_use]
    pub fn snapshot(&self) -> VecDeque<T> {
        self.inner.get()
    }
}

impl<T: Clone + Send + 'static> Default for VsQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> From<VecDeque<T>> for VsQueue<T> {
    fn from(queue: VecDeque<T>) -> Self {
        VsQueue {
            inner: Versioned::with_strategy(queue, QueueAppend),
        }
    }
}

impl<T: Clone + Send + 'static> FromIterator<T> for VsQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<VecDeque<T>>())
    }
}

impl<T: Clone + Send + 'static> IntoIterator for VsQueue<T> {
    type Item = T;
    type IntoIter = std::collections::vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshot().into_iter()
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> std::fmt::Debug for VsQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_get() {
            Ok(queue) => f.debug_list().entries(queue.iter()).finish(),
            Err(_) => f.write_str("VsQueue(<unseeded branch>)"),
        }
    }
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for VsQueue<T>
where
    T: Clone + Send + serde::Serialize + 'static,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for VsQueue<T>
where
    T: Clone + Send + serde::Deserialize<'de> + 'static,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        VecDeque::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork;

    #[test]
    fn push_and_pop_in_order() {
        let q = VsQueue::new();
        q.push(1);
        q.push(2);
        assert_eq!(q.front(), Some(1));
        assert_eq!(q.back(), Some(2));
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn divergent_branches_append_at_join() {
        let q: VsQueue<i32> = [0, 1, 2, 3].into_iter().collect();
        let branch = {
            let q = q.clone();
            fork(move || {
                assert_eq!(q.snapshot(), [0, 1, 2, 3].into_iter().collect::<VecDeque<_>>());
                q.push(4);
            })
        };
        let _ = q.pop();
        assert_eq!(q.snapshot(), [1, 2, 3].into_iter().collect::<VecDeque<_>>());

        branch.join();
        assert_eq!(q.snapshot(), [1, 2, 3, 0, 1, 2, 3, 4].into_iter().collect::<VecDeque<_>>());
    }

    #[test]
    fn collected_from_iterator() {
        let q: VsQueue<i32> = (0..3).collect();
        assert_eq!(q.len(), 3);
        assert_eq!(q.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
