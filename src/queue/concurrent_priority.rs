/*!
 * Concurrent Priority Queue
 * [`PriorityQueue`] behind a single RW lock
 */

use super::priority::PriorityQueue;
use super::traits::Queue;
use crate::core::compare::{Compare, NaturalOrder};
use crate::core::errors::QueueResult;
use crate::core::sync::ShrinkPolicy;
use parking_lot::RwLock;
use std::fmt;

/// Thread-safe min-heap
///
/// `enqueue`/`dequeue` take the write lock; `peek` and the size queries take
/// the read lock.
pub struct ConcurrentPriorityQueue<T, C = NaturalOrder> {
    inner: RwLock<PriorityQueue<T, C>>,
}

impl<T: Ord> ConcurrentPriorityQueue<T, NaturalOrder> {
    pub fn natural(capacity: usize) -> Self {
        Self::new(capacity, NaturalOrder)
    }
}

impl<T, C: Compare<T>> ConcurrentPriorityQueue<T, C> {
    /// Create a queue; `capacity` 0 means unbounded
    pub fn new(capacity: usize, compare: C) -> Self {
        Self::from_queue(PriorityQueue::new(capacity, compare))
    }

    pub fn from_queue(queue: PriorityQueue<T, C>) -> Self {
        Self {
            inner: RwLock::new(queue),
        }
    }

    pub fn with_shrink_policy(self, policy: ShrinkPolicy) -> Self {
        Self::from_queue(self.inner.into_inner().with_shrink_policy(policy))
    }

    pub fn enqueue(&self, value: T) -> QueueResult<()> {
        self.inner.write().enqueue(value)
    }

    pub fn dequeue(&self) -> QueueResult<T> {
        self.inner.write().dequeue()
    }

    /// Copy of the smallest element
    pub fn peek(&self) -> QueueResult<T>
    where
        T: Clone,
    {
        self.inner.read().peek().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Configured capacity, 0 if unbounded
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn into_inner(self) -> PriorityQueue<T, C> {
        self.inner.into_inner()
    }
}

impl<T, C: Compare<T>> Queue<T> for ConcurrentPriorityQueue<T, C> {
    fn enqueue(&self, value: T) -> QueueResult<()> {
        ConcurrentPriorityQueue::enqueue(self, value)
    }

    fn dequeue(&self) -> QueueResult<T> {
        ConcurrentPriorityQueue::dequeue(self)
    }

    fn len(&self) -> usize {
        ConcurrentPriorityQueue::len(self)
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ConcurrentPriorityQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentPriorityQueue")
            .field("inner", &*self.inner.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::QueueError;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_peek_clones() {
        let queue = ConcurrentPriorityQueue::natural(0);
        queue.enqueue(String::from("b")).unwrap();
        queue.enqueue(String::from("a")).unwrap();
        assert_eq!(queue.peek(), Ok(String::from("a")));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_bounded_full() {
        let queue = ConcurrentPriorityQueue::natural(1);
        queue.enqueue(1).unwrap();
        assert_eq!(queue.enqueue(2), Err(QueueError::OutOfCapacity));
        assert_eq!(queue.capacity(), 1);
    }

    #[test]
    fn test_concurrent_enqueue_then_ordered_drain() {
        let queue = Arc::new(ConcurrentPriorityQueue::natural(0));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        queue.enqueue(i * 4 + t).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let drained: Vec<_> = std::iter::from_fn(|| queue.dequeue().ok()).collect();
        assert!(drained.iter().copied().eq(0..1000));
        assert!(queue.is_empty());
    }
}
