/*!
 * Blocking Queues
 *
 * Bounded (ring buffer) and linked FIFO queues whose `enqueue`/`dequeue`
 * block on [`CancellableCond`]s and honour a [`Context`].
 */

use super::storage::{LinkedStorage, RingBuffer, Storage};
use super::traits::{BlockingQueue, Queue};
use crate::core::context::Context;
use crate::core::errors::{QueueError, QueueResult};
use crate::core::limits::WAITER_POOL_CAPACITY;
use crate::core::sync::{CancellableCond, SyncConfig};
use parking_lot::RwLock;
use std::fmt;

/// FIFO queue over a [`Storage`], guarded by one RW lock and two conds
///
/// Mutations take the write lock; `len`/`to_vec` take the read lock. Every
/// successful enqueue broadcasts `not_empty`, every dequeue broadcasts
/// `not_full`. A call whose context is already done fails before touching the
/// lock, so cancellation takes precedence over available work.
pub struct ConcurrentBlockingQueue<S: Storage> {
    storage: RwLock<S>,
    not_full: CancellableCond,
    not_empty: CancellableCond,
}

/// Bounded queue over a ring buffer
pub type ArrayBlockingQueue<T> = ConcurrentBlockingQueue<RingBuffer<T>>;

/// Queue over a linked list, bounded or unbounded
pub type LinkedBlockingQueue<T> = ConcurrentBlockingQueue<LinkedStorage<T>>;

impl<T> ConcurrentBlockingQueue<RingBuffer<T>> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::from_storage(RingBuffer::new(capacity))
    }

    pub fn with_config(capacity: usize, config: &SyncConfig) -> Self {
        Self::from_parts(RingBuffer::new(capacity), config.waiter_pool_capacity)
    }
}

impl<T> ConcurrentBlockingQueue<LinkedStorage<T>> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::from_storage(LinkedStorage::bounded(capacity))
    }

    /// Queue that never reports full; `enqueue` never blocks
    pub fn unbounded() -> Self {
        Self::from_storage(LinkedStorage::unbounded())
    }
}

impl<S: Storage> ConcurrentBlockingQueue<S> {
    pub fn from_storage(storage: S) -> Self {
        Self::from_parts(storage, WAITER_POOL_CAPACITY)
    }

    fn from_parts(storage: S, pool_capacity: usize) -> Self {
        Self {
            storage: RwLock::new(storage),
            not_full: CancellableCond::with_pool_capacity(pool_capacity),
            not_empty: CancellableCond::with_pool_capacity(pool_capacity),
        }
    }

    /// Append `value`, blocking while the queue is full
    ///
    /// On cancellation `value` is dropped and the queue is unchanged.
    pub fn enqueue(&self, ctx: &Context, value: S::Item) -> QueueResult<()> {
        if let Some(reason) = ctx.err() {
            return Err(reason.into());
        }

        let mut storage = self.storage.write();
        while storage.is_full() {
            self.not_full.wait(&mut storage, ctx)?;
        }
        storage.push_back(value);
        self.not_empty.broadcast();
        Ok(())
    }

    /// Remove the oldest element, blocking while the queue is empty
    pub fn dequeue(&self, ctx: &Context) -> QueueResult<S::Item> {
        if let Some(reason) = ctx.err() {
            return Err(reason.into());
        }

        let mut storage = self.storage.write();
        while storage.is_empty() {
            self.not_empty.wait(&mut storage, ctx)?;
        }
        let value = storage.pop_front().ok_or(QueueError::EmptyQueue)?;
        self.not_full.broadcast();
        Ok(value)
    }

    /// Append without blocking
    pub fn try_enqueue(&self, value: S::Item) -> QueueResult<()> {
        let mut storage = self.storage.write();
        if storage.is_full() {
            return Err(QueueError::OutOfCapacity);
        }
        storage.push_back(value);
        self.not_empty.broadcast();
        Ok(())
    }

    /// Remove the oldest element without blocking
    pub fn try_dequeue(&self) -> QueueResult<S::Item> {
        let value = self
            .storage
            .write()
            .pop_front()
            .ok_or(QueueError::EmptyQueue)?;
        self.not_full.broadcast();
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.storage.read().is_full()
    }

    /// Maximum number of elements, `None` if unbounded
    pub fn capacity(&self) -> Option<usize> {
        self.storage.read().capacity()
    }

    /// Snapshot of the contents, oldest first
    pub fn to_vec(&self) -> Vec<S::Item>
    where
        S::Item: Clone,
    {
        self.storage.read().to_vec()
    }

    /// Run `f` with shared access to the storage
    pub fn inspect<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.storage.read())
    }
}

impl<S: Storage> BlockingQueue<S::Item> for ConcurrentBlockingQueue<S> {
    fn enqueue(&self, ctx: &Context, value: S::Item) -> QueueResult<()> {
        ConcurrentBlockingQueue::enqueue(self, ctx, value)
    }

    fn dequeue(&self, ctx: &Context) -> QueueResult<S::Item> {
        ConcurrentBlockingQueue::dequeue(self, ctx)
    }

    fn len(&self) -> usize {
        ConcurrentBlockingQueue::len(self)
    }
}

impl<S: Storage> Queue<S::Item> for ConcurrentBlockingQueue<S> {
    fn enqueue(&self, value: S::Item) -> QueueResult<()> {
        self.try_enqueue(value)
    }

    fn dequeue(&self) -> QueueResult<S::Item> {
        self.try_dequeue()
    }

    fn len(&self) -> usize {
        ConcurrentBlockingQueue::len(self)
    }
}

impl<S: Storage> fmt::Debug for ConcurrentBlockingQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.storage.read();
        f.debug_struct("ConcurrentBlockingQueue")
            .field("len", &storage.len())
            .field("capacity", &storage.capacity())
            .field("blocked_producers", &self.not_full.waiter_count())
            .field("blocked_consumers", &self.not_empty.waiter_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::CancelReason;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = ArrayBlockingQueue::new(4);
        let ctx = Context::background();
        for i in 0..4 {
            queue.enqueue(&ctx, i).unwrap();
        }
        assert!(queue.is_full());
        assert_eq!(queue.to_vec(), vec![0, 1, 2, 3]);
        for i in 0..4 {
            assert_eq!(queue.dequeue(&ctx).unwrap(), i);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_try_ops() {
        let queue = ArrayBlockingQueue::new(1);
        queue.try_enqueue("a").unwrap();
        assert_eq!(queue.try_enqueue("b"), Err(QueueError::OutOfCapacity));
        assert_eq!(queue.try_dequeue(), Ok("a"));
        assert_eq!(queue.try_dequeue(), Err(QueueError::EmptyQueue));
    }

    #[test]
    fn test_cancelled_context_wins_over_available_work() {
        let queue = ArrayBlockingQueue::new(2);
        queue.try_enqueue(1).unwrap();

        let ctx = Context::background();
        ctx.cancel();
        assert_eq!(
            queue.dequeue(&ctx),
            Err(QueueError::Cancelled(CancelReason::Cancelled))
        );
        assert_eq!(queue.enqueue(&ctx, 2), Err(CancelReason::Cancelled.into()));
        assert_eq!(queue.to_vec(), vec![1]);
    }

    #[test]
    fn test_dequeue_times_out_on_empty() {
        let queue = LinkedBlockingQueue::<u32>::unbounded();
        let ctx = Context::with_timeout(Duration::from_millis(20));
        assert_eq!(
            queue.dequeue(&ctx),
            Err(QueueError::Cancelled(CancelReason::DeadlineExceeded))
        );
    }

    #[test]
    fn test_blocked_producer_resumes_after_dequeue() {
        let queue = Arc::new(ArrayBlockingQueue::new(1));
        queue.try_enqueue(1).unwrap();

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || queue.enqueue(&Context::background(), 2))
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.try_dequeue(), Ok(1));
        producer.join().unwrap().unwrap();
        assert_eq!(queue.to_vec(), vec![2]);
    }

    #[test]
    fn test_linked_bounded_and_unbounded() {
        let bounded = LinkedBlockingQueue::new(2);
        bounded.try_enqueue(1).unwrap();
        bounded.try_enqueue(2).unwrap();
        assert_eq!(bounded.try_enqueue(3), Err(QueueError::OutOfCapacity));
        assert_eq!(bounded.capacity(), Some(2));

        let unbounded = LinkedBlockingQueue::unbounded();
        let ctx = Context::background();
        for i in 0..10_000 {
            unbounded.enqueue(&ctx, i).unwrap();
        }
        assert_eq!(unbounded.len(), 10_000);
        assert_eq!(unbounded.capacity(), None);
    }

    #[test]
    fn test_usable_through_traits() {
        fn drain<Q: Queue<u8>>(q: &Q) -> Vec<u8> {
            std::iter::from_fn(|| q.dequeue().ok()).collect()
        }
        let queue = ArrayBlockingQueue::new(3);
        BlockingQueue::enqueue(&queue, &Context::background(), 1).unwrap();
        Queue::enqueue(&queue, 2).unwrap();
        assert_eq!(drain(&queue), vec![1, 2]);
    }
}
