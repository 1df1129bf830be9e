/*!
 * Queue Traits
 *
 * Common interfaces so callers can be generic over the queue family.
 */

use crate::core::context::Context;
use crate::core::errors::QueueResult;

/// Non-blocking queue
///
/// `enqueue` fails with `OutOfCapacity` on a full bounded queue, `dequeue`
/// with `EmptyQueue` when nothing is available.
pub trait Queue<T> {
    fn enqueue(&self, value: T) -> QueueResult<()>;

    fn dequeue(&self) -> QueueResult<T>;

    /// Number of elements (may be approximate for lock-free queues)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Queue whose operations block until they can proceed or `ctx` fires
///
/// On cancellation the context's reason is returned as
/// [`QueueError::Cancelled`](crate::QueueError::Cancelled) and the queue is
/// left untouched.
pub trait BlockingQueue<T> {
    fn enqueue(&self, ctx: &Context, value: T) -> QueueResult<()>;

    fn dequeue(&self, ctx: &Context) -> QueueResult<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
