/*!
 * Queues
 *
 * Blocking FIFO queues, a lock-free MPMC queue and priority queues.
 */

mod blocking;
mod concurrent_priority;
mod lockfree;
mod priority;
pub mod storage;
pub mod traits;

pub use blocking::{ArrayBlockingQueue, ConcurrentBlockingQueue, LinkedBlockingQueue};
pub use concurrent_priority::ConcurrentPriorityQueue;
pub use lockfree::LockFreeQueue;
pub use priority::PriorityQueue;
pub use storage::{LinkedStorage, RingBuffer, Storage};
pub use traits::{BlockingQueue, Queue};
