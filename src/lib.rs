/*!
 * AI-OS Sync Library
 * Context-aware synchronization primitives and concurrent queues
 */

pub mod core;
pub mod monitoring;
pub mod queue;

// Re-exports
pub use crate::core::compare::{primitive, ByKey, Compare, NaturalOrder, Reverse, Signum};
pub use crate::core::context::{CancelListener, Context, Registration};
pub use crate::core::errors::{CancelReason, ConfigError, QueueError, QueueResult};
pub use crate::core::sync::{
    CancellableCond, SegmentKeyLock, ShrinkPolicy, SyncConfig, Unlockable, WakeResult,
};
pub use monitoring::{init_tracing, try_init_tracing};
pub use queue::{
    ArrayBlockingQueue, BlockingQueue, ConcurrentBlockingQueue, ConcurrentPriorityQueue,
    LinkedBlockingQueue, LockFreeQueue, PriorityQueue, Queue,
};
