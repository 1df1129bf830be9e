/*!
 * Synchronization Primitives
 *
 * Blocking and lock-based building blocks for the queues:
 * - Cancellable condition variable with FIFO wakeup
 * - Waiter list with pooled single-shot signals
 * - Segmented per-key RW locks
 *
 * # Architecture
 *
 * Every blocking call takes a [`Context`](crate::core::context::Context). A
 * waiter parks on its own signal and is woken either by a notifier or by the
 * context's cancellation, never by polling.
 */

mod cond;
mod config;
mod locks;
mod traits;
mod waiter;

pub use cond::CancellableCond;
pub use config::{ShrinkPolicy, SyncConfig};
pub use locks::{fnv1a_32, SegmentKeyLock};
pub use traits::{Unlockable, WakeResult};
pub use waiter::{Waiter, WaiterList};
