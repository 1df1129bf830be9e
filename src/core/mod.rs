/*!
 * Core Module
 * Cancellation contexts, comparators, error types and the sync primitives
 */

pub mod compare;
pub mod context;
pub mod errors;
pub mod limits;
pub mod sync;

// Re-export for convenience
pub use compare::{ByKey, Compare, NaturalOrder, Reverse, Signum};
pub use context::{CancelListener, Context, Registration};
pub use errors::*;
pub use sync::{CancellableCond, SegmentKeyLock, ShrinkPolicy, SyncConfig, WakeResult};
