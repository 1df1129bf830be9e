/*!
 * Lock-Based Synchronization Primitives
 *
 * Striped locks reduce contention by partitioning keys across segments.
 */

mod segment;

pub use segment::{fnv1a_32, SegmentKeyLock};
