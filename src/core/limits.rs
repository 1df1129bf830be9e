/*!
 * Limits and Constants
 *
 * Centralized location for sizing defaults and thresholds of the sync primitives.
 * Organized by primitive for maintainability and discoverability.
 *
 * - Performance-critical constants are marked with [PERF]
 */

// =============================================================================
// CONDITION VARIABLE
// =============================================================================

/// Waiter signals kept for reuse per condition variable
/// [PERF] Bounds retained memory while avoiding an allocation per wait
pub const WAITER_POOL_CAPACITY: usize = 128;

// =============================================================================
// PRIORITY QUEUE
// =============================================================================

/// Initial slot count of an unbounded priority queue (includes the root sentinel)
pub const DEFAULT_UNBOUNDED_SLOTS: usize = 64;

/// Buffers at or below this slot count are never shrunk
pub const SHRINK_MIN_CAPACITY: usize = 64;

/// Boundary between the "small" and "large" shrink rules
pub const SHRINK_LARGE_THRESHOLD: usize = 2048;

/// Small buffers shrink by half once capacity/length reaches this ratio
pub const SHRINK_SMALL_RATIO: usize = 4;

/// Large buffers shrink once capacity/length reaches this ratio
pub const SHRINK_LARGE_RATIO: usize = 2;

/// Large buffers shrink to this fraction of their capacity
pub const SHRINK_LARGE_FACTOR: f32 = 0.625;

// =============================================================================
// SEGMENT LOCK
// =============================================================================

/// Default number of segments for key locks
/// [PERF] 32 segments keep false sharing low for typical key counts
pub const DEFAULT_SEGMENT_COUNT: usize = 32;

/// FNV-1a 32-bit offset basis
pub const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime
pub const FNV32_PRIME: u32 = 0x0100_0193;
