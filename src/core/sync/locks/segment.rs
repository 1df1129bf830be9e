/*!
 * Segmented Key Lock
 * Per-key mutual exclusion by striping keys over a fixed array of RW locks
 */

use crate::core::limits::{FNV32_OFFSET_BASIS, FNV32_PRIME};
use crate::core::sync::config::SyncConfig;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// FNV-1a 32-bit hash
#[inline]
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV32_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV32_PRIME)
    })
}

/// Lock-striped per-key locks
///
/// Keys are hashed with FNV-1a and mapped to `hash % segments`. Distinct keys
/// may share a segment, in which case they exclude each other. Unlocking is
/// dropping the returned guard.
///
/// # Deadlocks
///
/// Holding several segments at once requires acquiring them in a consistent
/// order. [`lock_many`](Self::lock_many) does this by ascending segment index.
///
/// # Example
///
/// ```
/// use ai_os_sync::SegmentKeyLock;
///
/// let locks = SegmentKeyLock::new(8);
/// {
///     let _guard = locks.lock("user:42");
///     assert!(locks.try_rlock("user:42").is_none());
/// }
/// assert!(locks.try_lock("user:42").is_some());
/// ```
pub struct SegmentKeyLock {
    segments: Box<[RwLock<()>]>,
}

impl SegmentKeyLock {
    /// Create a key lock with `segments` stripes
    ///
    /// # Panics
    ///
    /// Panics if `segments` is zero.
    pub fn new(segments: usize) -> Self {
        assert!(segments > 0, "SegmentKeyLock needs at least one segment");
        Self {
            segments: (0..segments).map(|_| RwLock::new(())).collect(),
        }
    }

    /// Create a key lock sized from configuration
    pub fn with_config(config: &SyncConfig) -> Self {
        Self::new(config.segments)
    }

    /// Number of segments
    #[inline]
    pub fn segments(&self) -> usize {
        self.segments.len()
    }

    /// Segment a key maps to
    #[inline]
    pub fn segment_index<K: AsRef<[u8]>>(&self, key: K) -> usize {
        fnv1a_32(key.as_ref()) as usize % self.segments.len()
    }

    /// Exclusive lock for `key`
    pub fn lock<K: AsRef<[u8]>>(&self, key: K) -> RwLockWriteGuard<'_, ()> {
        self.segments[self.segment_index(key)].write()
    }

    /// Shared lock for `key`
    pub fn rlock<K: AsRef<[u8]>>(&self, key: K) -> RwLockReadGuard<'_, ()> {
        self.segments[self.segment_index(key)].read()
    }

    /// Exclusive lock for `key` if immediately available
    pub fn try_lock<K: AsRef<[u8]>>(&self, key: K) -> Option<RwLockWriteGuard<'_, ()>> {
        self.segments[self.segment_index(key)].try_write()
    }

    /// Shared lock for `key` if immediately available
    pub fn try_rlock<K: AsRef<[u8]>>(&self, key: K) -> Option<RwLockReadGuard<'_, ()>> {
        self.segments[self.segment_index(key)].try_read()
    }

    /// Exclusive locks for several keys, taken in ascending segment order
    ///
    /// Keys sharing a segment are covered by a single guard.
    pub fn lock_many<I, K>(&self, keys: I) -> Vec<RwLockWriteGuard<'_, ()>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut indices: Vec<usize> = keys.into_iter().map(|k| self.segment_index(k)).collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(|i| self.segments[i].write()).collect()
    }
}

impl Default for SegmentKeyLock {
    fn default() -> Self {
        Self::with_config(&SyncConfig::default())
    }
}
