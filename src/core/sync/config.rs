/*!
 * Synchronization Configuration
 *
 * Runtime configuration for sizing the sync primitives
 */

use crate::core::errors::ConfigError;
use crate::core::limits::{
    DEFAULT_SEGMENT_COUNT, SHRINK_LARGE_FACTOR, SHRINK_LARGE_RATIO, SHRINK_LARGE_THRESHOLD,
    SHRINK_MIN_CAPACITY, SHRINK_SMALL_RATIO, WAITER_POOL_CAPACITY,
};
use serde::{Deserialize, Serialize};

/// Buffer shrink policy for unbounded priority queues
///
/// With `c` the slot capacity and `l` the slot length (both counting the
/// reserved root slot):
/// - `c <= min_capacity`: keep
/// - `c <= large_threshold` and `c / l >= small_ratio`: shrink to `c / 2`
/// - `c > large_threshold` and `c / l >= large_ratio`: shrink to `c * large_factor`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkPolicy {
    pub enabled: bool,
    pub min_capacity: usize,
    pub large_threshold: usize,
    pub small_ratio: usize,
    pub large_ratio: usize,
    pub large_factor: f32,
}

impl Default for ShrinkPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_capacity: SHRINK_MIN_CAPACITY,
            large_threshold: SHRINK_LARGE_THRESHOLD,
            small_ratio: SHRINK_SMALL_RATIO,
            large_ratio: SHRINK_LARGE_RATIO,
            large_factor: SHRINK_LARGE_FACTOR,
        }
    }
}

impl ShrinkPolicy {
    /// Policy that never shrinks
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// New capacity for a buffer of `capacity` slots holding `len`, if it should shrink
    pub fn next_capacity(&self, capacity: usize, len: usize) -> Option<usize> {
        if !self.enabled || capacity <= self.min_capacity {
            return None;
        }
        let ratio = capacity / len.max(1);
        if capacity > self.large_threshold && ratio >= self.large_ratio {
            return Some((capacity as f32 * self.large_factor) as usize);
        }
        if capacity <= self.large_threshold && ratio >= self.small_ratio {
            return Some(capacity / 2);
        }
        None
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Stripes of a [`SegmentKeyLock`](crate::SegmentKeyLock)
    pub segments: usize,
    /// Idle waiters kept per condition variable
    pub waiter_pool_capacity: usize,
    /// Shrink policy of unbounded priority queues
    pub shrink: ShrinkPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENT_COUNT,
            waiter_pool_capacity: WAITER_POOL_CAPACITY,
            shrink: ShrinkPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Configuration for memory-constrained deployments
    pub fn low_memory() -> Self {
        Self {
            segments: 8,
            waiter_pool_capacity: 8,
            shrink: ShrinkPolicy {
                min_capacity: 16,
                ..ShrinkPolicy::default()
            },
        }
    }

    /// Configuration for many threads hammering the same primitives
    pub fn high_contention() -> Self {
        Self {
            segments: 256,
            waiter_pool_capacity: 1024,
            shrink: ShrinkPolicy::disabled(),
        }
    }

    /// Load from environment variables, falling back to defaults
    ///
    /// - `SYNC_SEGMENTS`: segment count
    /// - `SYNC_WAITER_POOL`: waiter pool capacity
    /// - `SYNC_SHRINK`: `on`/`off`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("SYNC_SEGMENTS") {
            config.segments = parse_usize("SYNC_SEGMENTS", &value)?;
        }
        if let Some(value) = lookup("SYNC_WAITER_POOL") {
            config.waiter_pool_capacity = parse_usize("SYNC_WAITER_POOL", &value)?;
        }
        if let Some(value) = lookup("SYNC_SHRINK") {
            config.shrink.enabled = match value.trim().to_ascii_lowercase().as_str() {
                "on" | "true" | "1" => true,
                "off" | "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SYNC_SHRINK".into(),
                        value,
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the primitives cannot be built with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments == 0 {
            return Err(ConfigError::Zero {
                key: "segments".into(),
            });
        }
        if self.waiter_pool_capacity == 0 {
            return Err(ConfigError::Zero {
                key: "waiter_pool_capacity".into(),
            });
        }
        Ok(())
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
        })
}
