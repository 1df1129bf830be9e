/*!
 * Synchronization Traits
 *
 * Core abstractions shared by the condition variable and its users.
 */

use parking_lot::{MutexGuard, RwLockWriteGuard};

/// Result of a wake operation
///
/// Compact representation (single usize) for efficient returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    #[inline(always)]
    pub(crate) fn from_count(n: usize) -> Self {
        if n == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(n)
        }
    }

    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// A held lock that can be released for the duration of a closure
///
/// This is the "external lock" of a condition variable: the guard proves the
/// caller holds it, and `unlocked_for` releases it while the caller is parked,
/// re-acquiring it before returning.
pub trait Unlockable {
    fn unlocked_for<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R;
}

impl<T: ?Sized> Unlockable for MutexGuard<'_, T> {
    #[inline]
    fn unlocked_for<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        MutexGuard::unlocked(self, f)
    }
}

impl<T: ?Sized> Unlockable for RwLockWriteGuard<'_, T> {
    #[inline]
    fn unlocked_for<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RwLockWriteGuard::unlocked(self, f)
    }
}
