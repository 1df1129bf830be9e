/*!
 * Cancellable Condition Variable
 *
 * Condition variable whose `wait` can be abandoned through a [`Context`].
 *
 * # Protocol
 *
 * 1. The caller holds the external lock (proved by its guard).
 * 2. `wait` links a fresh waiter at the tail of the FIFO *before* releasing the
 *    lock, so a `signal` issued right after the release cannot miss it.
 * 3. The caller parks until notified or until the context fires.
 * 4. On cancellation the waiter unlinks itself, or, if a signal already picked
 *    it, forwards that signal to the next waiter.
 * 5. The lock is re-acquired before `wait` returns, on every path.
 *
 * Wakeups are FIFO: `signal` always wakes the oldest waiter.
 */

use super::traits::{Unlockable, WakeResult};
use super::waiter::WaiterList;
use crate::core::context::Context;
use crate::core::errors::CancelReason;
use crate::core::limits::WAITER_POOL_CAPACITY;
use std::fmt;
use std::sync::OnceLock;
use tracing::trace;

/// Context-aware condition variable with FIFO wakeup
///
/// The waiter list is created lazily on first use, so a cond can be built in a
/// `const` context (e.g. a `static`).
///
/// # Example
///
/// ```
/// use ai_os_sync::{CancellableCond, Context};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
/// use std::thread;
///
/// let pair = Arc::new((Mutex::new(false), CancellableCond::new()));
/// let pair2 = pair.clone();
///
/// thread::spawn(move || {
///     let (lock, cond) = &*pair2;
///     *lock.lock() = true;
///     cond.signal();
/// });
///
/// let (lock, cond) = &*pair;
/// let mut ready = lock.lock();
/// while !*ready {
///     cond.wait(&mut ready, &Context::background()).unwrap();
/// }
/// ```
pub struct CancellableCond {
    waiters: OnceLock<WaiterList>,
    pool_capacity: usize,
}

impl CancellableCond {
    /// Create a condition variable with the default waiter pool
    pub const fn new() -> Self {
        Self::with_pool_capacity(WAITER_POOL_CAPACITY)
    }

    /// Create a condition variable keeping at most `capacity` idle waiters
    pub const fn with_pool_capacity(capacity: usize) -> Self {
        Self {
            waiters: OnceLock::new(),
            pool_capacity: capacity,
        }
    }

    #[inline]
    fn waiters(&self) -> &WaiterList {
        self.waiters
            .get_or_init(|| WaiterList::with_pool_capacity(self.pool_capacity))
    }

    /// Release `guard`'s lock, park until signalled or cancelled, re-acquire
    ///
    /// Returns `Ok(())` on a normal wakeup and the context's reason if it fired
    /// first. Like any condition variable, callers re-check their predicate in a
    /// loop.
    pub fn wait<G>(&self, guard: &mut G, ctx: &Context) -> Result<(), CancelReason>
    where
        G: Unlockable,
    {
        let waiters = self.waiters();
        let waiter = waiters.add();

        let result = guard.unlocked_for(|| {
            let outcome = waiter.wait(ctx);
            if let Err(reason) = outcome {
                let forwarded = waiters.abandon(&waiter);
                trace!(
                    ticket = waiter.ticket(),
                    %reason,
                    forwarded,
                    "cond wait cancelled"
                );
            }
            outcome
        });

        waiters.release(waiter);
        result
    }

    /// Wake the oldest waiter, if any
    ///
    /// May be called with or without the external lock held.
    pub fn signal(&self) -> WakeResult {
        WakeResult::from_count(usize::from(self.waiters().notify_one()))
    }

    /// Wake every waiter, oldest first
    pub fn broadcast(&self) -> WakeResult {
        WakeResult::from_count(self.waiters().notify_all())
    }

    /// Number of callers currently parked in `wait` (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.waiters.get().map_or(0, WaiterList::len)
    }
}

impl Default for CancellableCond {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellableCond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellableCond")
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
