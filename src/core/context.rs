/*!
 * Cancellation Context
 *
 * Cancellation token carried by every blocking operation. A context is either
 * live or cancelled; once cancelled it stays cancelled and reports a
 * [`CancelReason`].
 *
 * # Design
 *
 * - Contexts form a tree: cancelling a parent cancels every descendant with the
 *   same reason. A child's deadline is never later than its parent's.
 * - Deadlines are not driven by a timer thread. Blocked waiters park with
 *   `wait_until(deadline)` and observe expiry themselves; `err()` materializes the
 *   reason the first time it is seen.
 * - Waiters subscribe through [`CancelListener`] so an explicit `cancel()` wakes
 *   them immediately.
 */

use crate::core::errors::CancelReason;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Callback invoked once when a context is cancelled
///
/// Invoked outside the context's internal lock, so implementations may take
/// their own locks.
pub trait CancelListener: Send + Sync {
    fn on_cancel(&self, reason: CancelReason);
}

/// Cancellation token with optional deadline
///
/// Cheap to clone; clones share the same cancellation state.
///
/// # Example
///
/// ```
/// use ai_os_sync::Context;
/// use std::time::Duration;
///
/// let parent = Context::background();
/// let child = parent.child_with_timeout(Duration::from_secs(5));
///
/// parent.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    state: Mutex<ContextState>,
}

#[derive(Default)]
struct ContextState {
    reason: Option<CancelReason>,
    listeners: Vec<(u64, Weak<dyn CancelListener>)>,
    next_id: u64,
}

impl ContextInner {
    fn new(deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            state: Mutex::new(ContextState::default()),
        }
    }

    /// Current reason without firing listeners
    fn poll(&self) -> Option<CancelReason> {
        if let Some(reason) = self.state.lock().reason {
            return Some(reason);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Transition to cancelled. Returns false if already cancelled.
    fn cancel(&self, reason: CancelReason) -> bool {
        let listeners = {
            let mut state = self.state.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason);
            std::mem::take(&mut state.listeners)
        };

        for (_, listener) in listeners {
            if let Some(listener) = listener.upgrade() {
                listener.on_cancel(reason);
            }
        }
        true
    }

    fn attach(&self, listener: Weak<dyn CancelListener>) -> Result<u64, CancelReason> {
        let mut state = self.state.lock();
        if let Some(reason) = state.reason {
            return Err(reason);
        }
        state.listeners.retain(|(_, l)| l.strong_count() > 0);
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, listener));
        Ok(id)
    }

    fn detach(&self, id: u64) {
        self.state.lock().listeners.retain(|(lid, _)| *lid != id);
    }
}

impl CancelListener for ContextInner {
    fn on_cancel(&self, reason: CancelReason) {
        self.cancel(reason);
    }
}

impl Context {
    fn root(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(ContextInner::new(deadline)),
        }
    }

    /// Root context without deadline; only an explicit `cancel()` fires it
    pub fn background() -> Self {
        Self::root(None)
    }

    /// Root context that expires after `timeout`
    ///
    /// A timeout too large to represent as an `Instant` means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::root(deadline_after(timeout))
    }

    /// Root context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::root(Some(deadline))
    }

    /// Child that is cancelled together with this context
    pub fn child(&self) -> Self {
        self.derive(None)
    }

    /// Child with its own timeout (bounded by this context's deadline)
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        self.derive(deadline_after(timeout))
    }

    /// Child with its own deadline (bounded by this context's deadline)
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };

        let child = Self::root(deadline);
        let listener: Weak<dyn CancelListener> = Arc::downgrade(&child.inner) as Weak<dyn CancelListener>;
        if let Err(reason) = self.inner.attach(listener) {
            child.inner.cancel(reason);
        }
        child
    }

    /// Cancel this context and all of its descendants
    ///
    /// Returns `false` if it was already cancelled.
    pub fn cancel(&self) -> bool {
        self.inner.cancel(CancelReason::Cancelled)
    }

    /// Cancellation reason, or `None` while the context is live
    ///
    /// An expired deadline is recorded here and propagated to listeners.
    pub fn err(&self) -> Option<CancelReason> {
        let reason = self.inner.poll()?;
        if reason == CancelReason::DeadlineExceeded {
            self.inner.cancel(reason);
        }
        Some(reason)
    }

    /// Whether the context has fired
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Effective deadline, if any
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline (zero once passed)
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Reason check that never invokes listeners
    ///
    /// Safe to call while holding a lock that a listener might take.
    #[inline]
    pub(crate) fn poll_reason(&self) -> Option<CancelReason> {
        self.inner.poll()
    }

    /// Subscribe to cancellation
    ///
    /// The listener is held weakly and is dropped from the context when the
    /// returned [`Registration`] goes out of scope. If the context is already
    /// cancelled nothing is registered; callers must check `err()` afterwards.
    pub fn register(&self, listener: Weak<dyn CancelListener>) -> Registration {
        let id = self.inner.attach(listener).ok();
        Registration {
            ctx: Arc::downgrade(&self.inner),
            id,
        }
    }
}

/// `now + timeout`, or `None` if that overflows
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("reason", &self.inner.poll())
            .finish()
    }
}

/// Active cancellation subscription; unsubscribes on drop
#[must_use = "dropping the registration unsubscribes the listener"]
pub struct Registration {
    ctx: Weak<ContextInner>,
    id: Option<u64>,
}

impl Registration {
    /// Whether a listener was actually attached
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let (Some(id), Some(inner)) = (self.id, self.ctx.upgrade()) {
            inner.detach(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl CancelListener for Counter {
        fn on_cancel(&self, _reason: CancelReason) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert_eq!(ctx.err(), None);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let ctx = Context::background();
        assert!(ctx.cancel());
        assert!(!ctx.cancel());
        assert_eq!(ctx.err(), Some(CancelReason::Cancelled));
    }

    #[test]
    fn test_deadline_expires() {
        let ctx = Context::with_timeout(Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ctx.err(), Some(CancelReason::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_child_deadline_bounded_by_parent() {
        let parent = Context::with_timeout(Duration::from_millis(50));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_huge_timeout_means_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.err(), None);

        let child = Context::background().child_with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(child.deadline(), None);
    }

    #[test]
    fn test_huge_child_timeout_keeps_parent_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(5));
        let child = parent.child_with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_parent_cancel_propagates() {
        let parent = Context::background();
        let child = parent.child();
        let grandchild = child.child();

        parent.cancel();
        assert_eq!(child.err(), Some(CancelReason::Cancelled));
        assert_eq!(grandchild.err(), Some(CancelReason::Cancelled));
    }

    #[test]
    fn test_child_cancel_does_not_affect_parent() {
        let parent = Context::background();
        let child = parent.child();
        child.cancel();
        assert!(parent.err().is_none());
    }

    #[test]
    fn test_child_of_cancelled_parent_starts_cancelled() {
        let parent = Context::background();
        parent.cancel();
        assert_eq!(parent.child().err(), Some(CancelReason::Cancelled));
    }

    #[test]
    fn test_listener_fires_once_and_unregisters() {
        let ctx = Context::background();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let listener: Weak<dyn CancelListener> = Arc::downgrade(&counter) as Weak<dyn CancelListener>;

        let registration = ctx.register(listener.clone());
        assert!(registration.is_active());
        drop(registration);

        let _kept = ctx.register(listener);
        ctx.cancel();
        ctx.cancel();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_on_cancelled_context_is_inactive() {
        let ctx = Context::background();
        ctx.cancel();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let registration = ctx.register(Arc::downgrade(&counter) as Weak<dyn CancelListener>);
        assert!(!registration.is_active());
    }
}
