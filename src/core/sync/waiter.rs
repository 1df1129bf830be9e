/*!
 * Waiter List
 *
 * FIFO of suspended callers, each owning a single-shot notification signal.
 *
 * # Design: Index Arena Over Pointer Links
 *
 * The doubly linked list lives in a `Vec` of nodes addressed by index, with
 * slot 0 as the sentinel. Freed slots are recycled through a free list, so a
 * steady-state condition variable stops allocating nodes. Every node carries a
 * ticket; a stale handle whose slot was recycled no longer matches and cannot
 * unlink someone else's waiter.
 *
 * Signals are pooled separately (lock-free `ArrayQueue`) and only return to the
 * pool once their owner has left the wait, i.e. after the single notification
 * was consumed or the waiter was unlinked without one.
 */

use crate::core::context::{CancelListener, Context};
use crate::core::errors::CancelReason;
use crate::core::limits::WAITER_POOL_CAPACITY;
use crossbeam_queue::ArrayQueue;
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use tracing::trace;

const SENTINEL: usize = 0;

/// Single-shot notification: at most one pending notification, consumed once
pub(crate) struct WaiterSignal {
    notified: Mutex<bool>,
    condvar: Condvar,
}

impl WaiterSignal {
    fn new() -> Self {
        Self {
            notified: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Deliver the notification. Returns false if one is already pending.
    fn notify(&self) -> bool {
        let mut notified = self.notified.lock();
        if *notified {
            return false;
        }
        *notified = true;
        self.condvar.notify_one();
        true
    }

    /// Consume a pending notification
    fn take(&self) -> bool {
        std::mem::replace(&mut *self.notified.lock(), false)
    }

    fn reset(&self) {
        *self.notified.lock() = false;
    }

    /// Park until notified or until `ctx` fires
    ///
    /// A pending notification wins over a simultaneous cancellation.
    fn block(self: &Arc<Self>, ctx: &Context) -> Result<(), CancelReason> {
        let listener: Weak<dyn CancelListener> = Arc::downgrade(self) as Weak<dyn CancelListener>;
        let _registration = ctx.register(listener);

        let mut notified = self.notified.lock();
        loop {
            if *notified {
                *notified = false;
                return Ok(());
            }
            // poll_reason: err() could call back into on_cancel and self-deadlock
            if let Some(reason) = ctx.poll_reason() {
                return Err(reason);
            }
            match ctx.deadline() {
                Some(deadline) => {
                    self.condvar.wait_until(&mut notified, deadline);
                }
                None => self.condvar.wait(&mut notified),
            }
        }
    }
}

impl CancelListener for WaiterSignal {
    fn on_cancel(&self, _reason: CancelReason) {
        let _notified = self.notified.lock();
        self.condvar.notify_all();
    }
}

/// Handle of a linked waiter, exclusively owned by the suspended caller
pub struct Waiter {
    slot: usize,
    ticket: u64,
    signal: Arc<WaiterSignal>,
}

impl Waiter {
    /// Monotonic position in the list's arrival order
    #[inline]
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Park until notified or cancelled
    ///
    /// On `Err` the caller must resolve the race with [`WaiterList::abandon`].
    pub fn wait(&self, ctx: &Context) -> Result<(), CancelReason> {
        self.signal.block(ctx)
    }
}

struct Node {
    prev: usize,
    next: usize,
    ticket: u64,
    signal: Option<Arc<WaiterSignal>>,
}

impl Node {
    const fn sentinel() -> Self {
        Self {
            prev: SENTINEL,
            next: SENTINEL,
            ticket: 0,
            signal: None,
        }
    }
}

struct Links {
    nodes: Vec<Node>,
    free: Vec<usize>,
    len: usize,
    next_ticket: u64,
}

impl Links {
    fn new() -> Self {
        Self {
            nodes: vec![Node::sentinel()],
            free: Vec::new(),
            len: 0,
            next_ticket: 1,
        }
    }

    fn push_back(&mut self, signal: Arc<WaiterSignal>) -> (usize, u64) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let tail = self.nodes[SENTINEL].prev;
        let node = Node {
            prev: tail,
            next: SENTINEL,
            ticket,
            signal: Some(signal),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        self.nodes[tail].next = slot;
        self.nodes[SENTINEL].prev = slot;
        self.len += 1;
        (slot, ticket)
    }

    fn is_linked(&self, slot: usize, ticket: u64) -> bool {
        self.nodes
            .get(slot)
            .map_or(false, |n| n.ticket == ticket && n.signal.is_some())
    }

    fn unlink(&mut self, slot: usize) -> Option<Arc<WaiterSignal>> {
        let signal = self.nodes[slot].signal.take()?;
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.free.push(slot);
        self.len -= 1;
        Some(signal)
    }

    fn front(&self) -> Option<usize> {
        let head = self.nodes[SENTINEL].next;
        (head != SENTINEL).then_some(head)
    }

    /// Unlink the oldest waiter and hand it its notification
    fn notify_front(&mut self) -> bool {
        let Some(slot) = self.front() else {
            return false;
        };
        if let Some(signal) = self.unlink(slot) {
            signal.notify();
        }
        true
    }
}

/// FIFO of suspended callers with pooled notification signals
///
/// All list operations are serialized by an internal mutex.
pub struct WaiterList {
    links: Mutex<Links>,
    pool: ArrayQueue<Arc<WaiterSignal>>,
}

impl WaiterList {
    /// Create an empty list with the default signal pool size
    pub fn new() -> Self {
        Self::with_pool_capacity(WAITER_POOL_CAPACITY)
    }

    /// Create an empty list keeping at most `capacity` idle signals
    pub fn with_pool_capacity(capacity: usize) -> Self {
        Self {
            links: Mutex::new(Links::new()),
            pool: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// Link a fresh waiter at the tail
    pub fn add(&self) -> Waiter {
        let signal = self
            .pool
            .pop()
            .unwrap_or_else(|| Arc::new(WaiterSignal::new()));
        let (slot, ticket) = self.links.lock().push_back(Arc::clone(&signal));
        Waiter {
            slot,
            ticket,
            signal,
        }
    }

    /// Unlink a waiter that has not been notified
    ///
    /// Returns false if it was no longer in the list.
    pub fn remove(&self, waiter: &Waiter) -> bool {
        let mut links = self.links.lock();
        if !links.is_linked(waiter.slot, waiter.ticket) {
            return false;
        }
        links.unlink(waiter.slot).is_some()
    }

    /// Resolve a cancelled wait
    ///
    /// If the waiter is still linked it is removed. Otherwise a notifier already
    /// unlinked it and delivered its notification; that notification is consumed
    /// and forwarded to the next waiter so the signal is not lost. Returns true if
    /// a notification was forwarded.
    pub fn abandon(&self, waiter: &Waiter) -> bool {
        let mut links = self.links.lock();
        if links.is_linked(waiter.slot, waiter.ticket) {
            links.unlink(waiter.slot);
            return false;
        }
        if !waiter.signal.take() {
            return false;
        }
        let forwarded = links.notify_front();
        trace!(
            ticket = waiter.ticket,
            forwarded,
            "cancelled waiter passed its notification on"
        );
        forwarded
    }

    /// Return a finished waiter's signal to the pool
    pub fn release(&self, waiter: Waiter) {
        waiter.signal.reset();
        // Full pool: the signal is simply dropped
        let _ = self.pool.push(waiter.signal);
    }

    /// Wake the oldest waiter. Returns false if the list was empty.
    pub fn notify_one(&self) -> bool {
        self.links.lock().notify_front()
    }

    /// Wake every waiter in FIFO order. Returns how many were woken.
    pub fn notify_all(&self) -> usize {
        let mut links = self.links.lock();
        let mut woken = 0;
        while links.notify_front() {
            woken += 1;
        }
        woken
    }

    /// Ticket of the oldest waiter
    pub fn front(&self) -> Option<u64> {
        let links = self.links.lock();
        links.front().map(|slot| links.nodes[slot].ticket)
    }

    /// Number of linked waiters
    pub fn len(&self) -> usize {
        self.links.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WaiterList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_front_and_len() {
        let list = WaiterList::new();
        let a = list.add();
        let b = list.add();
        let c = list.add();

        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(a.ticket()));

        assert!(list.remove(&b));
        assert!(!list.remove(&b));
        assert_eq!(list.len(), 2);

        assert!(list.notify_one());
        assert_eq!(list.front(), Some(c.ticket()));
        assert!(a.signal.take());
        assert!(!c.signal.take());
    }

    #[test]
    fn test_notify_all_empties_list() {
        let list = WaiterList::new();
        let waiters: Vec<_> = (0..4).map(|_| list.add()).collect();

        assert_eq!(list.notify_all(), 4);
        assert!(list.is_empty());
        assert!(!list.notify_one());
        for w in &waiters {
            assert!(w.signal.take());
        }
    }

    #[test]
    fn test_stale_handle_cannot_unlink_recycled_slot() {
        let list = WaiterList::new();
        let first = list.add();
        assert!(list.remove(&first));

        let second = list.add();
        assert_eq!(second.slot, first.slot);
        assert!(!list.remove(&first));
        assert_eq!(list.len(), 1);
        assert!(list.remove(&second));
    }

    #[test]
    fn test_abandon_linked_waiter_just_unlinks() {
        let list = WaiterList::new();
        let a = list.add();
        let b = list.add();

        assert!(!list.abandon(&a));
        assert_eq!(list.front(), Some(b.ticket()));
        assert!(!b.signal.take());
    }

    #[test]
    fn test_abandon_forwards_delivered_notification() {
        let list = WaiterList::new();
        let a = list.add();
        let b = list.add();

        // a is signalled, then observes its cancellation before consuming
        assert!(list.notify_one());
        assert!(list.abandon(&a));

        assert!(list.is_empty());
        assert!(b.signal.take());
        assert!(!a.signal.take());
    }

    #[test]
    fn test_abandon_without_successor_drops_notification() {
        let list = WaiterList::new();
        let a = list.add();
        list.notify_one();
        assert!(!list.abandon(&a));
        assert!(!a.signal.take());
    }

    #[test]
    fn test_released_signal_is_reused_clean() {
        let list = WaiterList::with_pool_capacity(1);
        let a = list.add();
        list.notify_one();
        let ptr = Arc::as_ptr(&a.signal);
        list.release(a);

        let b = list.add();
        assert_eq!(Arc::as_ptr(&b.signal), ptr);
        assert!(!b.signal.take());
    }

    #[test]
    fn test_wait_returns_on_notify() {
        let list = Arc::new(WaiterList::new());
        let waiter = list.add();

        let notifier = {
            let list = list.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                list.notify_one()
            })
        };

        assert_eq!(waiter.wait(&Context::background()), Ok(()));
        assert!(notifier.join().unwrap());
    }

    #[test]
    fn test_wait_observes_cancel() {
        let list = WaiterList::new();
        let waiter = list.add();
        let ctx = Context::background();

        let canceller = {
            let ctx = ctx.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                ctx.cancel();
            })
        };

        assert_eq!(waiter.wait(&ctx), Err(CancelReason::Cancelled));
        canceller.join().unwrap();
        assert!(!list.abandon(&waiter));
        assert!(list.is_empty());
    }
}
