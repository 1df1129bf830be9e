/*!
 * Lock-Free Queue
 *
 * Unbounded MPMC FIFO (Michael–Scott) with epoch-based reclamation.
 *
 * # Design
 *
 * - **Sentinel**: `head` always points at a dummy node; the first element lives
 *   in `head.next`. A dequeue makes that node the new sentinel.
 * - **Helping**: a lagging `tail` is swung forward by whichever thread notices,
 *   in both enqueue and dequeue, so the queue stays linearizable.
 * - **Reclamation**: unlinked sentinels are retired through `crossbeam-epoch`
 *   and freed once no pinned thread can still observe them.
 */

use super::traits::Queue;
use crate::core::errors::{QueueError, QueueResult};
use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use std::fmt;
use std::mem::MaybeUninit;
use std::ops::Deref;
use std::sync::atomic::{AtomicIsize, Ordering};

struct Node<T> {
    /// Uninitialized in the sentinel; moved out when a node becomes the sentinel
    data: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            data: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }
}

/// Keeps head and tail on separate cache lines
#[repr(align(64))]
struct CachePadded<T>(T);

impl<T> Deref for CachePadded<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

/// Lock-free unbounded FIFO queue
///
/// # Example
///
/// ```
/// use ai_os_sync::LockFreeQueue;
///
/// let queue = LockFreeQueue::new();
/// queue.enqueue(1);
/// queue.enqueue(2);
/// assert_eq!(queue.dequeue(), Ok(1));
/// assert_eq!(queue.dequeue(), Ok(2));
/// assert!(queue.dequeue().is_err());
/// ```
pub struct LockFreeQueue<T> {
    head: CachePadded<Atomic<Node<T>>>,
    tail: CachePadded<Atomic<Node<T>>>,
    /// Approximate; updated after the linearization point
    len: AtomicIsize,
}

// SAFETY: elements are moved in and out by value, never shared between threads
unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    pub fn new() -> Self {
        let queue = Self {
            head: CachePadded(Atomic::null()),
            tail: CachePadded(Atomic::null()),
            len: AtomicIsize::new(0),
        };

        // SAFETY: the queue is not shared yet
        unsafe {
            let guard = epoch::unprotected();
            let sentinel = Owned::new(Node::sentinel()).into_shared(guard);
            queue.head.store(sentinel, Ordering::Relaxed);
            queue.tail.store(sentinel, Ordering::Relaxed);
        }
        queue
    }

    /// Append `value`; never blocks and never fails
    pub fn enqueue(&self, value: T) {
        let guard = &epoch::pin();
        let node = Owned::new(Node {
            data: MaybeUninit::new(value),
            next: Atomic::null(),
        })
        .into_shared(guard);

        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: tail is never null and is only retired after head moved past it
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, guard);

            if tail != self.tail.load(Ordering::Acquire, guard) {
                continue;
            }

            if !next.is_null() {
                // Tail is lagging, help it along
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                continue;
            }

            if tail_ref
                .next
                .compare_exchange(
                    Shared::null(),
                    node,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                )
                .is_ok()
            {
                let _ = self.tail.compare_exchange(
                    tail,
                    node,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                self.len.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    }

    /// Remove the oldest committed element
    pub fn dequeue(&self) -> QueueResult<T> {
        let guard = &epoch::pin();
        self.pop(guard).ok_or(QueueError::EmptyQueue)
    }

    fn pop(&self, guard: &Guard) -> Option<T> {
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let tail = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: head is never null and is pinned by `guard`
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, guard);

            if head != self.head.load(Ordering::Acquire, guard) {
                continue;
            }

            // SAFETY: a non-null next is a live node reachable from head
            let next_ref = unsafe { next.as_ref() }?;

            if head == tail {
                // An enqueue linked `next` but has not swung tail yet
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                continue;
            }

            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                self.len.fetch_sub(1, Ordering::Relaxed);
                // SAFETY: winning the CAS gives exclusive ownership of next's
                // data; next is now the sentinel and its data is never read again.
                // The old head is unreachable and tail has moved past it.
                unsafe {
                    guard.defer_destroy(head);
                    return Some(next_ref.data.assume_init_read());
                }
            }
        }
    }

    /// Approximate number of elements
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed).max(0) as usize
    }

    /// True if no element was committed at the time of the check
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head = self.head.load(Ordering::Acquire, guard);
        // SAFETY: head is never null and is pinned by `guard`
        unsafe { head.deref() }
            .next
            .load(Ordering::Acquire, guard)
            .is_null()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can access the queue
        unsafe {
            let guard = epoch::unprotected();
            while self.pop(guard).is_some() {}
            let sentinel = self.head.load(Ordering::Relaxed, guard);
            drop(sentinel.into_owned());
        }
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LockFreeQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeQueue")
            .field("len", &self.len())
            .finish()
    }
}

impl<T> Queue<T> for LockFreeQueue<T> {
    fn enqueue(&self, value: T) -> QueueResult<()> {
        LockFreeQueue::enqueue(self, value);
        Ok(())
    }

    fn dequeue(&self) -> QueueResult<T> {
        LockFreeQueue::dequeue(self)
    }

    fn len(&self) -> usize {
        LockFreeQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        LockFreeQueue::is_empty(self)
    }
}
