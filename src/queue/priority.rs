/*!
 * Priority Queue
 * Min-heap ordered by a caller-supplied comparator (smallest element first)
 *
 * Capacity is tracked in slots that include one reserved root slot, so a
 * bounded queue of capacity `n` occupies `n + 1` slots and an unbounded one
 * starts with [`DEFAULT_UNBOUNDED_SLOTS`]. Unbounded queues double their slots
 * when full and consult their [`ShrinkPolicy`] after every dequeue.
 */

use crate::core::compare::{Compare, NaturalOrder};
use crate::core::errors::{QueueError, QueueResult};
use crate::core::limits::DEFAULT_UNBOUNDED_SLOTS;
use crate::core::sync::ShrinkPolicy;
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Binary min-heap
///
/// Not thread-safe; see [`ConcurrentPriorityQueue`](super::ConcurrentPriorityQueue).
///
/// # Example
///
/// ```
/// use ai_os_sync::{PriorityQueue, Reverse, NaturalOrder};
///
/// let mut queue = PriorityQueue::new(0, Reverse(NaturalOrder));
/// for n in [3, 9, 1] {
///     queue.enqueue(n).unwrap();
/// }
/// assert_eq!(queue.dequeue(), Ok(9));
/// ```
pub struct PriorityQueue<T, C = NaturalOrder> {
    heap: Vec<T>,
    /// 0 = unbounded
    capacity: usize,
    /// Slot capacity including the reserved root slot
    slots: usize,
    compare: C,
    shrink: ShrinkPolicy,
}

impl<T: Ord> PriorityQueue<T, NaturalOrder> {
    /// Queue ordered by `T`'s natural order; `capacity` 0 means unbounded
    pub fn natural(capacity: usize) -> Self {
        Self::new(capacity, NaturalOrder)
    }
}

impl<T, C: Compare<T>> PriorityQueue<T, C> {
    /// Create a queue; `capacity` 0 means unbounded
    pub fn new(capacity: usize, compare: C) -> Self {
        let slots = if capacity == 0 {
            DEFAULT_UNBOUNDED_SLOTS
        } else {
            capacity + 1
        };
        Self::with_slots(capacity, slots, compare)
    }

    pub fn unbounded(compare: C) -> Self {
        Self::new(0, compare)
    }

    /// Unbounded queue with room for `reserve` elements before growing
    pub fn unbounded_with_reserve(reserve: usize, compare: C) -> Self {
        Self::with_slots(0, reserve + 1, compare)
    }

    fn with_slots(capacity: usize, slots: usize, compare: C) -> Self {
        Self {
            heap: Vec::with_capacity(slots - 1),
            capacity,
            slots,
            compare,
            shrink: ShrinkPolicy::default(),
        }
    }

    /// Replace the shrink policy (only consulted when unbounded)
    pub fn with_shrink_policy(mut self, policy: ShrinkPolicy) -> Self {
        self.shrink = policy;
        self
    }

    /// Insert `value`
    ///
    /// Fails with `OutOfCapacity` when a bounded queue is full; an unbounded
    /// queue grows instead.
    pub fn enqueue(&mut self, value: T) -> QueueResult<()> {
        if self.is_full() {
            return Err(QueueError::OutOfCapacity);
        }
        if self.capacity == 0 && self.heap.len() + 1 >= self.slots {
            self.grow();
        }

        self.heap.push(value);
        self.sift_up(self.heap.len() - 1);
        Ok(())
    }

    /// Remove and return the smallest element
    pub fn dequeue(&mut self) -> QueueResult<T> {
        if self.heap.is_empty() {
            return Err(QueueError::EmptyQueue);
        }

        let top = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        if self.capacity == 0 {
            self.maybe_shrink();
        }
        Ok(top)
    }

    /// Smallest element without removing it
    pub fn peek(&self) -> QueueResult<&T> {
        self.heap.first().ok_or(QueueError::EmptyQueue)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Configured capacity, 0 if unbounded
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.heap.len() >= self.capacity
    }

    /// Elements the current buffer holds before it must grow
    #[inline]
    pub fn reserved(&self) -> usize {
        self.slots - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter()
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.compare.compare(&self.heap[a], &self.heap[b]) == Ordering::Less
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.less(idx, parent) {
                break;
            }
            self.heap.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * idx + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            // Left wins ties
            let child = if right < len && self.less(right, left) {
                right
            } else {
                left
            };
            if !self.less(child, idx) {
                break;
            }
            self.heap.swap(idx, child);
            idx = child;
        }
    }

    fn grow(&mut self) {
        let slots = self.slots * 2;
        self.heap.reserve_exact(slots - 1 - self.heap.len());
        debug!(from = self.slots, to = slots, "priority queue grown");
        self.slots = slots;
    }

    fn maybe_shrink(&mut self) {
        let Some(slots) = self.shrink.next_capacity(self.slots, self.heap.len() + 1) else {
            return;
        };

        let mut heap = Vec::with_capacity(slots - 1);
        heap.append(&mut self.heap);
        self.heap = heap;
        debug!(from = self.slots, to = slots, len = self.heap.len(), "priority queue shrunk");
        self.slots = slots;
    }
}

impl<T: fmt::Debug, C> fmt::Debug for PriorityQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.heap.len())
            .field("capacity", &self.capacity)
            .field("slots", &self.slots)
            .field("heap", &self.heap)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compare::{ByKey, Reverse};

    fn drain<T, C: Compare<T>>(queue: &mut PriorityQueue<T, C>) -> Vec<T> {
        std::iter::from_fn(|| queue.dequeue().ok()).collect()
    }

    #[test]
    fn test_min_order() {
        let mut queue = PriorityQueue::natural(0);
        for n in [5, 3, 8, 1, 9, 2] {
            queue.enqueue(n).unwrap();
        }
        assert_eq!(queue.peek(), Ok(&1));
        assert_eq!(drain(&mut queue), vec![1, 2, 3, 5, 8, 9]);
        assert_eq!(queue.peek(), Err(QueueError::EmptyQueue));
        assert_eq!(queue.dequeue(), Err(QueueError::EmptyQueue));
    }

    #[test]
    fn test_bounded_capacity() {
        let mut queue = PriorityQueue::natural(2);
        queue.enqueue(2).unwrap();
        queue.enqueue(1).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.enqueue(0), Err(QueueError::OutOfCapacity));
        assert_eq!(queue.capacity(), 2);
        assert_eq!(queue.reserved(), 2);
        assert_eq!(drain(&mut queue), vec![1, 2]);
    }

    #[test]
    fn test_unbounded_grows() {
        let mut queue = PriorityQueue::natural(0);
        assert_eq!(queue.reserved(), DEFAULT_UNBOUNDED_SLOTS - 1);
        for n in (0..200).rev() {
            queue.enqueue(n).unwrap();
        }
        assert_eq!(queue.reserved(), 255);
        assert!(!queue.is_full());
        assert_eq!(queue.capacity(), 0);
    }

    #[test]
    fn test_shrink_after_dequeue() {
        let mut queue = PriorityQueue::unbounded_with_reserve(1000, NaturalOrder);
        for n in 0..20 {
            queue.enqueue(n).unwrap();
        }
        for _ in 0..5 {
            queue.dequeue().unwrap();
        }
        assert_eq!(queue.len(), 15);
        assert_eq!(queue.reserved(), 61);
        assert_eq!(queue.peek(), Ok(&5));
    }

    #[test]
    fn test_shrink_disabled() {
        let mut queue = PriorityQueue::unbounded_with_reserve(1000, NaturalOrder)
            .with_shrink_policy(ShrinkPolicy::disabled());
        for n in 0..20 {
            queue.enqueue(n).unwrap();
        }
        for _ in 0..5 {
            queue.dequeue().unwrap();
        }
        assert_eq!(queue.reserved(), 1000);
    }

    #[test]
    fn test_bounded_never_shrinks() {
        let mut queue = PriorityQueue::natural(1000);
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();
        queue.dequeue().unwrap();
        assert_eq!(queue.reserved(), 1000);
    }

    #[test]
    fn test_custom_comparators() {
        let mut max = PriorityQueue::new(0, Reverse(NaturalOrder));
        for n in [1, 7, 3] {
            max.enqueue(n).unwrap();
        }
        assert_eq!(drain(&mut max), vec![7, 3, 1]);

        let mut by_len = PriorityQueue::unbounded(ByKey(|s: &&str| s.len()));
        for s in ["ccc", "a", "bb"] {
            by_len.enqueue(s).unwrap();
        }
        assert_eq!(drain(&mut by_len), vec!["a", "bb", "ccc"]);

        let mut closure = PriorityQueue::unbounded(|a: &i32, b: &i32| b.cmp(a));
        closure.enqueue(1).unwrap();
        closure.enqueue(2).unwrap();
        assert_eq!(closure.dequeue(), Ok(2));
    }
}
