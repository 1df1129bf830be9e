/*!
 * Blocking Queue Storage
 * Element containers behind the blocking queues (ring buffer, linked list)
 */

use std::collections::LinkedList;

/// FIFO container guarded by a blocking queue's lock
pub trait Storage {
    type Item;

    /// Append `item`
    ///
    /// # Panics
    ///
    /// Panics if the storage is full; callers check [`is_full`](Self::is_full) first.
    fn push_back(&mut self, item: Self::Item);

    fn pop_front(&mut self) -> Option<Self::Item>;

    fn len(&self) -> usize;

    /// Maximum number of elements, `None` if unbounded
    fn capacity(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.capacity().map_or(false, |cap| self.len() >= cap)
    }

    /// Copy of the contents in FIFO order
    fn to_vec(&self) -> Vec<Self::Item>
    where
        Self::Item: Clone;
}

/// Fixed-capacity ring buffer
///
/// Presence is tracked by `count`, not slot contents; a dequeued slot is left
/// `None` so it does not keep the old element alive.
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> RingBuffer<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Index of the oldest element
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Index the next element will be written to
    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }
}

impl<T> Storage for RingBuffer<T> {
    type Item = T;

    fn push_back(&mut self, item: T) {
        assert!(
            self.count < self.slots.len(),
            "push into full ring buffer (capacity {})",
            self.slots.len()
        );
        self.slots[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
    }

    fn pop_front(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        item
    }

    #[inline]
    fn len(&self) -> usize {
        self.count
    }

    #[inline]
    fn capacity(&self) -> Option<usize> {
        Some(self.slots.len())
    }

    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let cap = self.slots.len();
        (0..self.count)
            .filter_map(|i| self.slots[(self.head + i) % cap].clone())
            .collect()
    }
}

/// Linked-list storage, optionally bounded
pub struct LinkedStorage<T> {
    list: LinkedList<T>,
    capacity: Option<usize>,
}

impl<T> LinkedStorage<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            list: LinkedList::new(),
            capacity: Some(capacity),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            list: LinkedList::new(),
            capacity: None,
        }
    }
}

impl<T> Storage for LinkedStorage<T> {
    type Item = T;

    fn push_back(&mut self, item: T) {
        assert!(!self.is_full(), "push into full linked storage");
        self.list.push_back(item);
    }

    fn pop_front(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    #[inline]
    fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.list.iter().cloned().collect()
    }
}
