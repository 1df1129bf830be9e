/*!
 * Lock-Free Queue Tests
 * Exactly-once delivery under concurrent producers and consumers
 */

use ai_os_sync::{LockFreeQueue, Queue, QueueError};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_empty_dequeue() {
    let queue: LockFreeQueue<String> = LockFreeQueue::default();
    assert_eq!(queue.dequeue(), Err(QueueError::EmptyQueue));
    assert!(queue.is_empty());
}

#[test]
fn test_mpmc_exactly_once() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 10_000;

    let queue = Arc::new(LockFreeQueue::new());
    let done = Arc::new(AtomicBool::new(false));

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = queue.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut got = Vec::new();
                loop {
                    match queue.dequeue() {
                        Ok(v) => got.push(v),
                        Err(_) if done.load(Ordering::Acquire) => {
                            // Drain whatever landed after the last empty read
                            got.extend(std::iter::from_fn(|| queue.dequeue().ok()));
                            break;
                        }
                        Err(_) => thread::yield_now(),
                    }
                }
                got
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.enqueue(p * PER_PRODUCER + i);
                }
            })
        })
        .collect();

    for h in producers {
        h.join().unwrap();
    }
    done.store(true, Ordering::Release);

    let mut seen = HashSet::new();
    for h in consumers {
        for v in h.join().unwrap() {
            assert!(seen.insert(v), "value {} dequeued twice", v);
        }
    }
    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_per_producer_order_preserved() {
    let queue = Arc::new(LockFreeQueue::new());

    let producers: Vec<_> = (0..2u32)
        .map(|p| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..5_000u32 {
                    queue.enqueue((p, i));
                }
            })
        })
        .collect();
    for h in producers {
        h.join().unwrap();
    }

    let mut last = [None::<u32>; 2];
    while let Ok((p, i)) = queue.dequeue() {
        let slot = &mut last[p as usize];
        assert!(slot.map_or(true, |prev| prev < i));
        *slot = Some(i);
    }
    assert_eq!(last, [Some(4_999), Some(4_999)]);
}

struct Tracked(Arc<AtomicUsize>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_every_element_dropped_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    let queue = Arc::new(LockFreeQueue::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            let drops = drops.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    queue.enqueue(Tracked(drops.clone()));
                    let _ = queue.dequeue();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for _ in 0..100 {
        queue.enqueue(Tracked(drops.clone()));
    }
    drop(queue);
    assert_eq!(drops.load(Ordering::SeqCst), 4_100);
}

#[test]
fn test_usable_as_queue_trait() {
    fn fill<Q: Queue<u8>>(queue: &Q) {
        for v in 0..3 {
            queue.enqueue(v).unwrap();
        }
    }
    let queue = LockFreeQueue::new();
    fill(&queue);
    assert_eq!(Queue::len(&queue), 3);
    assert_eq!(queue.dequeue(), Ok(0));
}
