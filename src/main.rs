/*!
 * AI-OS Sync - Demo Entry Point
 *
 * Drives a producer/consumer workload across the primitives:
 * - Bounded blocking queue with cancellable producers and consumers
 * - Priority queue scheduling of completed jobs
 * - Lock-free queue for audit records
 * - Per-key locking over a shared ledger
 *
 * Configured from the environment (SYNC_SEGMENTS, SYNC_WAITER_POOL,
 * SYNC_SHRINK, SYNC_DEMO_ITEMS, SYNC_DEMO_TIMEOUT_MS).
 */

use ai_os_sync::monitoring::span_operation;
use ai_os_sync::{
    init_tracing, ArrayBlockingQueue, ConcurrentPriorityQueue, Context, LockFreeQueue,
    PriorityQueue, QueueError, SegmentKeyLock, SyncConfig,
};
use anyhow::{Context as _, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const PRODUCERS: usize = 4;
const CONSUMERS: usize = 3;
const ACCOUNTS: [&str; 6] = ["alice", "bob", "carol", "dave", "erin", "frank"];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Job {
    priority: u32,
    id: u64,
    account: &'static str,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid value for {key}: {value}")),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<()> {
    // Initialize structured tracing
    init_tracing();

    info!("AI-OS Sync demo starting...");
    info!("================================================");

    let config = SyncConfig::from_env().context("loading sync configuration")?;
    let items: u64 = env_or("SYNC_DEMO_ITEMS", 10_000)?;
    let timeout_ms: u64 = env_or("SYNC_DEMO_TIMEOUT_MS", 30_000)?;
    info!(
        segments = config.segments,
        waiter_pool = config.waiter_pool_capacity,
        shrink = config.shrink.enabled,
        items,
        timeout_ms,
        "Configuration loaded"
    );

    let queue = Arc::new(ArrayBlockingQueue::<Job>::with_config(64, &config));
    let completed = Arc::new(ConcurrentPriorityQueue::from_queue(
        PriorityQueue::natural(0).with_shrink_policy(config.shrink),
    ));
    let audit = Arc::new(LockFreeQueue::new());
    let locks = Arc::new(SegmentKeyLock::with_config(&config));
    let ledger = Arc::new(Mutex::new(HashMap::<&'static str, u64>::new()));

    let root = Context::with_timeout(Duration::from_millis(timeout_ms));
    let started = Instant::now();

    info!(producers = PRODUCERS, consumers = CONSUMERS, "Starting workload");

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = queue.clone();
            let ctx = root.child();
            thread::Builder::new()
                .name(format!("producer-{p}"))
                .spawn(move || -> Result<u64, QueueError> {
                    let mut sent = 0;
                    for id in (p as u64..items).step_by(PRODUCERS) {
                        let job = Job {
                            priority: (id % 7) as u32,
                            id,
                            account: ACCOUNTS[id as usize % ACCOUNTS.len()],
                        };
                        queue.enqueue(&ctx, job)?;
                        sent += 1;
                    }
                    Ok(sent)
                })
        })
        .collect::<Result<_, _>>()?;

    // Consumers stop once the producers are done and the queue is drained
    let drain = root.child();
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|c| {
            let queue = queue.clone();
            let completed = completed.clone();
            let audit = audit.clone();
            let locks = locks.clone();
            let ledger = ledger.clone();
            let ctx = drain.clone();
            thread::Builder::new()
                .name(format!("consumer-{c}"))
                .spawn(move || -> u64 {
                    let mut handled = 0;
                    loop {
                        let job = match queue.dequeue(&ctx) {
                            Ok(job) => job,
                            Err(QueueError::Cancelled(_)) => match queue.try_dequeue() {
                                Ok(job) => job,
                                Err(_) => break,
                            },
                            Err(e) => {
                                warn!(error = %e, "unexpected dequeue failure");
                                break;
                            }
                        };

                        {
                            let _key = locks.lock(job.account);
                            *ledger.lock().entry(job.account).or_default() += job.id;
                        }
                        audit.enqueue(job.id);
                        if completed.enqueue(job).is_err() {
                            warn!("completed queue rejected job");
                        }
                        handled += 1;
                    }
                    handled
                })
        })
        .collect::<Result<_, _>>()?;

    let mut produced = 0;
    for handle in producers {
        match handle.join() {
            Ok(Ok(sent)) => produced += sent,
            Ok(Err(e)) => warn!(error = %e, "producer stopped early"),
            Err(_) => anyhow::bail!("producer thread panicked"),
        }
    }
    drain.cancel();

    let mut consumed = 0;
    for handle in consumers {
        consumed += handle
            .join()
            .map_err(|_| anyhow::anyhow!("consumer thread panicked"))?;
    }

    info!(
        produced,
        consumed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Workload complete"
    );

    let drain_span = span_operation("drain_completed");
    let mut last = None;
    let mut ordered = true;
    let mut drained = 0u64;
    while let Ok(job) = completed.dequeue() {
        if let Some(prev) = last.replace(job.priority) {
            ordered &= prev <= job.priority;
        }
        drained += 1;
    }
    drain_span.record_items(drained);
    drain_span.record_result(if ordered { "ordered" } else { "out_of_order" });
    drop(drain_span);

    let audited = std::iter::from_fn(|| audit.dequeue().ok()).count();
    let ledger_total: u64 = ledger.lock().values().sum();

    info!(
        audited,
        ordered,
        ledger_total,
        accounts = ledger.lock().len(),
        "Verification complete"
    );
    info!("================================================");

    if audited as u64 != consumed || !ordered {
        anyhow::bail!("verification failed: audited={audited} consumed={consumed} ordered={ordered}");
    }
    Ok(())
}
