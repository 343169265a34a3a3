//! Stress test - readers, writers and pool churn
//!
//! Hammers one FairRwLock with a pool full of reader tasks and periodic
//! writer tasks, checking the exclusion invariants the whole time. This is
//! the shape of real engine load: many concurrent searches against a shared
//! reader snapshot, with occasional swap-in writers that must not starve.

use idxsync::{env_get, FairRwLock, Lockable, ReadLock, ScopedLock, ThreadPool, WriteLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

struct Shared {
    lock: FairRwLock,
    readers_in: AtomicUsize,
    violations: AtomicUsize,
}

fn main() {
    println!("=== idxsync Stress Test ===\n");
    idxsync::init_logging();

    let tasks: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| env_get("IDX_STRESS_TASKS", 10_000));
    let workers: usize = env_get("IDX_STRESS_WORKERS", 8);
    let write_every: usize = env_get("IDX_STRESS_WRITE_EVERY", 64);

    println!(
        "Running {} tasks on {} workers (1 writer per {} tasks)...",
        tasks, workers, write_every
    );

    let pool = ThreadPool::new(workers, workers);
    let shared = Arc::new(Shared {
        lock: FairRwLock::new(),
        readers_in: AtomicUsize::new(0),
        violations: AtomicUsize::new(0),
    });
    let (done_tx, done_rx) = mpsc::channel();

    let start = Instant::now();
    let mut writes = 0usize;

    for i in 0..tasks {
        let shared = Arc::clone(&shared);
        let done_tx = done_tx.clone();

        if i % write_every == 0 {
            writes += 1;
            pool.run(move || {
                let writer = WriteLock::new(&shared.lock);
                writer.lock();
                // Exclusive: no reader may be inside while we hold this.
                if shared.readers_in.load(Ordering::SeqCst) != 0 {
                    shared.violations.fetch_add(1, Ordering::SeqCst);
                }
                writer.unlock();
                let _ = done_tx.send(());
            });
        } else {
            pool.run(move || {
                let reader = ReadLock::new(&shared.lock);
                let _scope = ScopedLock::new(&reader);
                shared.readers_in.fetch_add(1, Ordering::SeqCst);
                shared.readers_in.fetch_sub(1, Ordering::SeqCst);
                let _ = done_tx.send(());
            });
        }

        if (i + 1) % 1000 == 0 {
            print!("\rSubmitted: {}/{}", i + 1, tasks);
        }
    }

    for _ in 0..tasks {
        let _ = done_rx.recv();
    }
    let elapsed = start.elapsed();
    pool.stop(false);

    let violations = shared.violations.load(Ordering::SeqCst);
    println!("\n\n=== Results ===");
    println!("Tasks:       {} ({} writes)", tasks, writes);
    println!("Elapsed:     {:?}", elapsed);
    println!(
        "Throughput:  {:.0} tasks/sec",
        tasks as f64 / elapsed.as_secs_f64()
    );
    println!("Violations:  {}", violations);

    if violations > 0 {
        println!("\n=== Stress Test FAILED ===");
        std::process::exit(1);
    }
    println!("\n=== Stress Test Complete ===");
}
