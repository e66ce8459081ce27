//! # Harness
//!
//! Drives a [`SharedCounter`] from many threads and reports what it ended at.
//!
//! The harness spreads `increments` requests over `workers` OS threads, waits
//! on a [`WaitGroup`] until every worker has signalled completion exactly
//! once, then reads the counter. With protection the result always equals
//! the number of requests. Without it, it usually doesn't.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::sync::WaitGroup;
use log::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::counter::SharedCounter;
use crate::lock::Lock;

/// Outcome of one harness run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// Number of increment requests issued.
    pub expected: usize,
    /// Counter value after every worker finished.
    pub observed: usize,
    /// Whether increments ran under the counter's lock.
    pub protect: bool,
    /// Wall time from the first spawn to the last join.
    pub elapsed: Duration,
}

impl Report {
    /// Increments that vanished to races. Zero when protected.
    pub fn lost_updates(&self) -> usize {
        self.expected.saturating_sub(self.observed)
    }

    /// True when no increment was lost.
    pub fn is_exact(&self) -> bool {
        self.expected == self.observed
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, expected {}, lost {}, {:?})",
            self.observed,
            if self.protect { "protected" } else { "unprotected" },
            self.expected,
            self.lost_updates(),
            self.elapsed
        )
    }
}

/// Runs the harness against a fresh spinlock-guarded counter.
pub fn run(config: &HarnessConfig) -> io::Result<Report> {
    run_with(Arc::new(SharedCounter::new()), config)
}

/// Runs the harness against `counter`, whatever lock it carries.
///
/// Increments land on top of the counter's current value; the report
/// measures only this run's contribution. Fails only if a worker thread
/// cannot be spawned, and even then returns only after every worker that
/// did start has stopped and been joined.
pub fn run_with<L>(counter: Arc<SharedCounter<L>>, config: &HarnessConfig) -> io::Result<Report>
where
    L: Lock + Send + Sync + 'static,
{
    run_spawning(counter, config, |name, work| thread::Builder::new().name(name).spawn(work))
}

type Work = Box<dyn FnOnce() + Send + 'static>;

fn run_spawning<L, S>(
    counter: Arc<SharedCounter<L>>,
    config: &HarnessConfig,
    mut spawn: S,
) -> io::Result<Report>
where
    L: Lock + Send + Sync + 'static,
    S: FnMut(String, Work) -> io::Result<JoinHandle<()>>,
{
    let workers = config.workers.max(1);
    let protect = config.protect;
    let base = counter.get();

    info!(
        "running {} increments on {} workers ({})",
        config.increments,
        workers,
        if protect { "protected" } else { "unprotected" }
    );

    let started = Instant::now();
    let done = WaitGroup::new();
    let stop = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::with_capacity(workers);
    let mut failure = None;

    for (id, share) in shares(config.increments, workers).enumerate() {
        let counter = Arc::clone(&counter);
        let done = done.clone();
        let worker_stop = Arc::clone(&stop);
        let work: Work = Box::new(move || {
            let mut finished = 0;
            while finished < share && !worker_stop.load(Relaxed) {
                counter.increment(protect);
                finished += 1;
            }
            debug!("worker {id} finished {finished}/{share} increments");
            drop(done);
        });
        match spawn(format!("incr-{id}"), work) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                warn!(
                    "failed to spawn worker {id}: {e}; stopping {} running workers",
                    handles.len()
                );
                stop.store(true, Relaxed);
                failure = Some(e);
                break;
            }
        }
    }

    done.wait();

    for handle in handles {
        if let Err(payload) = handle.join() {
            std::panic::resume_unwind(payload);
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }

    let report = Report {
        expected: config.increments,
        observed: counter.get().wrapping_sub(base),
        protect,
        elapsed: started.elapsed(),
    };

    if report.is_exact() {
        info!("final counter value: {report}");
    } else {
        warn!("final counter value: {report}");
    }
    Ok(report)
}

/// Splits `total` into `workers` near-equal parts that sum to `total`.
fn shares(total: usize, workers: usize) -> impl Iterator<Item = usize> {
    let each = total / workers;
    let extra = total % workers;
    (0..workers).map(move |i| each + usize::from(i < extra))
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use crate::lock::NoopLock;

    fn cfg(increments: usize, workers: usize, protect: bool) -> HarnessConfig {
        HarnessConfig {
            increments,
            workers,
            protect,
        }
    }

    #[test]
    fn test_shares_sum_to_total() {
        for (total, workers) in [(0, 1), (1, 4), (1000, 3), (7, 7), (10, 16)] {
            let parts: Vec<_> = shares(total, workers).collect();
            assert_eq!(parts.len(), workers);
            assert_eq!(parts.iter().sum::<usize>(), total);
            let max = parts.iter().max().copied().unwrap_or(0);
            let min = parts.iter().min().copied().unwrap_or(0);
            assert!(max - min <= 1);
        }
    }

    #[test]
    fn test_protected_run_is_exact() {
        let report = run(&cfg(1000, 8, true)).unwrap();
        assert_eq!(report.observed, 1000);
        assert_eq!(report.lost_updates(), 0);
        assert!(report.is_exact());
    }

    #[test]
    fn test_single_worker_unprotected_is_exact() {
        // One thread cannot race with itself.
        let report = run(&cfg(500, 1, false)).unwrap();
        assert_eq!(report.observed, 500);
    }

    /// Only the upper bound is checked: on a single CPU the scheduler rarely
    /// preempts between the load and the store, so every update can survive.
    /// `tests/loom.rs` (`unprotected_increments_can_be_lost`) exhibits the
    /// lost-update interleaving deterministically.
    #[test]
    fn test_unprotected_never_overcounts() {
        let report = run(&cfg(10_000, 8, false)).unwrap();
        assert!(report.observed <= 10_000);
        assert_eq!(report.lost_updates(), 10_000 - report.observed);
    }

    #[test]
    fn test_run_with_reuses_counter() {
        let counter = Arc::new(SharedCounter::new());
        run_with(Arc::clone(&counter), &cfg(100, 2, true)).unwrap();
        let second = run_with(Arc::clone(&counter), &cfg(50, 2, true)).unwrap();
        assert_eq!(second.observed, 50);
        assert_eq!(counter.get(), 150);
    }

    #[test]
    fn test_run_with_noop_lock() {
        let counter = Arc::new(SharedCounter::with_lock(NoopLock));
        let report = run_with(counter, &cfg(200, 1, true)).unwrap();
        assert_eq!(report.observed, 200);
    }

    #[test]
    fn test_zero_increments() {
        let report = run(&cfg(0, 4, true)).unwrap();
        assert_eq!(report.observed, 0);
        assert!(report.is_exact());
    }

    #[test]
    fn test_spawn_failure_joins_started_workers() {
        let counter = Arc::new(SharedCounter::new());
        let mut spawned = 0;

        let result = run_spawning(Arc::clone(&counter), &cfg(usize::MAX, 4, true), |name, work| {
            if spawned == 2 {
                return Err(io::Error::other("out of threads"));
            }
            spawned += 1;
            thread::Builder::new().name(name).spawn(work)
        });

        assert_eq!(result.unwrap_err().to_string(), "out of threads");
        // Every worker closure held a clone; only ours is left once they are joined.
        assert_eq!(Arc::strong_count(&counter), 1, "A worker outlived run_with");
        let at_return = counter.get();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.get(), at_return, "Counter changed after run_with returned");
        assert!(!counter.lock().is_locked());
    }

    #[test]
    fn test_first_spawn_failure() {
        let counter = Arc::new(SharedCounter::new());
        let result = run_spawning(Arc::clone(&counter), &cfg(100, 2, true), |_, _| {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "no threads"))
        });
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::WouldBlock);
        assert_eq!(counter.get(), 0);
        assert_eq!(Arc::strong_count(&counter), 1);
    }

    #[test]
    fn test_display() {
        let r = Report {
            expected: 10,
            observed: 7,
            protect: false,
            elapsed: Duration::from_millis(3),
        };
        assert_eq!(r.to_string(), "7 (unprotected, expected 10, lost 3, 3ms)");
    }
}
