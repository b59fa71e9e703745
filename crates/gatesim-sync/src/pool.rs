//! Fixed-size worker pool for fire-and-forget jobs.
//!
//! Workers pull boxed closures from a shared crossbeam channel until the
//! channel closes. A panicking job is caught and logged; it never takes
//! the worker down with it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::error::DispatchError;

/// A unit of work queued on a [`DispatchPool`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolShared {
    /// `None` once the pool has shut down.
    tx: Mutex<Option<Sender<Job>>>,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl PoolShared {
    fn submit(&self, job: Job) -> Result<(), DispatchError> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => tx.send(job).map_err(|_| DispatchError::ShutDown),
            None => Err(DispatchError::ShutDown),
        }
    }
}

// ── DispatchReport ───────────────────────────────────────────────

/// Summary returned by [`DispatchPool::shutdown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Jobs that ran to completion (including ones that panicked).
    pub jobs_completed: u64,
    /// Jobs that panicked.
    pub jobs_panicked: u64,
    /// Worker threads joined by this call.
    pub workers_joined: usize,
}

// ── Dispatcher ───────────────────────────────────────────────────

/// Cloneable submission handle for a [`DispatchPool`].
///
/// Holding a `Dispatcher` does not keep the pool alive: after the pool
/// shuts down every submission fails with [`DispatchError::ShutDown`].
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<PoolShared>,
}

impl Dispatcher {
    /// Queue `job` for execution on some worker.
    pub fn execute<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Box::new(job))
    }

    /// Whether the owning pool still accepts jobs.
    pub fn is_open(&self) -> bool {
        self.shared
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("open", &self.is_open())
            .finish()
    }
}

// ── DispatchPool ─────────────────────────────────────────────────

/// Owner of the worker threads.
///
/// Dropping the pool shuts it down: queued jobs drain, then every
/// worker is joined.
pub struct DispatchPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl DispatchPool {
    /// Spawn `workers` threads named `{name}-{i}`.
    ///
    /// A request for zero workers is raised to one.
    pub fn new(name: &str, workers: usize) -> Result<Self, DispatchError> {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let shared = Arc::new(PoolShared {
            tx: Mutex::new(Some(tx)),
            completed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        });
        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(workers.max(1)),
        };
        for i in 0..workers.max(1) {
            let rx = rx.clone();
            let shared = Arc::clone(&pool.shared);
            let spawned = thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || worker_loop(rx, shared));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(DispatchError::SpawnFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
        log::debug!("dispatch pool '{name}' started with {} workers", pool.workers.len());
        Ok(pool)
    }

    /// A cloneable handle for submitting jobs.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Queue `job` for execution on some worker.
    pub fn execute<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.submit(Box::new(job))
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue, let workers drain it, and join them.
    ///
    /// Idempotent: later calls join nothing and report zero workers.
    pub fn shutdown(&mut self) -> DispatchReport {
        self.shared
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let mut workers_joined = 0;
        for handle in self.workers.drain(..) {
            if handle.join().is_ok() {
                workers_joined += 1;
            }
        }
        DispatchReport {
            jobs_completed: self.shared.completed.load(Ordering::Acquire),
            jobs_panicked: self.shared.panicked.load(Ordering::Acquire),
            workers_joined,
        }
    }
}

impl Drop for DispatchPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for DispatchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchPool")
            .field("workers", &self.workers.len())
            .finish()
    }
}

fn worker_loop(rx: Receiver<Job>, shared: Arc<PoolShared>) {
    while let Ok(job) = rx.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            shared.panicked.fetch_add(1, Ordering::AcqRel);
            log::error!(
                "job panicked on {}",
                thread::current().name().unwrap_or("dispatch worker")
            );
        }
        shared.completed.fetch_add(1, Ordering::AcqRel);
    }
    // Channel closed and drained.
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn runs_all_jobs_before_shutdown_returns() {
        let mut pool = DispatchPool::new("test-pool", 3).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        let report = pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(report.jobs_completed, 100);
        assert_eq!(report.workers_joined, 3);
    }

    #[test]
    fn zero_workers_raised_to_one() {
        let pool = DispatchPool::new("test-pool", 0).unwrap();
        assert_eq!(pool.worker_count(), 1);
    }

    #[test]
    fn shutdown_is_idempotent_and_closes_dispatchers() {
        let mut pool = DispatchPool::new("test-pool", 2).unwrap();
        let dispatcher = pool.dispatcher();
        assert!(dispatcher.is_open());
        let first = pool.shutdown();
        assert_eq!(first.workers_joined, 2);
        let second = pool.shutdown();
        assert_eq!(second.workers_joined, 0);
        assert!(!dispatcher.is_open());
        assert_eq!(dispatcher.execute(|| {}), Err(DispatchError::ShutDown));
    }

    #[test]
    fn panicking_job_does_not_kill_worker() {
        let mut pool = DispatchPool::new("test-pool", 1).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        pool.execute(|| panic!("boom")).unwrap();
        pool.execute(move || {
            tx.send(42).unwrap();
        })
        .unwrap();
        assert_eq!(rx.recv().unwrap(), 42);
        let report = pool.shutdown();
        assert_eq!(report.jobs_panicked, 1);
        assert_eq!(report.jobs_completed, 2);
    }

    #[test]
    fn worker_threads_are_named() {
        let mut pool = DispatchPool::new("named", 1).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        pool.execute(move || {
            let name = thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        })
        .unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("named-0"));
        pool.shutdown();
    }
}
