//! Fixed-size worker pool with a phase barrier.
//!
//! `W` long-lived workers pull boxed jobs from one shared unbounded channel.
//! Submission never blocks. `barrier()` blocks the caller until every job
//! submitted so far has finished, whichever thread submitted it.
//!
//! # Key features
//! - Worker count decided once at construction, never resized
//! - Panicking jobs are caught; the worker keeps running and the next barrier
//!   reports how many plain `submit` jobs panicked (scoped jobs report to their
//!   own scope)
//! - Barrier waits on a condition variable with a timeout and runs the idle hook
//!   between timeouts, so a host event loop keeps turning while it waits
//! - Graceful shutdown on drop
//!
//! The pool keeps no results. Jobs communicate through whatever the submitter
//! handed them (a buffer slice, an atomic counter).

use crossbeam_channel::{unbounded, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::config::{EngineConfig, IdleHook};
use crate::error::{EngineError, Result};
use crate::pool::thread::{init_worker_rng_from_entropy, WORKER_ID};

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bookkeeping shared by submitters, workers and barrier waiters.
struct PhaseState {
    /// Jobs submitted and not yet finished.
    pending: Mutex<usize>,
    /// Signalled whenever `pending` drops to zero.
    drained: Condvar,
    /// Plain `submit` jobs that panicked since the last barrier.
    panicked: AtomicUsize,
}

impl PhaseState {
    fn lock_pending(&self) -> MutexGuard<'_, usize> {
        // Only counters live behind this mutex, so a poisoned lock is still usable.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) {
        *self.lock_pending() += 1;
    }

    fn finish(&self) {
        let mut pending = self.lock_pending();
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    fn run(&self, job: Job) {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            self.panicked.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(
                worker_id = ?WORKER_ID.with(|id| *id.borrow()),
                "work unit panicked"
            );
        }
        self.finish();
    }
}

/// Thread pool shared by every engine operation.
///
/// Manages worker lifecycle and communication:
/// - Task channel: submitters -> workers (shared queue)
/// - Phase state: pending count + condition variable for the barrier
/// - Shutdown flag: workers stop taking jobs once the pool is dropped
pub struct WorkerPool {
    workers: Vec<thread::JoinHandle<()>>,
    task_tx: Option<Sender<Job>>,
    state: Arc<PhaseState>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
    idle_hook: Option<IdleHook>,
}

impl WorkerPool {
    /// Creates a pool with `num_workers` threads.
    ///
    /// A zero worker count is rejected: the pool never silently falls back to one.
    pub fn new(num_workers: usize, poll_interval: Duration) -> Result<Self> {
        if num_workers == 0 {
            return Err(EngineError::no_usable_workers());
        }

        let (task_tx, task_rx) = unbounded::<Job>();
        let state = Arc::new(PhaseState {
            pending: Mutex::new(0),
            drained: Condvar::new(),
            panicked: AtomicUsize::new(0),
        });
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let task_rx = task_rx.clone();
            let state = state.clone();
            let shutdown = shutdown.clone();

            let handle = thread::Builder::new()
                .name(format!("parallel-tasks-worker-{}", worker_id))
                .spawn(move || {
                    WORKER_ID.with(|id| *id.borrow_mut() = Some(worker_id));
                    init_worker_rng_from_entropy();

                    for job in task_rx.iter() {
                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }
                        state.run(job);
                    }
                })
                .map_err(|source| EngineError::Spawn { worker_id, source })?;

            workers.push(handle);
        }

        tracing::debug!(num_workers, ?poll_interval, "worker pool started");

        Ok(Self {
            workers,
            task_tx: Some(task_tx),
            state,
            shutdown,
            poll_interval,
            idle_hook: None,
        })
    }

    /// Creates a pool sized and tuned from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut pool = Self::new(config.resolved_workers(), config.poll_interval)?;
        pool.idle_hook = config.idle_hook.clone();
        Ok(pool)
    }

    /// Replaces the hook run between barrier polls.
    pub fn with_idle_hook(mut self, hook: IdleHook) -> Self {
        self.idle_hook = Some(hook);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs submitted and not yet finished.
    pub fn pending(&self) -> usize {
        *self.state.lock_pending()
    }

    /// Enqueues a job. Never blocks.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_boxed(Box::new(job));
    }

    pub(crate) fn submit_boxed(&self, job: Job) {
        self.state.begin();

        let job = match &self.task_tx {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                Err(err) => err.into_inner(),
            },
            None => job,
        };

        // Every worker has exited, which only happens during drop. Run the job
        // here so the pending count still drains.
        self.state.run(job);
    }

    /// Blocks until every job submitted so far has finished.
    ///
    /// Between condition-variable timeouts the idle hook runs (or the thread
    /// yields), so a waiting host is never frozen. Returns `TaskPanicked` if any
    /// plain `submit` job panicked since the previous barrier; the pool has
    /// drained either way.
    pub fn barrier(&self) -> Result<()> {
        self.wait_drained();

        match self.state.panicked.swap(0, Ordering::SeqCst) {
            0 => Ok(()),
            count => Err(EngineError::TaskPanicked { count }),
        }
    }

    /// Waits until `pending` reaches zero. Never unwinds.
    pub(crate) fn wait_drained(&self) {
        let mut pending = self.state.lock_pending();
        while *pending > 0 {
            let (guard, _) = self
                .state
                .drained
                .wait_timeout(pending, self.poll_interval)
                .unwrap_or_else(PoisonError::into_inner);
            pending = guard;

            if *pending > 0 {
                drop(pending);
                self.idle();
                pending = self.state.lock_pending();
            }
        }
    }

    fn idle(&self) {
        match &self.idle_hook {
            Some(hook) => {
                // A panicking hook must not abandon a wait that borrowed jobs rely on
                if panic::catch_unwind(AssertUnwindSafe(|| hook())).is_err() {
                    tracing::warn!("idle hook panicked");
                    thread::yield_now();
                }
            }
            None => thread::yield_now(),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Closing the channel wakes every worker blocked in recv
        self.task_tx.take();

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        tracing::debug!("worker pool shut down");
    }
}
