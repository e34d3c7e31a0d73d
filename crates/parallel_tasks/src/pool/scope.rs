//! Submitting jobs that borrow from the caller's stack.
//!
//! Pool workers outlive any single call, so `WorkerPool::submit` only accepts
//! `'static` jobs. Engine phases need jobs that hold a `&mut` slice of the
//! caller's buffer. `WorkerPool::scope` allows that: jobs submitted through the
//! scope may borrow anything that outlives the scope, and the scope waits for the
//! pool to drain before it returns, on the normal path and when the scope body
//! unwinds.
//!
//! Panics inside scoped jobs are counted by the scope that submitted them, so
//! concurrent callers sharing one pool each see only their own failures.
//!
//! ```ignore
//! let parts = split_chunks_mut(&mut buffer, &chunks);
//! pool.scope(|s| {
//!     for (chunk, part) in parts {
//!         s.submit(move || part.sort_unstable());
//!     }
//! })?;
//! ```

use std::marker::PhantomData;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{EngineError, Result};
use crate::pool::thread::current_worker_id;
use crate::pool::worker_pool::{Job, WorkerPool};

/// Handle for submitting borrowing jobs. Created by [`WorkerPool::scope`].
pub struct Scope<'scope, 'env: 'scope> {
    pool: &'scope WorkerPool,
    /// Jobs submitted through this scope that panicked.
    panicked: AtomicUsize,
    scope: PhantomData<&'scope mut &'scope ()>,
    env: PhantomData<&'env mut &'env ()>,
}

impl<'scope, 'env> Scope<'scope, 'env> {
    /// Enqueues a job that may borrow data outliving the scope.
    pub fn submit<F>(&'scope self, job: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        let panicked = &self.panicked;
        let job: Box<dyn FnOnce() + Send + 'scope> = Box::new(move || {
            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                panicked.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(worker_id = ?current_worker_id(), "scoped work unit panicked");
            }
        });
        // SAFETY: `WorkerPool::scope` does not return or unwind until the pool
        // has drained, which includes this job (DrainGuard covers the unwinding
        // path and stays armed until the drain completes). Nothing the job
        // borrows, `self.panicked` included, is released while it can still run.
        let job: Job = unsafe { mem::transmute::<Box<dyn FnOnce() + Send + 'scope>, Job>(job) };
        self.pool.submit_boxed(job);
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }
}

/// Drains the pool if the scope body unwinds.
struct DrainGuard<'a> {
    pool: &'a WorkerPool,
    armed: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.wait_drained();
        }
    }
}

impl WorkerPool {
    /// Runs `f` with a scope for borrowing jobs, then waits for the pool to drain.
    ///
    /// Returns `f`'s value, or `TaskPanicked` if a job submitted through this
    /// scope panicked. Panics from other submitters are never reported here.
    pub fn scope<'env, F, T>(&self, f: F) -> Result<T>
    where
        F: for<'scope> FnOnce(&'scope Scope<'scope, 'env>) -> T,
    {
        let scope = Scope {
            pool: self,
            panicked: AtomicUsize::new(0),
            scope: PhantomData,
            env: PhantomData,
        };
        let mut guard = DrainGuard {
            pool: self,
            armed: true,
        };

        let value = f(&scope);

        self.wait_drained();
        guard.armed = false;

        match scope.panicked.load(Ordering::SeqCst) {
            0 => Ok(value),
            count => Err(EngineError::TaskPanicked { count }),
        }
    }
}
