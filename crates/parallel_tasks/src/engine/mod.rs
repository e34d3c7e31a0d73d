//! src/engine/mod.rs
//!
//! The `Engine` runs chunked bulk operations over caller-owned buffers on a
//! shared `WorkerPool`.
//!
//! # Architecture Overview
//!
//! ```text
//!          sort / sort_by              run_to_zero
//!     ┌──────────────────────┐   ┌─────────────────────┐
//!     │  phase 1: chunk sort │   │ pass: step + count  │ ←─┐
//!     │  phase 2: merge tree │   │ sum counters        │ ──┘ until 0
//!     └──────────┬───────────┘   └──────────┬──────────┘
//!                │                          │
//!                └────────────┬─────────────┘
//!                             ↓
//!                    ┌─────────────────┐
//!                    │   bulk_apply    │  one op per chunk, then barrier
//!                    └────────┬────────┘
//!                             ↓
//!          ┌──────────────────┴─────────────────┐
//!          │ partition()          WorkerPool    │
//!          │ disjoint ranges      W threads     │
//!          └────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! ```text
//! src/engine/
//! ├── mod.rs       # Engine struct, constructors, operation reports
//! ├── bulk.rs      # bulk_apply: the only parallel primitive
//! ├── sort.rs      # chunk sort + pairwise merge tree
//! └── converge.rs  # repeated passes with per-chunk atomic counters
//! ```
//!
//! Every operation checks the worker count before touching the buffer. With zero
//! usable workers it emits an error line on the progress sink and returns
//! `InvalidConfiguration`; the buffer keeps its prior contents.

pub(crate) mod bulk;
pub(crate) mod converge;
pub(crate) mod sort;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pool::WorkerPool;
use crate::progress::ProgressSink;

pub use converge::{RandomDecrement, StepRule};
pub use sort::{merge_adjacent, merge_level_count, merge_plan, MergeStep};

// ================================================================================================
// 1. Operation reports
// ================================================================================================

/// Outcome of `bulk_apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkReport {
    pub elapsed: Duration,
    pub chunks: usize,
}

/// Outcome of `sort` / `sort_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortReport {
    pub elapsed: Duration,
    /// Chunks sorted in phase 1.
    pub chunks: usize,
    /// Merge-tree levels run in phase 2 (`ceil(log2(chunks))`).
    pub merge_levels: usize,
}

/// Outcome of `run_to_zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceReport {
    pub elapsed: Duration,
    pub passes: usize,
}

// ================================================================================================
// 2. Engine
// ================================================================================================

/// Runs partitioned operations on a shared worker pool.
///
/// # Thread safety:
/// - `Engine` is `Send + Sync`. Several threads may run operations on one
///   engine at once; each operation borrows its own buffer, and a barrier waits
///   for every job in the pool, including other callers' jobs. A panicking job
///   fails only the operation that submitted it.
/// - Operations must not be started from inside a pool job: the barrier would
///   wait for the job that is waiting on it.
pub struct Engine {
    pool: Option<Arc<WorkerPool>>,
    sink: Arc<dyn ProgressSink>,
    config: EngineConfig,
    /// Distinguishes phases when reseeding chunk RNGs.
    phase: AtomicUsize,
}

impl Engine {
    /// Builds an engine and its own pool from `config`.
    ///
    /// A configured worker count of zero does not fail here. The engine is
    /// created without a pool and every operation reports "no usable workers".
    pub fn new(config: EngineConfig, sink: Arc<dyn ProgressSink>) -> Result<Self> {
        config.validate()?;

        let workers = config.resolved_workers();
        let pool = if workers == 0 {
            tracing::warn!("engine configured with zero workers");
            None
        } else {
            Some(Arc::new(WorkerPool::from_config(&config)?))
        };

        if let Some(pool) = &pool {
            sink.emit(&format!(
                "Shared worker pool configured with {} workers.",
                pool.worker_count()
            ));
        }

        Ok(Self {
            pool,
            sink,
            config,
            phase: AtomicUsize::new(0),
        })
    }

    /// Builds an engine on an existing pool, shared with other engines.
    ///
    /// `config.num_workers` is ignored; the pool's size is used.
    pub fn with_pool(
        pool: Arc<WorkerPool>,
        config: EngineConfig,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool: Some(pool),
            sink,
            config,
            phase: AtomicUsize::new(0),
        })
    }

    /// Usable workers (0 when the engine has no pool).
    pub fn worker_count(&self) -> usize {
        self.pool.as_ref().map_or(0, |pool| pool.worker_count())
    }

    pub fn pool(&self) -> Option<&Arc<WorkerPool>> {
        self.pool.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sink(&self) -> &dyn ProgressSink {
        self.sink.as_ref()
    }

    pub(crate) fn emit(&self, line: &str) {
        self.sink.emit(line);
    }

    /// Pre-flight check run by every operation before any work is submitted.
    pub(crate) fn usable_pool(&self, operation: &str) -> Result<&WorkerPool> {
        match self.pool.as_deref() {
            Some(pool) if pool.worker_count() > 0 => Ok(pool),
            _ => {
                self.emit(&format!("Error: no usable workers, cannot {}.", operation));
                Err(EngineError::no_usable_workers())
            }
        }
    }

    pub(crate) fn next_phase(&self) -> usize {
        self.phase.fetch_add(1, Ordering::Relaxed)
    }
}
