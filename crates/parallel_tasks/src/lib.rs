//! Chunked parallel bulk operations over in-memory buffers.
//!
//! A fixed worker pool runs one job per disjoint chunk of a caller-owned buffer,
//! and a phase barrier separates one phase from the next. On top of that:
//! - `Engine::bulk_apply`: one operation per chunk
//! - `Engine::sort` / `sort_by`: chunk sort followed by a pairwise merge tree
//! - `Engine::run_to_zero`: repeated passes until per-chunk counters sum to zero
//!
//! ```ignore
//! let engine = Engine::new(EngineConfig::default(), Arc::new(NullSink))?;
//! let mut data = vec![5, 3, 1, 4, 2];
//! engine.sort(&mut data)?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod partition;
pub mod pool;
pub mod progress;
pub mod random;
pub mod workloads;

pub use config::{default_worker_count, EngineConfig, EngineConfigBuilder};
pub use engine::{
    BulkReport, ConvergenceReport, Engine, MergeStep, RandomDecrement, SortReport, StepRule,
};
pub use error::{EngineError, Result};
pub use partition::{partition, split_chunks_mut, Chunk};
pub use pool::{Scope, WorkerPool};
pub use progress::{MemorySink, NullSink, ProgressSink, StdoutSink, TracingSink};
pub use random::{RandomSource, WorkerRandom, ALPHANUMERIC};
