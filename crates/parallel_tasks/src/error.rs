//! src/error.rs
//!
//! Error type shared by the pool, the partitioner and every engine operation.
//!
//! All configuration problems are detected before any work is submitted, so an
//! operation that returns `InvalidConfiguration` has not touched the caller's
//! buffer. `TaskPanicked` is the only error that can surface after a phase has
//! started; it is reported once the phase barrier has drained.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine cannot run with the requested configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// One or more work units panicked during the phase that just completed.
    #[error("{count} work unit(s) panicked during the last phase")]
    TaskPanicked { count: usize },

    /// The OS refused to create a worker thread.
    #[error("failed to spawn worker thread {worker_id}")]
    Spawn {
        worker_id: usize,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// The zero-worker configuration error.
    pub fn no_usable_workers() -> Self {
        EngineError::InvalidConfiguration {
            reason: "no usable workers (worker count is 0)".to_string(),
        }
    }

    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, EngineError::InvalidConfiguration { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
