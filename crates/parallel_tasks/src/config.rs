//! src/config.rs
//!
//! Configuration for the engine and its worker pool.
//!
//! Example:
//! ```ignore
//! let config = EngineConfig::builder()
//!     .num_workers(4)
//!     .poll_interval(Duration::from_millis(50))
//!     .seed(42)
//!     .build();
//! ```
//!
//! # Notes:
//! - `num_workers`: decided once when the engine is built. Leaving it unset uses
//!                  every hardware thread but one, with a minimum of one.
//! - `core_utilization_pct`: a demo throttle. Anything below 100 makes each chunk
//!                           sort and merge unit sleep for `(100 - pct) * 2` ms.
//! - `idle_hook`: called between barrier polls so a host with its own event
//!                loop stays responsive while the engine waits.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Callback run by a waiting barrier between polls.
pub type IdleHook = Arc<dyn Fn() + Send + Sync>;

/// Configuration for an `Engine`
#[derive(Clone)]
pub struct EngineConfig {
    /// Number of pool workers. `None` = `max(1, hardware threads - 1)`.
    /// `Some(0)` is kept as-is; every operation then reports "no usable workers".
    pub num_workers: Option<usize>,
    /// How long a barrier sleeps on the pool's condition variable before it
    /// yields to the idle hook and checks again. Default: 100ms.
    pub poll_interval: Duration,
    /// Simulated per-core utilization in percent (1..=100). Default: 100 (no throttle).
    pub core_utilization_pct: u8,
    /// Base seed for reproducible random workloads.
    pub seed: Option<u64>,
    /// Host event-loop pump. Defaults to `thread::yield_now`.
    pub idle_hook: Option<IdleHook>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_workers: None,
            poll_interval: Duration::from_millis(100),
            core_utilization_pct: 100,
            seed: None,
            idle_hook: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("num_workers", &self.num_workers)
            .field("poll_interval", &self.poll_interval)
            .field("core_utilization_pct", &self.core_utilization_pct)
            .field("seed", &self.seed)
            .field("idle_hook", &self.idle_hook.is_some())
            .finish()
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Worker count the engine will use.
    pub fn resolved_workers(&self) -> usize {
        self.num_workers.unwrap_or_else(default_worker_count)
    }

    /// Per-unit sleep for the utilization throttle, if enabled.
    pub fn throttle_delay(&self) -> Option<Duration> {
        if self.core_utilization_pct >= 100 {
            None
        } else {
            let ms = u64::from(100 - self.core_utilization_pct) * 2;
            Some(Duration::from_millis(ms))
        }
    }

    /// Checks the fields that can be rejected without looking at the host.
    ///
    /// A zero worker count is not rejected here: the engine keeps it and reports
    /// it at the start of each operation.
    pub fn validate(&self) -> Result<()> {
        if self.core_utilization_pct == 0 || self.core_utilization_pct > 100 {
            return Err(EngineError::InvalidConfiguration {
                reason: format!(
                    "core_utilization_pct must be in 1..=100, got {}",
                    self.core_utilization_pct
                ),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(EngineError::InvalidConfiguration {
                reason: "poll_interval must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// `max(1, total hardware threads - 1)`.
pub fn default_worker_count() -> usize {
    let total = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    total.saturating_sub(1).max(1)
}

/// Builder for EngineConfig with method chaining
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the number of workers
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = Some(workers);
        self
    }

    /// Set the barrier polling interval
    ///
    /// - Too low: the idle hook runs more often, more wake-ups.
    /// - Too high: a host event loop is pumped less often while waiting.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the simulated core utilization (100 disables the throttle).
    pub fn core_utilization_pct(mut self, pct: u8) -> Self {
        self.config.core_utilization_pct = pct;
        self
    }

    /// Set the random seed for reproducible random workloads.
    ///
    /// When set, each chunk reseeds its worker's RNG from the seed, the phase
    /// number and the chunk index, so results do not depend on which worker
    /// picked up which chunk.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the hook run between barrier polls.
    pub fn idle_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.config.idle_hook = Some(Arc::new(hook));
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
