#![allow(dead_code)]

use parallel_tasks::{Engine, EngineConfig, MemorySink, ProgressSink};

use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builds an engine with `workers` threads and a capturing sink.
pub fn engine_with_workers(workers: usize) -> Result<(Engine, Arc<MemorySink>)> {
    let config = EngineConfig::builder()
        .num_workers(workers)
        .poll_interval(Duration::from_millis(5))
        .build();
    engine_with_config(config)
}

pub fn engine_with_config(config: EngineConfig) -> Result<(Engine, Arc<MemorySink>)> {
    let sink = Arc::new(MemorySink::new());
    let engine = Engine::new(config, sink.clone() as Arc<dyn ProgressSink>)?;
    Ok((engine, sink))
}

/// Records which indices are currently claimed by a running chunk operation.
///
/// `claim` fails loudly (returns false) if any index in the range is already held
/// by another operation.
pub struct ClaimTracker {
    held: Vec<AtomicBool>,
    pub overlaps: AtomicUsize,
}

impl ClaimTracker {
    pub fn new(len: usize) -> Self {
        Self {
            held: (0..len).map(|_| AtomicBool::new(false)).collect(),
            overlaps: AtomicUsize::new(0),
        }
    }

    pub fn claim(&self, start: usize, end: usize) {
        for flag in &self.held[start..end] {
            if flag.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    pub fn release(&self, start: usize, end: usize) {
        for flag in &self.held[start..end] {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

/// Deterministic pseudo-random integers for test inputs.
pub fn scrambled(len: usize, modulus: i64) -> Vec<i64> {
    (0..len as i64)
        .map(|i| (i.wrapping_mul(7_919) + 13).rem_euclid(modulus.max(1)))
        .collect()
}
