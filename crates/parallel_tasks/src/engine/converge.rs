//! src/engine/converge.rs
//!
//! Repeated parallel passes until no element is active.
//!
//! Each pass allocates one atomic counter per chunk and runs a `bulk_apply`
//! phase. A chunk job steps every eligible element, counts the elements that are
//! still eligible afterwards, and stores that count into its own counter once.
//! Counters are only read after the barrier. The loop stops on the first pass
//! whose counters sum to zero.
//!
//! There is no pass cap. With a probabilistic rule like `RandomDecrement` every
//! element reaches its terminal value in finite expected time, so the loop ends
//! almost surely, but no fixed bound exists.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::engine::{ConvergenceReport, Engine};
use crate::error::{EngineError, Result};
use crate::partition::{partition, Chunk};
use crate::pool::worker_gen_bool;

/// Per-element transform driven by the convergence loop.
///
/// `step` must never make an element "larger" in the rule's own sense, and an
/// element that stops being eligible must stay ineligible.
pub trait StepRule<T>: Sync {
    /// Whether `value` has not yet reached its terminal state.
    fn is_eligible(&self, value: &T) -> bool;

    /// New value, and whether it is still eligible.
    fn step(&self, value: T) -> (T, bool);
}

/// Decrements positive integers with a fixed probability per pass.
///
/// The reference workload uses `0.5`; `1.0` makes every pass decrement every
/// positive element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomDecrement {
    probability: f64,
}

impl RandomDecrement {
    /// Values above 1 are clamped to 1.
    ///
    /// A NaN, zero or negative probability is rejected with
    /// `InvalidConfiguration`: such a rule never fires, so `run_to_zero` would
    /// never finish on a buffer with a positive element.
    pub fn new(probability: f64) -> Result<Self> {
        if probability.is_nan() || probability <= 0.0 {
            return Err(EngineError::InvalidConfiguration {
                reason: format!("decrement probability must be in (0, 1], got {}", probability),
            });
        }
        Ok(Self {
            probability: probability.min(1.0),
        })
    }

    /// 50% chance per eligible element per pass.
    pub fn coin_flip() -> Self {
        Self { probability: 0.5 }
    }

    /// Always decrements.
    pub fn always() -> Self {
        Self { probability: 1.0 }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    #[inline]
    fn fires(&self) -> bool {
        self.probability >= 1.0 || worker_gen_bool(self.probability)
    }
}

macro_rules! impl_random_decrement {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StepRule<$ty> for RandomDecrement {
                #[inline]
                fn is_eligible(&self, value: &$ty) -> bool {
                    *value > 0
                }

                #[inline]
                fn step(&self, value: $ty) -> ($ty, bool) {
                    let next = if value > 0 && self.fires() { value - 1 } else { value };
                    (next, next > 0)
                }
            }
        )*
    };
}

impl_random_decrement!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Engine {
    /// Runs passes of `rule` over `buffer` until no element is eligible.
    ///
    /// Returns the number of passes executed, including the final pass that
    /// found nothing left to do.
    pub fn run_to_zero<T, R>(&self, buffer: &mut [T], rule: &R) -> Result<ConvergenceReport>
    where
        T: Clone + Send,
        R: StepRule<T>,
    {
        let started = Instant::now();
        let pool = self.usable_pool("run convergence passes")?;
        let chunks = partition(buffer.len(), pool.worker_count())?;

        self.emit("Starting convergence passes...");

        let mut passes = 0usize;
        loop {
            passes += 1;
            let remaining = self.run_pass(buffer, &chunks, rule)?;

            self.emit(&format!(
                "Pass {}: {} elements remaining active.",
                passes, remaining
            ));
            tracing::debug!(pass = passes, remaining, "convergence pass complete");

            if remaining == 0 {
                break;
            }
        }

        self.emit(&format!(
            "Convergence complete. All elements are terminal. Took {} passes.",
            passes
        ));

        Ok(ConvergenceReport {
            elapsed: started.elapsed(),
            passes,
        })
    }

    /// Runs a single pass over `chunks` and returns the sum of the per-chunk
    /// still-active counts.
    pub fn run_pass<T, R>(&self, buffer: &mut [T], chunks: &[Chunk], rule: &R) -> Result<usize>
    where
        T: Clone + Send,
        R: StepRule<T>,
    {
        let pool = self.usable_pool("run convergence pass")?;
        // Counters are addressed by chunk index, so indices must be positions
        let chunks: Vec<Chunk> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| Chunk::new(index, chunk.start, chunk.end))
            .collect();
        let counters: Vec<AtomicUsize> = chunks.iter().map(|_| AtomicUsize::new(0)).collect();
        let counters_ref = &counters;

        self.apply_chunks(pool, buffer, &chunks, &|chunk: &Chunk, part: &mut [T]| {
            let mut active = 0usize;
            for value in part.iter_mut() {
                if rule.is_eligible(value) {
                    let (next, still_active) = rule.step(value.clone());
                    *value = next;
                    if still_active {
                        active += 1;
                    }
                }
            }
            counters_ref[chunk.index].store(active, Ordering::Release);
        })?;

        Ok(counters
            .iter()
            .map(|counter| counter.load(Ordering::Acquire))
            .sum())
    }
}
