//! src/random.rs
//!
//! Randomness consumed by population workloads and probabilistic step rules.
//!
//! Callers never share one generator across workers. `WorkerRandom` draws from
//! the RNG owned by the current pool thread (see `pool::thread`), which is seeded
//! once per worker from OS entropy, or per chunk when the engine has a seed.

use rand::Rng;

use crate::pool::{with_worker_rng, worker_gen_bool, worker_gen_range};

/// `A-Z a-z 0-9`
pub const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A source of uniformly distributed values.
pub trait RandomSource {
    /// Uniform integer in `[1, max]`. `max` must be at least 1.
    fn next_in_range(&mut self, max: u64) -> u64;

    /// Uniform character from `alphabet`, which must be non-empty ASCII.
    fn next_char(&mut self, alphabet: &[u8]) -> char;

    /// `true` with probability `p`.
    fn next_bool(&mut self, p: f64) -> bool;

    /// String of `len` characters drawn from `alphabet`.
    fn next_string(&mut self, alphabet: &[u8], len: usize) -> String {
        (0..len).map(|_| self.next_char(alphabet)).collect()
    }
}

/// Draws from the current worker thread's RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerRandom;

impl RandomSource for WorkerRandom {
    fn next_in_range(&mut self, max: u64) -> u64 {
        debug_assert!(max >= 1, "max must be >= 1");
        worker_gen_range(1, max.max(1))
    }

    fn next_char(&mut self, alphabet: &[u8]) -> char {
        debug_assert!(!alphabet.is_empty(), "alphabet must not be empty");
        let index = with_worker_rng(|rng| rng.random_range(0..alphabet.len()));
        char::from(alphabet[index])
    }

    fn next_bool(&mut self, p: f64) -> bool {
        worker_gen_bool(p.clamp(0.0, 1.0))
    }

    fn next_string(&mut self, alphabet: &[u8], len: usize) -> String {
        debug_assert!(!alphabet.is_empty(), "alphabet must not be empty");
        with_worker_rng(|rng| {
            (0..len)
                .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
                .collect()
        })
    }
}
