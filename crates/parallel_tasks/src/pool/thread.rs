//! Thread-local storage for worker identification and randomness.
//!
//! Each pool worker records its id and owns a private `StdRng`, so random
//! workloads never contend on a shared generator and no two workers draw the
//! same sequence.

use rand::rngs::StdRng;
use rand::Rng as _;
use rand::SeedableRng;
use std::cell::RefCell;

thread_local! {
    /// Thread-local worker ID.
    ///
    /// Assigned once when the worker is spawned (0 to num_workers-1). `None` on
    /// threads that are not pool workers.
    pub static WORKER_ID: RefCell<Option<usize>> = const { RefCell::new(None) };

    /// Thread-local RNG for the worker.
    pub static WORKER_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// Id of the pool worker running on this thread, if any.
pub fn current_worker_id() -> Option<usize> {
    WORKER_ID.with(|id| *id.borrow())
}

/// Seeds the worker RNG once from OS entropy. Called at worker spawn.
pub(crate) fn init_worker_rng_from_entropy() {
    WORKER_RNG.with(|rng| {
        *rng.borrow_mut() = Some(StdRng::from_os_rng());
    })
}

/// Reseeds the current thread's RNG for one chunk of one phase.
///
/// Seed formula: base_seed + (phase << 32) + chunk_index
/// The result depends only on which chunk is processed, never on which worker
/// processes it.
pub fn init_chunk_rng(chunk_index: usize, phase: usize, base_seed: u64) {
    WORKER_RNG.with(|rng| {
        let seed = base_seed
            .wrapping_add((phase as u64) << 32)
            .wrapping_add(chunk_index as u64);
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    })
}

/// Runs `f` with this thread's RNG.
///
/// Threads that were never seeded (callers outside the pool) get a generator
/// seeded from OS entropy on first use.
pub fn with_worker_rng<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    WORKER_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        f(rng_ref.get_or_insert_with(StdRng::from_os_rng))
    })
}

/// Get a random bool from the worker RNG.
pub fn worker_gen_bool(p: f64) -> bool {
    with_worker_rng(|rng| rng.random_bool(p))
}

/// Get a random value in `[low, high]` from the worker RNG.
pub fn worker_gen_range(low: u64, high: u64) -> u64 {
    with_worker_rng(|rng| rng.random_range(low..=high))
}
