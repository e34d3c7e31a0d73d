//! Worker pool and per-worker thread state.
//!
//! - `worker_pool`: fixed-size pool, shared job queue, phase barrier
//! - `scope`: submission of jobs that borrow caller data
//! - `thread`: thread-local worker id and RNG

pub(crate) mod scope;
pub(crate) mod thread;
pub(crate) mod worker_pool;

pub use scope::Scope;
pub use thread::{
    current_worker_id, init_chunk_rng, with_worker_rng, worker_gen_bool, worker_gen_range,
    WORKER_ID, WORKER_RNG,
};
pub use worker_pool::WorkerPool;
