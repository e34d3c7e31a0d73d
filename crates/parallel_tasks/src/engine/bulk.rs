//! src/engine/bulk.rs
//!
//! Parallel bulk apply: run one operation per chunk, then wait on the barrier.
//!
//! This is the only place that submits per-chunk jobs. It knows nothing about
//! sorting or convergence; it hands each job its chunk and the matching
//! `&mut` slice, and returns once every job has finished.

use std::time::Instant;

use crate::engine::{BulkReport, Engine};
use crate::error::Result;
use crate::partition::{partition, split_chunks_mut, Chunk};
use crate::pool::{init_chunk_rng, WorkerPool};

impl Engine {
    /// Applies `op` to every chunk of `buffer` in parallel.
    ///
    /// The buffer is partitioned for the pool's worker count. `op` receives the
    /// chunk (its index and absolute range) and the chunk's slice.
    pub fn bulk_apply<T, F>(&self, buffer: &mut [T], op: F) -> Result<BulkReport>
    where
        T: Send,
        F: Fn(&Chunk, &mut [T]) + Sync,
    {
        let pool = self.usable_pool("run bulk apply")?;
        let chunks = partition(buffer.len(), pool.worker_count())?;
        self.bulk_apply_with(buffer, &chunks, op)
    }

    /// Applies `op` over a caller-supplied partition.
    ///
    /// `chunks` must be ascending and disjoint within `buffer`.
    pub fn bulk_apply_with<T, F>(&self, buffer: &mut [T], chunks: &[Chunk], op: F) -> Result<BulkReport>
    where
        T: Send,
        F: Fn(&Chunk, &mut [T]) + Sync,
    {
        let started = Instant::now();
        let pool = self.usable_pool("run bulk apply")?;

        self.apply_chunks(pool, buffer, chunks, &op)?;

        Ok(BulkReport {
            elapsed: started.elapsed(),
            chunks: chunks.len(),
        })
    }

    /// One pool phase: a job per chunk, then the barrier.
    pub(crate) fn apply_chunks<T, F>(
        &self,
        pool: &WorkerPool,
        buffer: &mut [T],
        chunks: &[Chunk],
        op: &F,
    ) -> Result<()>
    where
        T: Send,
        F: Fn(&Chunk, &mut [T]) + Sync,
    {
        let phase = self.next_phase();
        let seed = self.config().seed;
        let parts = split_chunks_mut(buffer, chunks);

        tracing::debug!(phase, chunks = parts.len(), "submitting chunk phase");

        pool.scope(|s| {
            for (chunk, part) in parts {
                s.submit(move || {
                    if let Some(seed) = seed {
                        init_chunk_rng(chunk.index, phase, seed);
                    }
                    op(&chunk, part);
                });
            }
        })
    }
}
