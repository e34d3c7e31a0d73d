//! src/partition.rs
//!
//! Splits a buffer of length `N` into at most `W` contiguous chunks.
//!
//! The chunk size is `max(1, N / W)`. Every chunk but the last covers exactly
//! `chunk_size` indices, and the last one absorbs the remainder. When `N < W` the
//! partition stops as soon as the buffer is exhausted, so fewer than `W` chunks
//! come back. That is expected and never reported as an error.
//!
//! ```text
//! N = 10, W = 3  ->  chunk_size = 3
//! [0,3) [3,6) [6,10)
//!
//! N = 2, W = 4   ->  chunk_size = 1
//! [0,1) [1,2)
//! ```
//!
//! `split_chunks_mut` turns a partition into one `&mut [T]` per chunk. Chunk work
//! units only ever get buffer access through it, and that is what keeps
//! concurrent units off each other's indices.

use std::ops::Range;

use crate::error::{EngineError, Result};

/// Half-open index range `[start, end)` plus its position in the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn new(index: usize, start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "chunk start {} > end {}", start, end);
        Self { index, start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Partitions `[0, len)` into ascending, disjoint, contiguous chunks.
///
/// Returns `InvalidConfiguration` when `workers == 0`, and an empty partition
/// when `len == 0`.
pub fn partition(len: usize, workers: usize) -> Result<Vec<Chunk>> {
    if workers == 0 {
        return Err(EngineError::no_usable_workers());
    }

    let chunk_size = (len / workers).max(1);
    let mut chunks = Vec::with_capacity(workers.min(len));

    for i in 0..workers {
        let start = i * chunk_size;
        if start >= len {
            break;
        }
        let end = if i == workers - 1 {
            len
        } else {
            ((i + 1) * chunk_size).min(len)
        };
        if start >= end {
            continue;
        }
        chunks.push(Chunk::new(chunks.len(), start, end));
    }

    Ok(chunks)
}

/// Hands out one mutable sub-slice per chunk.
///
/// Chunks must be ascending and non-overlapping (as produced by [`partition`] or
/// by a merge-tree level). Gaps between chunks are allowed and simply skipped.
///
/// # Panics
/// Panics if chunks overlap, are out of order, or run past the buffer end.
pub fn split_chunks_mut<'a, T>(buffer: &'a mut [T], chunks: &[Chunk]) -> Vec<(Chunk, &'a mut [T])> {
    let mut parts = Vec::with_capacity(chunks.len());
    let mut rest = buffer;
    let mut offset = 0usize;

    for &chunk in chunks {
        assert!(
            chunk.start >= offset,
            "chunk {:?} overlaps or precedes offset {}",
            chunk,
            offset
        );
        assert!(
            chunk.end - offset <= rest.len(),
            "chunk {:?} runs past the end of the buffer",
            chunk
        );

        let tail = std::mem::take(&mut rest);
        let (_, tail) = tail.split_at_mut(chunk.start - offset);
        let (part, tail) = tail.split_at_mut(chunk.len());
        parts.push((chunk, part));
        rest = tail;
        offset = chunk.end;
    }

    parts
}
