//! src/engine/sort.rs
//!
//! Two-phase parallel merge sort.
//!
//! Phase 1 sorts every chunk in place through `bulk_apply`. Phase 2 folds the
//! sorted chunks together with a merge tree: each level pairs adjacent ranges
//! left to right, merges every pair in its own job, and waits on the barrier
//! before the next level starts.
//!
//! ```text
//! chunks   [0,4) [4,8) [8,10)
//! level 1  [0,8)       [8,10)   <- odd range carried forward, not merged
//! level 2  [0,10)
//! ```
//!
//! Total merge work is O(N log P) for P chunks.

use std::cmp::Ordering;
use std::thread;
use std::time::Instant;

use crate::engine::{Engine, SortReport};
use crate::error::Result;
use crate::partition::{partition, split_chunks_mut, Chunk};
use crate::pool::current_worker_id;

// ================================================================================================
// 1. Merge tree planning
// ================================================================================================

/// One entry of a merge-tree level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    /// Merge two adjacent sorted ranges into one.
    Merge { left: Chunk, right: Chunk },
    /// Trailing unmatched range, passed to the next level untouched.
    Carry(Chunk),
}

impl MergeStep {
    /// The range this step leaves sorted (with its index in the next level).
    pub fn output(&self, index: usize) -> Chunk {
        match *self {
            MergeStep::Merge { left, right } => Chunk::new(index, left.start, right.end),
            MergeStep::Carry(range) => Chunk::new(index, range.start, range.end),
        }
    }
}

/// Pairs adjacent ranges left to right; an odd last range is carried.
pub fn merge_plan(ranges: &[Chunk]) -> Vec<MergeStep> {
    ranges
        .chunks(2)
        .map(|pair| match *pair {
            [left, right] => {
                debug_assert_eq!(left.end, right.start, "merge ranges must be adjacent");
                MergeStep::Merge { left, right }
            }
            [single] => MergeStep::Carry(single),
            _ => unreachable!("slice::chunks(2) yields one or two ranges"),
        })
        .collect()
}

/// Levels needed to merge `chunks` sorted ranges into one: `ceil(log2(chunks))`.
pub fn merge_level_count(chunks: usize) -> usize {
    if chunks <= 1 {
        0
    } else {
        (usize::BITS - (chunks - 1).leading_zeros()) as usize
    }
}

/// Merges the sorted halves `span[..mid]` and `span[mid..]` in place.
///
/// The merge goes through a temporary buffer sized to the whole span and is
/// stable: on ties the left element comes first.
pub fn merge_adjacent<T, F>(span: &mut [T], mid: usize, compare: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let (left, right) = span.split_at(mid);
    let mut merged = Vec::with_capacity(span.len());
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        if compare(&right[j], &left[i]) == Ordering::Less {
            merged.push(right[j].clone());
            j += 1;
        } else {
            merged.push(left[i].clone());
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);

    span.clone_from_slice(&merged);
}

fn worker_label() -> String {
    match current_worker_id() {
        Some(id) => format!("[worker {}]", id),
        None => "[caller]".to_string(),
    }
}

// ================================================================================================
// 2. Engine entry points
// ================================================================================================

impl Engine {
    /// Sorts `buffer` ascending.
    pub fn sort<T>(&self, buffer: &mut [T]) -> Result<SortReport>
    where
        T: Ord + Clone + Send,
    {
        self.sort_by(buffer, T::cmp)
    }

    /// Sorts `buffer` with a comparator.
    ///
    /// With zero usable workers nothing is submitted and the buffer is left as is.
    pub fn sort_by<T, F>(&self, buffer: &mut [T], compare: F) -> Result<SortReport>
    where
        T: Clone + Send,
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        let started = Instant::now();
        let pool = self.usable_pool("sort")?;
        let workers = pool.worker_count();
        let len = buffer.len();
        let chunks = partition(len, workers)?;

        let throttle = self.config().throttle_delay();
        let sink = self.sink();
        let compare = &compare;

        self.emit("=== PHASE 1: Sorting chunks in parallel ===");
        self.emit(&format!("Vector size: {}", len));
        self.emit(&format!(
            "Chunk size: {} (workers: {})",
            (len / workers).max(1),
            workers
        ));

        self.apply_chunks(pool, buffer, &chunks, &|chunk: &Chunk, part: &mut [T]| {
            let label = worker_label();
            sink.emit(&format!(
                "{} Task {} sorting range [{}-{})",
                label, chunk.index, chunk.start, chunk.end
            ));

            part.sort_unstable_by(|a, b| compare(a, b));
            if let Some(delay) = throttle {
                thread::sleep(delay);
            }

            sink.emit(&format!("{} Task {} completed sorting", label, chunk.index));
        })?;

        self.emit("=== PHASE 2: Merging sorted chunks ===");
        let mut ranges = chunks.clone();
        let mut merge_levels = 0;
        let mut merge_task_id = 0usize;

        while ranges.len() > 1 {
            let plan = merge_plan(&ranges);

            let mut merges = Vec::new();
            for (index, step) in plan.iter().enumerate() {
                if let MergeStep::Merge { left, right } = *step {
                    merges.push((merge_task_id, left, right, step.output(index)));
                    merge_task_id += 1;
                }
            }
            let spans: Vec<Chunk> = merges.iter().map(|&(_, _, _, span)| span).collect();
            let parts = split_chunks_mut(buffer, &spans);

            tracing::debug!(level = merge_levels + 1, merges = merges.len(), "merge level");

            pool.scope(|s| {
                for ((task_id, left, right, _), (_, part)) in merges.into_iter().zip(parts) {
                    s.submit(move || {
                        let label = worker_label();
                        sink.emit(&format!(
                            "{} Merge Task {} merging ranges [{}-{}) and [{}-{})",
                            label, task_id, left.start, left.end, right.start, right.end
                        ));

                        merge_adjacent(part, left.len(), compare);
                        if let Some(delay) = throttle {
                            thread::sleep(delay);
                        }

                        sink.emit(&format!("{} Merge Task {} completed", label, task_id));
                    });
                }
            })?;

            ranges = plan
                .iter()
                .enumerate()
                .map(|(index, step)| step.output(index))
                .collect();
            merge_levels += 1;
        }

        self.emit("=== Sorting complete! ===");

        Ok(SortReport {
            elapsed: started.elapsed(),
            chunks: chunks.len(),
            merge_levels,
        })
    }
}
