//! src/workloads.rs
//!
//! Reference workloads built on `bulk_apply`, plus the verification and sampling
//! helpers used to report on them.
//!
//! - `populate_random`: fill an integer buffer with uniform values in `[1, max]`
//! - `populate_string_matrix`: fill every row with random alphanumeric strings
//! - `sort_rows`: sort every row of a matrix independently
//!
//! Random values come from `WorkerRandom`, so each chunk draws from its own
//! worker's generator.

use std::fmt::Display;

use crate::engine::{BulkReport, Engine};
use crate::error::Result;
use crate::random::{RandomSource, WorkerRandom, ALPHANUMERIC};

// ================================================================================================
// 1. Population and per-row transforms
// ================================================================================================

/// Fills `buffer` with uniform random values in `[1, max]`.
pub fn populate_random<T>(engine: &Engine, buffer: &mut [T], max: u32) -> Result<BulkReport>
where
    T: From<u32> + Send,
{
    let max = u64::from(max.max(1));
    engine.bulk_apply(buffer, |_, part: &mut [T]| {
        let mut rng = WorkerRandom;
        for value in part.iter_mut() {
            // next_in_range(max) <= max, and max came from a u32
            *value = T::from(rng.next_in_range(max) as u32);
        }
    })
}

/// Resizes every row to `cols` random alphanumeric strings of length `len`.
pub fn populate_string_matrix(
    engine: &Engine,
    matrix: &mut [Vec<String>],
    cols: usize,
    len: usize,
) -> Result<BulkReport> {
    engine.emit(&format!(
        "Populating {}x{} string matrix with {}-char strings...",
        matrix.len(),
        cols,
        len
    ));

    let report = engine.bulk_apply(matrix, |_, rows: &mut [Vec<String>]| {
        let mut rng = WorkerRandom;
        for row in rows.iter_mut() {
            row.clear();
            row.extend((0..cols).map(|_| rng.next_string(ALPHANUMERIC, len)));
        }
    })?;

    engine.emit("String matrix population complete.");
    Ok(report)
}

/// Sorts every row of `matrix` independently.
pub fn sort_rows<T>(engine: &Engine, matrix: &mut [Vec<T>]) -> Result<BulkReport>
where
    T: Ord + Send,
{
    engine.emit(&format!("Sorting {} rows of string matrix...", matrix.len()));

    let report = engine.bulk_apply(matrix, |_, rows: &mut [Vec<T>]| {
        for row in rows.iter_mut() {
            row.sort_unstable();
        }
    })?;

    engine.emit("String matrix row sorting complete.");
    Ok(report)
}

// ================================================================================================
// 2. Verification and sampling
// ================================================================================================

/// Whether `buffer` is non-decreasing.
pub fn is_sorted<T: PartialOrd>(buffer: &[T]) -> bool {
    buffer.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Whether every element equals `value` (true for an empty buffer).
pub fn all_equal_to<T: PartialEq>(buffer: &[T], value: &T) -> bool {
    buffer.iter().all(|element| element == value)
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// "First n elements: ..." and, for a non-empty buffer, "Last n elements: ...".
pub fn format_sample<T: Display>(buffer: &[T], n: usize) -> Vec<String> {
    let count = n.min(buffer.len());
    let mut lines = vec![format!(
        "First {} elements: {}",
        n,
        join(&buffer[..count])
    )];
    if !buffer.is_empty() {
        lines.push(format!(
            "Last {} elements: {}",
            n,
            join(&buffer[buffer.len() - count..])
        ));
    }
    lines
}

/// Up to `rows` rows, each showing its first `cols` elements.
pub fn format_matrix_sample<T: Display>(matrix: &[Vec<T>], rows: usize, cols: usize) -> Vec<String> {
    if matrix.is_empty() {
        return vec!["String matrix is empty.".to_string()];
    }

    matrix
        .iter()
        .take(rows)
        .enumerate()
        .map(|(i, row)| {
            let body = if row.is_empty() {
                "[empty]".to_string()
            } else {
                join(&row[..cols.min(row.len())])
            };
            format!("Row {} (first {} elements): {}", i, cols, body)
        })
        .collect()
}
