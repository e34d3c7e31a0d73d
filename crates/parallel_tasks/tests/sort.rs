//! Parallel sort tests.
//!
//! Tests cover:
//! - The reference example buffer, empty and single-element buffers
//! - Merge tree planning (pairs, carried odd range, level count)
//! - Custom comparators and non-integer elements
//! - Zero-worker configuration leaves the buffer untouched
//! - Sortedness and permutation for arbitrary inputs

mod common;
use common::{engine_with_workers, scrambled};

use parallel_tasks::engine::{merge_adjacent, merge_level_count, merge_plan};
use parallel_tasks::workloads::is_sorted;
use parallel_tasks::{Chunk, EngineError, MergeStep};

use anyhow::Result;
use proptest::prelude::*;

#[test]
fn test_sort_reference_example_three_workers() -> Result<()> {
    let (engine, _sink) = engine_with_workers(3)?;
    let mut data = vec![5, 3, 1, 4, 2, 9, 7, 6, 8, 0];

    let report = engine.sort(&mut data)?;

    assert_eq!(data, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(report.chunks, 3);
    assert_eq!(report.merge_levels, 2);
    Ok(())
}

#[test]
fn test_merge_tree_on_reference_chunks() {
    // Chunks [0,4) [4,8) [8,10) after phase 1
    let mut data = vec![1, 3, 4, 5, 2, 6, 7, 9, 0, 8];
    let ranges = vec![Chunk::new(0, 0, 4), Chunk::new(1, 4, 8), Chunk::new(2, 8, 10)];

    let plan = merge_plan(&ranges);
    assert_eq!(
        plan,
        vec![
            MergeStep::Merge {
                left: ranges[0],
                right: ranges[1]
            },
            MergeStep::Carry(ranges[2]),
        ]
    );

    merge_adjacent(&mut data[0..8], 4, &i32::cmp);
    assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 7, 9, 0, 8]);

    let level: Vec<Chunk> = plan.iter().enumerate().map(|(i, s)| s.output(i)).collect();
    assert_eq!(level, vec![Chunk::new(0, 0, 8), Chunk::new(1, 8, 10)]);

    merge_adjacent(&mut data[..], 8, &i32::cmp);
    assert_eq!(data, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn test_merge_level_count() {
    assert_eq!(merge_level_count(0), 0);
    assert_eq!(merge_level_count(1), 0);
    assert_eq!(merge_level_count(2), 1);
    assert_eq!(merge_level_count(3), 2);
    assert_eq!(merge_level_count(4), 2);
    assert_eq!(merge_level_count(5), 3);
    assert_eq!(merge_level_count(8), 3);
    assert_eq!(merge_level_count(9), 4);
}

#[test]
fn test_merge_adjacent_is_stable() {
    let mut data = vec![(1, 'a'), (3, 'a'), (1, 'b'), (2, 'b')];
    merge_adjacent(&mut data, 2, &|x: &(i32, char), y: &(i32, char)| x.0.cmp(&y.0));
    assert_eq!(data, vec![(1, 'a'), (1, 'b'), (2, 'b'), (3, 'a')]);
}

#[test]
fn test_sort_empty_and_single() -> Result<()> {
    let (engine, _sink) = engine_with_workers(4)?;

    let mut empty: Vec<i64> = Vec::new();
    let report = engine.sort(&mut empty)?;
    assert!(empty.is_empty());
    assert_eq!(report.chunks, 0);
    assert_eq!(report.merge_levels, 0);

    let mut single = vec![42];
    let report = engine.sort(&mut single)?;
    assert_eq!(single, vec![42]);
    assert_eq!(report.chunks, 1);
    assert_eq!(report.merge_levels, 0);
    Ok(())
}

#[test]
fn test_sort_buffer_smaller_than_worker_count() -> Result<()> {
    let (engine, _sink) = engine_with_workers(8)?;
    let mut data = vec![3, 1, 2];
    let report = engine.sort(&mut data)?;
    assert_eq!(data, vec![1, 2, 3]);
    assert_eq!(report.chunks, 3);
    Ok(())
}

#[test]
fn test_sort_large_buffer_with_duplicates() -> Result<()> {
    let (engine, _sink) = engine_with_workers(5)?;
    let mut data = scrambled(100_003, 1_000);
    let mut expected = data.clone();
    expected.sort();

    let report = engine.sort(&mut data)?;

    assert_eq!(data, expected);
    assert_eq!(report.chunks, 5);
    assert_eq!(report.merge_levels, merge_level_count(5));
    Ok(())
}

#[test]
fn test_sort_by_descending() -> Result<()> {
    let (engine, _sink) = engine_with_workers(3)?;
    let mut data = scrambled(1_000, 97);

    engine.sort_by(&mut data, |a, b| b.cmp(a))?;

    assert!(data.windows(2).all(|w| w[0] >= w[1]));
    Ok(())
}

#[test]
fn test_sort_strings() -> Result<()> {
    let (engine, _sink) = engine_with_workers(2)?;
    let mut words: Vec<String> = ["pear", "apple", "fig", "kiwi", "banana"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    engine.sort(&mut words)?;

    assert_eq!(words, vec!["apple", "banana", "fig", "kiwi", "pear"]);
    Ok(())
}

#[test]
fn test_sort_reports_progress() -> Result<()> {
    let (engine, sink) = engine_with_workers(2)?;
    let mut data = scrambled(64, 50);

    engine.sort(&mut data)?;

    assert!(sink.contains("=== PHASE 1: Sorting chunks in parallel ==="));
    assert!(sink.contains("Vector size: 64"));
    assert!(sink.contains("Chunk size: 32 (workers: 2)"));
    assert!(sink.contains("sorting range [0-32)"));
    assert!(sink.contains("Merge Task 0 merging ranges [0-32) and [32-64)"));
    assert!(sink.contains("=== Sorting complete! ==="));
    Ok(())
}

#[test]
fn test_sort_with_zero_workers_leaves_buffer_unchanged() -> Result<()> {
    let (engine, sink) = engine_with_workers(0)?;
    let original = vec![5, 3, 1, 4, 2];
    let mut data = original.clone();

    let err = engine.sort(&mut data).unwrap_err();

    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
    assert_eq!(data, original);
    assert!(sink.contains("no usable workers"));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_sort_yields_sorted_permutation(
        mut data in proptest::collection::vec(any::<i32>(), 0..2_000),
        workers in 1usize..9,
    ) {
        let (engine, _sink) = engine_with_workers(workers).unwrap();
        let mut expected = data.clone();
        expected.sort();

        let report = engine.sort(&mut data).unwrap();

        prop_assert!(is_sorted(&data));
        prop_assert_eq!(&data, &expected);
        prop_assert_eq!(report.merge_levels, merge_level_count(report.chunks));
    }

    #[test]
    fn prop_merge_tree_carries_odd_range_unchanged(count in 1usize..100) {
        let mut ranges: Vec<Chunk> = (0..count).map(|i| Chunk::new(i, i * 10, i * 10 + 10)).collect();
        let mut levels = 0;

        while ranges.len() > 1 {
            let plan = merge_plan(&ranges);
            prop_assert_eq!(plan.len(), ranges.len().div_ceil(2));
            if ranges.len() % 2 == 1 {
                let last = *ranges.last().unwrap();
                prop_assert_eq!(*plan.last().unwrap(), MergeStep::Carry(last));
            }
            let next: Vec<Chunk> = plan.iter().enumerate().map(|(i, s)| s.output(i)).collect();
            // The level still covers the same span without gaps or duplicates
            prop_assert_eq!(next.first().unwrap().start, 0);
            prop_assert_eq!(next.last().unwrap().end, count * 10);
            for pair in next.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            ranges = next;
            levels += 1;
        }

        prop_assert_eq!(levels, merge_level_count(count));
    }
}
