//! Integration tests for the worker pool
//!
//! Tests cover:
//! - Identical results for 1, 4 and 16 workers
//! - Workers overlap slow oracle calls
//! - Repeated runs and shared oracles

use crate::integration::test_utils::{secret_set, InFlightOracle};
use prefix_probe::alphabet::Alphabet;
use prefix_probe::oracle::{LikeSyntax, SecretSetOracle};
use prefix_probe::{discover, ProbeError};
use std::sync::Arc;
use std::time::Duration;

const SECRETS: &[&str] = &[
    "alpha", "alpine", "al", "beta", "bet", "gamma", "g", "delta_1", "delta_2", "zz top",
];

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_count_does_not_change_results() {
    let mut runs = Vec::new();
    for workers in [1, 4, 16] {
        let oracle = Arc::new(SecretSetOracle::new(SECRETS));
        let discovery = discover(
            "",
            Alphabet::printable(),
            oracle.clone(),
            Arc::new(LikeSyntax),
            workers,
        )
        .await
        .unwrap();
        assert!(discovery.is_complete());
        runs.push((discovery.secrets, oracle.call_count()));
    }

    assert_eq!(runs[0].0, secret_set(SECRETS));
    for (secrets, calls) in &runs[1..] {
        assert_eq!(secrets, &runs[0].0);
        // The explored tree is the same, so is the number of questions
        assert_eq!(*calls, runs[0].1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_workers_overlap_slow_oracle_calls() {
    let oracle = Arc::new(InFlightOracle::new(
        SecretSetOracle::new(["mango", "melon"]),
        Duration::from_millis(10),
    ));
    let discovery = discover(
        "",
        Alphabet::lowercase(),
        oracle.clone(),
        Arc::new(LikeSyntax),
        8,
    )
    .await
    .unwrap();

    assert_eq!(discovery.secrets, secret_set(&["mango", "melon"]));
    // The seed fans out into 26 children, enough to keep several workers busy
    assert!(oracle.max_in_flight() > 1);
    assert!(oracle.max_in_flight() <= 8);
}

#[tokio::test]
async fn test_single_worker_never_overlaps() {
    let oracle = Arc::new(InFlightOracle::new(
        SecretSetOracle::new(["ab"]),
        Duration::from_millis(1),
    ));
    discover("", Alphabet::from("ab"), oracle.clone(), Arc::new(LikeSyntax), 1)
        .await
        .unwrap();

    assert_eq!(oracle.max_in_flight(), 1);
}

#[tokio::test]
async fn test_concurrent_discoveries_share_an_oracle() {
    let oracle = Arc::new(SecretSetOracle::new(["one", "two", "three"]));
    let alphabet = Alphabet::from("onetwhr");

    let (left, right) = tokio::join!(
        discover("", alphabet.clone(), oracle.clone(), Arc::new(LikeSyntax), 4),
        discover("t", alphabet, oracle.clone(), Arc::new(LikeSyntax), 4),
    );

    assert_eq!(left.unwrap().secrets, secret_set(&["one", "three", "two"]));
    assert_eq!(right.unwrap().secrets, secret_set(&["three", "two"]));
}

#[tokio::test]
async fn test_zero_workers_rejected_before_any_query() {
    let oracle = Arc::new(SecretSetOracle::new(["a"]));
    let result = discover("", Alphabet::lowercase(), oracle.clone(), Arc::new(LikeSyntax), 0).await;

    assert!(matches!(result, Err(ProbeError::InvalidWorkerCount(0))));
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_stats_track_frontier_growth() {
    let oracle = Arc::new(SecretSetOracle::new(["a"]));
    let discovery = discover("", Alphabet::lowercase(), oracle, Arc::new(LikeSyntax), 1)
        .await
        .unwrap();

    // The seed puts all 26 children at once
    assert!(discovery.stats.max_frontier >= 26);
    assert_eq!(discovery.stats.workers, 1);
    assert_eq!(discovery.stats.found, 1);
}
