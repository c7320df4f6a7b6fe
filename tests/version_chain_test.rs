//! Property tests for bounded version chains

use dhp_vault::core::{HistoryLimit, VersionChain};
use dhp_vault::domain::{DocumentPayload, VaultError};
use serde_json::json;
use test_case::test_case;

fn payload(n: u64) -> DocumentPayload {
    DocumentPayload::try_from(json!({ "n": n })).unwrap()
}

fn numbers(chain: &VersionChain) -> Vec<u64> {
    chain
        .entries()
        .map(|e| e.payload.get("n").and_then(|v| v.as_u64()).unwrap())
        .collect()
}

#[test_case(1, 5)]
#[test_case(3, 3)]
#[test_case(10, 12)]
#[test_case(10, 100)]
fn test_length_bound_holds_after_every_push(limit: usize, pushes: u64) {
    let mut chain = VersionChain::new(HistoryLimit::new(limit).unwrap());
    for n in 1..=pushes {
        chain.push(payload(n));
        assert!(chain.len() <= limit);
        assert_eq!(chain.len(), (n as usize).min(limit));
    }
}

#[test]
fn test_eviction_is_fifo() {
    let mut chain = VersionChain::new(HistoryLimit::new(3).unwrap());
    for n in 1..=5 {
        chain.push(payload(n));
    }
    assert_eq!(numbers(&chain), vec![3, 4, 5]);
}

#[test]
fn test_push_then_rollback_restores_previous_head() {
    let mut chain = VersionChain::new(HistoryLimit::default());
    chain.push(payload(1));
    let before = chain.current().unwrap().clone();

    chain.push(payload(2));
    let head = chain.rollback(1).unwrap();

    assert_eq!(head, before);
    assert_eq!(chain.current().unwrap(), &before);
}

#[test_case(0 ; "zero steps")]
#[test_case(4 ; "steps equal to length")]
#[test_case(9 ; "steps beyond length")]
fn test_invalid_rollback_leaves_chain_untouched(steps: usize) {
    let mut chain = VersionChain::new(HistoryLimit::default());
    for n in 1..=4 {
        chain.push(payload(n));
    }
    let snapshot = chain.clone();

    let err = chain.rollback(steps).unwrap_err();
    assert!(matches!(
        err,
        VaultError::InvalidSteps(_) | VaultError::InsufficientHistory { .. }
    ));
    assert_eq!(chain, snapshot);
}

#[test]
fn test_twelve_pushes_then_rollback_three() {
    let mut chain = VersionChain::new(HistoryLimit::new(10).unwrap());
    for n in 1..=12 {
        chain.push(payload(n));
    }

    assert_eq!(numbers(&chain), (3..=12).collect::<Vec<_>>());
    assert_eq!(numbers(&chain).last(), Some(&12));

    let head = chain.rollback(3).unwrap();
    assert_eq!(head.payload.get("n"), Some(&json!(9)));
    assert_eq!(numbers(&chain), (3..=9).collect::<Vec<_>>());
    assert_eq!(chain.len(), 7);
}
