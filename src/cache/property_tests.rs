//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check classifier and store invariants over generated input.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{classify, CacheEntry, CacheStore};

// == Test Configuration ==
const TEST_EXPIRATION: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates request targets (path-like, non-empty, no whitespace)
fn target_strategy() -> impl Strategy<Value = String> {
    "/[a-zA-Z0-9_/.-]{0,32}".prop_map(|s| s)
}

/// Generates upper-case method tokens other than GET
fn non_get_method_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{3,7}".prop_filter("GET is cacheable", |m| m != "GET")
}

/// Generates response bodies (non-empty)
fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..256)
}

#[derive(Debug, Clone)]
enum StoreOp {
    Append { target: String },
    Fill { slot: usize, body: Vec<u8> },
    Lookup { target: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        target_strategy().prop_map(|target| StoreOp::Append { target }),
        (0usize..16, body_strategy()).prop_map(|(slot, body)| StoreOp::Fill { slot, body }),
        target_strategy().prop_map(|target| StoreOp::Lookup { target }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Arbitrary bytes never panic the classifier, and anything it accepts is
    // an unfilled GET skeleton with a non-empty target.
    #[test]
    fn prop_classify_total(chunk in prop::collection::vec(any::<u8>(), 0..512)) {
        if let Ok(entry) = classify(&chunk) {
            prop_assert_eq!(entry.method.as_str(), "GET");
            prop_assert!(!entry.target.is_empty());
            prop_assert!(entry.body.is_empty());
        }
    }

    // Non-GET request lines are never cacheable.
    #[test]
    fn prop_non_get_not_cacheable(
        method in non_get_method_strategy(),
        target in target_strategy()
    ) {
        let chunk = format!("{} {} HTTP/1.1\r\nHost: upstream\r\n\r\n", method, target);
        prop_assert!(classify(chunk.as_bytes()).is_err());
    }

    // GET request lines round-trip their target into the cache key.
    #[test]
    fn prop_get_target_is_key(target in target_strategy()) {
        let chunk = format!("GET {} HTTP/1.1\r\n\r\n", target);
        let entry = classify(chunk.as_bytes()).unwrap();
        prop_assert_eq!(entry.target, target);
    }

    // For N distinct targets, N identifiers are handed out and each fill lands
    // on the entry its identifier was issued for.
    #[test]
    fn prop_fill_pairs_with_issuing_target(
        targets in prop::collection::hash_set(target_strategy(), 1..20)
    ) {
        let mut store = CacheStore::new(TEST_EXPIRATION);
        let issued: Vec<(String, u64)> = targets
            .iter()
            .map(|t| (t.clone(), store.append(CacheEntry::new("GET", t.clone(), "HTTP/1.1"))))
            .collect();

        let ids: HashSet<u64> = issued.iter().map(|(_, id)| *id).collect();
        prop_assert_eq!(ids.len(), targets.len());

        for (target, id) in &issued {
            prop_assert!(store.fill(*id, target.as_bytes()));
        }
        for (target, _) in &issued {
            let entry = store.find_by_target(target).unwrap();
            prop_assert_eq!(entry.body, target.as_bytes().to_vec());
        }
    }

    // Any operation sequence leaves the store sorted with unique targets, and
    // a hit only ever returns a filled entry for the requested target.
    #[test]
    fn prop_store_ordered_and_unique(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = CacheStore::new(TEST_EXPIRATION);
        let mut ids: Vec<u64> = Vec::new();

        for op in ops {
            match op {
                StoreOp::Append { target } => {
                    ids.push(store.append(CacheEntry::new("GET", target, "HTTP/1.1")));
                }
                StoreOp::Fill { slot, body } => {
                    if !ids.is_empty() {
                        store.fill(ids[slot % ids.len()], &body);
                    }
                }
                StoreOp::Lookup { target } => {
                    if let Some(index) = store.find_fresh_index(&target) {
                        let hit = store.get_by_index(index).unwrap();
                        prop_assert_eq!(hit.target, target);
                        prop_assert!(!hit.body.is_empty());
                    }
                }
            }

            let targets: Vec<&str> = store.entries().iter().map(|e| e.target.as_str()).collect();
            prop_assert!(targets.windows(2).all(|pair| pair[0] < pair[1]));
        }

        prop_assert_eq!(store.stats().total_entries, store.len());
    }

    // A second fill for the same identifier never replaces the first body.
    #[test]
    fn prop_first_fill_wins(
        target in target_strategy(),
        first in body_strategy(),
        second in body_strategy()
    ) {
        let mut store = CacheStore::new(TEST_EXPIRATION);
        let id = store.append(CacheEntry::new("GET", target.clone(), "HTTP/1.1"));

        prop_assert!(store.fill(id, &first));
        prop_assert!(!store.fill(id, &second));
        prop_assert_eq!(store.find_by_target(&target).unwrap().body, first);
    }
}
