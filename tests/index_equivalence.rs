//! Trie and scan indexes must agree on every query.

mod common;

use cardscan::{CatalogIndex, HashIndex, IndexKind, MatchResult, ScanIndex, TrieIndex};
use common::fixtures::{CatalogBuilder, flip_bits, random_hash, seeded_rng};
use rand::Rng;

fn ids(results: &[MatchResult]) -> Vec<(u32, String)> {
    results
        .iter()
        .map(|r| (r.distance, r.id().to_string()))
        .collect()
}

#[test]
fn test_trie_matches_scan_on_random_catalog() {
    let items = CatalogBuilder::new().bit_length(64).size(500).build();
    let trie = TrieIndex::build(items.clone(), 64).unwrap();
    let scan = ScanIndex::build(items.clone(), 64).unwrap();

    let mut rng = seeded_rng(7);
    for round in 0..40 {
        let query = if round % 2 == 0 {
            let base = &items[rng.gen_range(0..items.len())].hash;
            flip_bits(base, rng.gen_range(0..12), &mut rng)
        } else {
            random_hash(&mut rng, 64)
        };

        for tolerance in [0, 4, 12, 24, 32, 64] {
            let a = trie.find(&query, tolerance).unwrap();
            let b = scan.find(&query, tolerance).unwrap();
            assert_eq!(ids(&a), ids(&b), "round {round}, tolerance {tolerance}");
        }
    }
}

#[test]
fn test_top_n_agrees_at_256_bits() {
    let items = CatalogBuilder::new().bit_length(256).size(300).seed(11).build();
    let trie = CatalogIndex::build(IndexKind::Trie, items.clone(), 256).unwrap();
    let scan = CatalogIndex::build(IndexKind::Scan, items.clone(), 256).unwrap();
    let tolerance = trie.default_tolerance();
    assert_eq!(tolerance, 96);

    let mut rng = seeded_rng(99);
    for _ in 0..20 {
        let base = &items[rng.gen_range(0..items.len())].hash;
        let query = flip_bits(base, 20, &mut rng);
        for n in [1, 3, 10] {
            let a = trie.find_top_n(&query, 128, n).unwrap();
            let b = scan.find_top_n(&query, 128, n).unwrap();
            assert_eq!(ids(&a), ids(&b), "n = {n}");
            assert!(a.len() <= n);
        }
    }
}

#[test]
fn test_noisy_copy_resolves_to_source() {
    let items = CatalogBuilder::new().bit_length(256).size(1000).seed(3).build();
    let trie = TrieIndex::build(items.clone(), 256).unwrap();
    let mut rng = seeded_rng(5);

    for _ in 0..25 {
        let source = &items[rng.gen_range(0..items.len())];
        let query = flip_bits(&source.hash, 16, &mut rng);
        let best = trie.find_top_n(&query, trie.default_tolerance(), 1).unwrap();

        assert_eq!(best.len(), 1);
        assert_eq!(best[0].id(), source.id);
        assert_eq!(best[0].distance, 16);
    }
}

#[test]
fn test_results_are_sorted_and_within_tolerance() {
    let items = CatalogBuilder::new().bit_length(64).size(400).seed(21).build();
    let trie = TrieIndex::build(items, 64).unwrap();
    let query = random_hash(&mut seeded_rng(1), 64);

    let results = trie.find(&query, 28).unwrap();
    assert!(results.iter().all(|r| r.distance <= 28));
    assert!(results.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_summaries_differ_only_in_structure() {
    let items = CatalogBuilder::new().size(50).build();
    let trie = CatalogIndex::build(IndexKind::Trie, items.clone(), 64).unwrap();
    let scan = CatalogIndex::build(IndexKind::Scan, items, 64).unwrap();

    let (t, s) = (trie.summary(), scan.summary());
    assert_eq!(t.kind, IndexKind::Trie);
    assert_eq!(s.kind, IndexKind::Scan);
    assert_eq!(t.items, s.items);
    assert_eq!(s.nodes, 50);
    assert!(t.nodes > t.items);
}
