//! Test doubles and seeded test data for index consumers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::index::{CatalogItem, HashIndex, IndexKind, IndexResult, MatchResult, PHash};

/// Deterministic generator, so failing cases reproduce.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Uniformly random `bit_length`-bit hash.
pub fn random_hash<R: Rng>(rng: &mut R, bit_length: usize) -> PHash {
    let bits: Vec<bool> = (0..bit_length).map(|_| rng.gen_bool(0.5)).collect();
    PHash::from_bits(&bits)
}

/// Copy of `hash` with exactly `count` distinct bits flipped (capped at its width).
pub fn flip_bits<R: Rng>(hash: &PHash, count: usize, rng: &mut R) -> PHash {
    let mut bits: Vec<bool> = (0..hash.len()).map(|i| hash.bit(i)).collect();
    let mut flipped = HashSet::new();
    while flipped.len() < count.min(bits.len()) {
        flipped.insert(rng.gen_range(0..bits.len()));
    }
    for position in flipped {
        bits[position] = !bits[position];
    }
    PHash::from_bits(&bits)
}

/// `count` items with random hashes and ids `card-00000`, `card-00001`, ...
pub fn random_catalog<R: Rng>(rng: &mut R, count: usize, bit_length: usize) -> Vec<CatalogItem> {
    (0..count)
        .map(|i| {
            CatalogItem::new(
                format!("card-{i:05}"),
                format!("Card {i}"),
                "tst",
                random_hash(rng, bit_length),
            )
        })
        .collect()
}

/// Wraps an index and counts the queries that reach it.
///
/// Lets tests assert that a session-cache hit never touches the index.
#[derive(Debug, Default)]
pub struct CountingIndex<I> {
    inner: I,
    finds: AtomicUsize,
    top_n_finds: AtomicUsize,
}

impl<I: HashIndex> CountingIndex<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            finds: AtomicUsize::new(0),
            top_n_finds: AtomicUsize::new(0),
        }
    }

    /// Total queries (`find` and `find_top_n`).
    pub fn queries(&self) -> usize {
        self.finds.load(Ordering::SeqCst) + self.top_n_finds.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.finds.store(0, Ordering::SeqCst);
        self.top_n_finds.store(0, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<I: HashIndex> HashIndex for CountingIndex<I> {
    fn kind(&self) -> IndexKind {
        self.inner.kind()
    }

    fn bit_length(&self) -> usize {
        self.inner.bit_length()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn find(&self, query: &PHash, tolerance: u32) -> IndexResult<Vec<MatchResult>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(query, tolerance)
    }

    fn find_top_n(
        &self,
        query: &PHash,
        tolerance: u32,
        n: usize,
    ) -> IndexResult<Vec<MatchResult>> {
        self.top_n_finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_top_n(query, tolerance, n)
    }
}
