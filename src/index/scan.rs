//! Exhaustive linear-scan index.
//!
//! Computes the distance to every catalog item. Slower than the trie for tight
//! tolerances, but trivially correct, so it doubles as the reference the trie is
//! checked against.

use std::sync::Arc;

use tracing::debug;

use super::backend::{HashIndex, align_query, prepare_items};
use super::collector::TopN;
use super::error::IndexResult;
use super::phash::PHash;
use super::types::{CatalogItem, IndexKind, MatchResult};

#[derive(Debug)]
pub struct ScanIndex {
    items: Vec<Arc<CatalogItem>>,
    bit_length: usize,
}

impl ScanIndex {
    pub fn build<T>(items: T, bit_length: usize) -> IndexResult<Self>
    where
        T: IntoIterator<Item = CatalogItem>,
    {
        let items = prepare_items(items, bit_length)?;
        debug!(items = items.len(), bit_length, "Scan index built");
        Ok(Self { items, bit_length })
    }

    fn scan(&self, query: &PHash, collector: &mut TopN) {
        if collector.is_closed() {
            return;
        }
        for item in &self.items {
            let distance = item.hash.hamming_distance(query);
            collector.offer(MatchResult::new(distance, Arc::clone(item)));
        }
    }
}

impl HashIndex for ScanIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Scan
    }

    fn bit_length(&self) -> usize {
        self.bit_length
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn find(&self, query: &PHash, tolerance: u32) -> IndexResult<Vec<MatchResult>> {
        let query = align_query(query, self.bit_length)?;
        let mut collector = TopN::unbounded(tolerance);
        self.scan(&query, &mut collector);
        Ok(collector.into_sorted_vec())
    }

    fn find_top_n(
        &self,
        query: &PHash,
        tolerance: u32,
        n: usize,
    ) -> IndexResult<Vec<MatchResult>> {
        let query = align_query(query, self.bit_length)?;
        let mut collector = TopN::bounded(tolerance, n);
        self.scan(&query, &mut collector);
        Ok(collector.into_sorted_vec())
    }
}
