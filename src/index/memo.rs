//! Bounded memo of recent index queries.
//!
//! A camera pointed at one card produces the same hash frame after frame, often from
//! clients that never send a session id. Repeating the tree walk for those frames is
//! wasted work, so [`MemoizedIndex`] keeps the last few answers keyed on the aligned
//! query, the tolerance and the result limit.

use std::sync::Arc;

use moka::sync::Cache;

use super::backend::{HashIndex, align_query};
use super::error::IndexResult;
use super::phash::PHash;
use super::types::{IndexKind, MatchResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QueryKey {
    hash: PHash,
    tolerance: u32,
    /// `None` for an unbounded [`HashIndex::find`].
    limit: Option<usize>,
}

/// Wraps an index and answers repeated identical queries from memory.
///
/// The catalog is immutable, so entries never go stale; they are only evicted when the
/// memo is full. A capacity of zero turns the wrapper into a passthrough. Failed queries
/// are never remembered.
pub struct MemoizedIndex<I> {
    inner: I,
    memo: Option<Cache<QueryKey, Arc<[MatchResult]>>>,
}

impl<I: HashIndex> MemoizedIndex<I> {
    pub fn new(inner: I, capacity: u64) -> Self {
        let memo = (capacity > 0).then(|| Cache::builder().max_capacity(capacity).build());
        Self { inner, memo }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.memo.is_some()
    }

    fn remembered<F>(
        &self,
        query: &PHash,
        tolerance: u32,
        limit: Option<usize>,
        compute: F,
    ) -> IndexResult<Vec<MatchResult>>
    where
        F: FnOnce() -> IndexResult<Vec<MatchResult>>,
    {
        let Some(memo) = &self.memo else {
            return compute();
        };

        // Too-wide queries fail here and never reach the memo.
        let hash = align_query(query, self.inner.bit_length())?.into_owned();
        let key = QueryKey {
            hash,
            tolerance,
            limit,
        };

        if let Some(results) = memo.get(&key) {
            tracing::trace!(tolerance, ?limit, "query memo hit");
            return Ok(results.to_vec());
        }

        let results = compute()?;
        memo.insert(key, Arc::from(results.as_slice()));
        Ok(results)
    }
}

impl<I: HashIndex> HashIndex for MemoizedIndex<I> {
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
        self.remembered(query, tolerance, None, || self.inner.find(query, tolerance))
    }

    fn find_top_n(
        &self,
        query: &PHash,
        tolerance: u32,
        n: usize,
    ) -> IndexResult<Vec<MatchResult>> {
        self.remembered(query, tolerance, Some(n), || {
            self.inner.find_top_n(query, tolerance, n)
        })
    }
}
