use std::borrow::Cow;
use std::sync::Arc;

use super::error::{IndexError, IndexResult};
use super::phash::PHash;
use super::scan::ScanIndex;
use super::trie::TrieIndex;
use super::types::{CatalogItem, IndexKind, IndexSummary, MatchResult};
use crate::constants::default_tolerance;

/// Nearest-match lookup over a read-only catalog of perceptual hashes.
///
/// Implementations are built once and then shared between any number of concurrent
/// readers. Queries narrower than [`bit_length`](HashIndex::bit_length) are zero-padded on
/// the left; wider ones fail with [`IndexError::QueryTooWide`].
pub trait HashIndex: Send + Sync {
    fn kind(&self) -> IndexKind;

    /// Catalog-wide hash width `B`.
    fn bit_length(&self) -> usize;

    /// Number of catalog items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of structural nodes (items for a flat index).
    fn node_count(&self) -> usize {
        self.len()
    }

    /// `floor(B * 0.375)`.
    fn default_tolerance(&self) -> u32 {
        default_tolerance(self.bit_length())
    }

    /// Every item within `tolerance`, ordered by distance then id.
    fn find(&self, query: &PHash, tolerance: u32) -> IndexResult<Vec<MatchResult>>;

    /// The `n` closest items within `tolerance`, ordered by distance then id.
    fn find_top_n(&self, query: &PHash, tolerance: u32, n: usize)
    -> IndexResult<Vec<MatchResult>>;

    fn summary(&self) -> IndexSummary {
        IndexSummary {
            kind: self.kind(),
            bit_length: self.bit_length(),
            items: self.len(),
            nodes: self.node_count(),
            default_tolerance: self.default_tolerance(),
        }
    }
}

impl<I: HashIndex + ?Sized> HashIndex for Arc<I> {
    fn kind(&self) -> IndexKind {
        (**self).kind()
    }

    fn bit_length(&self) -> usize {
        (**self).bit_length()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn node_count(&self) -> usize {
        (**self).node_count()
    }

    fn find(&self, query: &PHash, tolerance: u32) -> IndexResult<Vec<MatchResult>> {
        (**self).find(query, tolerance)
    }

    fn find_top_n(
        &self,
        query: &PHash,
        tolerance: u32,
        n: usize,
    ) -> IndexResult<Vec<MatchResult>> {
        (**self).find_top_n(query, tolerance, n)
    }
}

/// Runtime-selected index variant.
#[derive(Debug)]
pub enum CatalogIndex {
    Trie(TrieIndex),
    Scan(ScanIndex),
}

impl CatalogIndex {
    /// Builds the variant named by `kind` from `items`.
    pub fn build<T>(kind: IndexKind, items: T, bit_length: usize) -> IndexResult<Self>
    where
        T: IntoIterator<Item = CatalogItem>,
    {
        Ok(match kind {
            IndexKind::Trie => CatalogIndex::Trie(TrieIndex::build(items, bit_length)?),
            IndexKind::Scan => CatalogIndex::Scan(ScanIndex::build(items, bit_length)?),
        })
    }

    fn inner(&self) -> &dyn HashIndex {
        match self {
            CatalogIndex::Trie(trie) => trie,
            CatalogIndex::Scan(scan) => scan,
        }
    }
}

impl HashIndex for CatalogIndex {
    fn kind(&self) -> IndexKind {
        self.inner().kind()
    }

    fn bit_length(&self) -> usize {
        self.inner().bit_length()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn node_count(&self) -> usize {
        self.inner().node_count()
    }

    fn find(&self, query: &PHash, tolerance: u32) -> IndexResult<Vec<MatchResult>> {
        self.inner().find(query, tolerance)
    }

    fn find_top_n(
        &self,
        query: &PHash,
        tolerance: u32,
        n: usize,
    ) -> IndexResult<Vec<MatchResult>> {
        self.inner().find_top_n(query, tolerance, n)
    }
}

pub(crate) fn validate_bit_length(bit_length: usize) -> IndexResult<()> {
    if bit_length == 0 {
        return Err(IndexError::InvalidBitLength { bit_length });
    }
    Ok(())
}

/// Re-expresses every item hash at `bit_length` bits.
pub(crate) fn prepare_items<T>(items: T, bit_length: usize) -> IndexResult<Vec<Arc<CatalogItem>>>
where
    T: IntoIterator<Item = CatalogItem>,
{
    validate_bit_length(bit_length)?;

    items
        .into_iter()
        .map(|mut item| {
            if item.hash.len() != bit_length {
                let fitted = item.hash.fit_to(bit_length).map(Cow::into_owned);
                item.hash = fitted.map_err(|_| IndexError::HashTooWide {
                    id: item.id.clone(),
                    bits: item.hash.significant_bits(),
                    bit_length,
                })?;
            }
            Ok(Arc::new(item))
        })
        .collect()
}

/// Aligns a query to the index width.
pub(crate) fn align_query(query: &PHash, bit_length: usize) -> IndexResult<Cow<'_, PHash>> {
    query.fit_to(bit_length).map_err(|_| IndexError::QueryTooWide {
        bits: query.significant_bits(),
        bit_length,
    })
}
