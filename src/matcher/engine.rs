//! Per-query control flow: session cache first, index second.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::error::{MatchError, MatcherResult};
use super::types::{CardMatch, MatchLookup, MatchQuery};
use crate::cache::SessionCache;
use crate::constants::{DEFAULT_TOP_N, similarity};
use crate::index::{HashIndex, IndexSummary, MatchResult, PHash};

/// Matches query hashes against a catalog index, short-circuiting through the
/// candidates a session matched on its previous frames.
pub struct CardMatcher<I: HashIndex> {
    index: Arc<I>,
    sessions: SessionCache,
    top_n: usize,
    tolerance: u32,
}

impl<I: HashIndex> std::fmt::Debug for CardMatcher<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardMatcher")
            .field("index", &self.index.summary())
            .field("sessions", &self.sessions)
            .field("top_n", &self.top_n)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl<I: HashIndex> CardMatcher<I> {
    pub fn new(index: Arc<I>, sessions: SessionCache) -> Self {
        let tolerance = index.default_tolerance();
        Self {
            index,
            sessions,
            top_n: DEFAULT_TOP_N,
            tolerance,
        }
    }

    /// Number of index results seeded into the session cache on a miss. Clamped to 1.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    /// Overrides the index's default tolerance for queries that carry none.
    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    #[inline]
    pub fn bit_length(&self) -> usize {
        self.index.bit_length()
    }

    #[inline]
    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    #[inline]
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn summary(&self) -> IndexSummary {
        self.index.summary()
    }

    fn validate(&self, hash: &PHash) -> MatcherResult<()> {
        let bits = hash.significant_bits();
        let bit_length = self.bit_length();
        if bits > bit_length {
            return Err(MatchError::InvalidQuery(format!(
                "hash needs {} bits, catalog bit length is {}",
                bits, bit_length
            )));
        }
        Ok(())
    }

    /// Resolves one hash to its ranked candidates.
    ///
    /// With a session id, previously matched candidates are re-scored against `hash`
    /// first; the index is only consulted when none of them is within tolerance.
    /// Every hit refreshes the session.
    #[instrument(skip(self, hash), fields(bits = hash.len()))]
    pub fn lookup(
        &self,
        session_id: Option<&str>,
        hash: &PHash,
        tolerance: Option<u32>,
    ) -> MatcherResult<MatchLookup> {
        self.validate(hash)?;
        let tolerance = tolerance.unwrap_or(self.tolerance);

        if let Some(session_id) = session_id {
            let mut rescored: Vec<MatchResult> = self
                .sessions
                .get(session_id)
                .into_iter()
                .map(|item| MatchResult::new(item.hash.hamming_distance(hash), item))
                .filter(|candidate| candidate.distance <= tolerance)
                .collect();

            if !rescored.is_empty() {
                rescored.sort();
                self.sessions.put(
                    session_id,
                    rescored.iter().map(|candidate| Arc::clone(&candidate.item)),
                );
                debug!(
                    candidates = rescored.len(),
                    best_distance = rescored[0].distance,
                    "Session cache hit"
                );
                return Ok(MatchLookup::HitSession(rescored));
            }
            debug!("Session cache miss, querying index");
        }

        let results = self.index.find_top_n(hash, tolerance, self.top_n)?;
        let Some(best) = results.first() else {
            debug!(tolerance, "No catalog item within tolerance");
            return Ok(MatchLookup::Miss);
        };

        info!(id = %best.id(), distance = best.distance, "Index hit");
        if let Some(session_id) = session_id {
            self.sessions
                .put(session_id, results.iter().map(|r| Arc::clone(&r.item)));
        }
        Ok(MatchLookup::HitIndex(results))
    }

    /// Best match for `query`, or `None` when nothing is within tolerance.
    pub fn match_query(&self, query: &MatchQuery) -> MatcherResult<Option<CardMatch>> {
        let lookup = self.lookup(query.session_id.as_deref(), &query.hash, query.tolerance)?;
        let status = lookup.status();

        Ok(lookup.best().map(|best| CardMatch {
            coordinates: query.coordinates.clone(),
            item: Arc::clone(&best.item),
            distance: best.distance,
            similarity: similarity(best.distance, self.bit_length()),
            status,
        }))
    }

    /// Forgets a session's cached candidates. Returns `true` if there were any.
    pub fn end_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id);
        debug!(session_id, removed, "Session ended");
        removed
    }
}

impl<I: HashIndex + 'static> CardMatcher<I> {
    /// Matches every sub-image of a frame concurrently.
    ///
    /// All queries are validated up front. Results keep the input order; a unit whose
    /// task fails yields `None` without affecting the others.
    #[instrument(skip(self, queries), fields(units = queries.len()))]
    pub async fn match_frame(
        self: &Arc<Self>,
        queries: Vec<MatchQuery>,
    ) -> MatcherResult<Vec<Option<CardMatch>>> {
        for query in &queries {
            self.validate(&query.hash)?;
        }

        let tasks = queries.into_iter().map(|query| {
            let matcher = Arc::clone(self);
            tokio::task::spawn_blocking(move || matcher.match_query(&query))
        });

        let matches = join_all(tasks)
            .await
            .into_iter()
            .enumerate()
            .map(|(unit, joined)| match joined {
                Ok(Ok(found)) => found,
                Ok(Err(e)) => {
                    warn!(unit, error = %e, "Sub-image match failed");
                    None
                }
                Err(e) => {
                    warn!(unit, error = %e, "Sub-image task did not complete");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(
            matched = matches.iter().filter(|m| m.is_some()).count(),
            "Frame matched"
        );
        Ok(matches)
    }
}
