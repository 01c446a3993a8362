//! Bounded result collection shared by every index variant.

use std::collections::BinaryHeap;

use super::types::MatchResult;

/// Keeps the best results at or below a tolerance, optionally capped at `n`.
///
/// Backed by a max-heap so the worst kept result is always on top and can be evicted
/// in `O(log n)`. Ordering is [`MatchResult`]'s: distance, then catalog id.
#[derive(Debug)]
pub(crate) struct TopN {
    tolerance: u32,
    limit: Option<usize>,
    heap: BinaryHeap<MatchResult>,
}

impl TopN {
    pub(crate) fn unbounded(tolerance: u32) -> Self {
        Self {
            tolerance,
            limit: None,
            heap: BinaryHeap::new(),
        }
    }

    pub(crate) fn bounded(tolerance: u32, n: usize) -> Self {
        Self {
            tolerance,
            limit: Some(n),
            heap: BinaryHeap::with_capacity(n.min(1024)),
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.limit.is_some_and(|n| self.heap.len() >= n)
    }

    /// Largest distance that could still enter the result set.
    ///
    /// A candidate at exactly this distance may still win on id, so callers prune only
    /// when their cost is strictly greater.
    #[inline]
    pub(crate) fn bound(&self) -> u32 {
        match self.heap.peek() {
            Some(worst) if self.is_full() => worst.distance.min(self.tolerance),
            _ => self.tolerance,
        }
    }

    /// Returns `true` once nothing can be added anymore (`n == 0`).
    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.limit == Some(0)
    }

    pub(crate) fn offer(&mut self, candidate: MatchResult) {
        if candidate.distance > self.tolerance || self.is_closed() {
            return;
        }

        if !self.is_full() {
            self.heap.push(candidate);
            return;
        }

        let replaces_worst = self.heap.peek().is_some_and(|worst| candidate < *worst);
        if replaces_worst {
            self.heap.pop();
            self.heap.push(candidate);
        }
    }

    /// Consumes the collector, returning results in ascending order.
    pub(crate) fn into_sorted_vec(self) -> Vec<MatchResult> {
        self.heap.into_sorted_vec()
    }
}
