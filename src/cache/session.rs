//! Per-session candidate cache with a short time-to-live.
//!
//! Each session id maps to the catalog items matched for its recent frames, each
//! tagged with the time it was last produced. Expired entries are never returned
//! and are dropped lazily whenever their key is touched; there is no background
//! sweeper. An entry is expired once `now - inserted > ttl`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use crate::constants::DEFAULT_SESSION_TTL;
use crate::index::CatalogItem;

#[derive(Debug, Clone)]
struct CacheEntry {
    item: Arc<CatalogItem>,
    inserted: Instant,
}

impl CacheEntry {
    #[inline]
    fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted) <= ttl
    }
}

/// Concurrent session-id → candidates map.
///
/// Updates are atomic per key (`DashMap` shard locks), so concurrent puts for the
/// same session never lose each other's candidates.
pub struct SessionCache {
    entries: DashMap<String, Vec<CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops expired entries for `key`, removing the key once nothing is left.
    ///
    /// Returns the surviving candidates, or `None` if the key was absent.
    fn compact(&self, key: &str, now: Instant) -> Option<Vec<Arc<CatalogItem>>> {
        let ttl = self.ttl;
        let live: Vec<Arc<CatalogItem>> = {
            let mut slot = self.entries.get_mut(key)?;
            slot.retain(|entry| entry.is_live(now, ttl));
            slot.iter().map(|entry| Arc::clone(&entry.item)).collect()
        };

        if live.is_empty() {
            // Re-checked under the shard lock: a concurrent put may have refilled it.
            self.entries.remove_if(key, |_, slot| slot.is_empty());
        }
        Some(live)
    }

    /// Live candidates for `key`, empty if absent or fully expired.
    pub fn get(&self, key: &str) -> Vec<Arc<CatalogItem>> {
        self.compact(key, self.clock.now()).unwrap_or_default()
    }

    /// Merges `items` into the session, stamping them with the current time.
    ///
    /// An item equal to one already cached only has its timestamp refreshed.
    pub fn put<I>(&self, key: &str, items: I)
    where
        I: IntoIterator<Item = Arc<CatalogItem>>,
    {
        let now = self.clock.now();
        let ttl = self.ttl;

        let empty = {
            let mut slot = self.entries.entry(key.to_string()).or_default();
            slot.retain(|entry| entry.is_live(now, ttl));
            for item in items {
                match slot.iter_mut().find(|entry| entry.item == item) {
                    Some(existing) => existing.inserted = now,
                    None => slot.push(CacheEntry {
                        item,
                        inserted: now,
                    }),
                }
            }
            slot.is_empty()
        };

        if empty {
            self.entries.remove_if(key, |_, slot| slot.is_empty());
        }
    }

    /// Deletes the session. Returns `true` if it held any entries.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns `true` if `key` has at least one live candidate.
    pub fn contains(&self, key: &str) -> bool {
        self.compact(key, self.clock.now())
            .is_some_and(|live| !live.is_empty())
    }

    /// Number of sessions with live candidates (sweeps every key first).
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every expired entry and every emptied key; returns the entries dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut dropped = 0;

        self.entries.retain(|_, slot| {
            let before = slot.len();
            slot.retain(|entry| entry.is_live(now, ttl));
            dropped += before - slot.len();
            !slot.is_empty()
        });

        if dropped > 0 {
            debug!(dropped, "Purged expired session entries");
        }
        dropped
    }

    /// Keys currently stored, expired or not. Diagnostic only.
    pub fn stored_keys(&self) -> usize {
        self.entries.len()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("sessions", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
