use std::time::{Duration, Instant};

use crate::error::LedgerError;
use crate::model::CanonicalOrderRow;
use crate::normalize::normalize;
use crate::source::LedgerSource;

/// Read-through cache over a ledger source with a bounded freshness window.
///
/// Exists to bound call volume against the latency-bound source, not to
/// coordinate writers. A fetched snapshot is reused until `ttl` elapses or
/// [`LedgerCache::invalidate`] is called. A failed refresh leaves the previous
/// snapshot in place; the next access retries.
pub struct LedgerCache {
    ttl: Duration,
    slot: Option<CacheSlot>,
}

struct CacheSlot {
    rows: Vec<CanonicalOrderRow>,
    fetched_at: Instant,
}

impl LedgerCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    /// Canonical rows, refreshed through `source` when the window has lapsed.
    pub fn rows(&mut self, source: &mut dyn LedgerSource) -> Result<&[CanonicalOrderRow], LedgerError> {
        let fresh = self
            .slot
            .as_ref()
            .is_some_and(|s| s.fetched_at.elapsed() < self.ttl);
        if !fresh {
            let raw = source.fetch()?;
            let rows = normalize(&raw)?;
            self.slot = Some(CacheSlot {
                rows,
                fetched_at: Instant::now(),
            });
        }
        Ok(self.slot.as_ref().map_or(&[], |s| s.rows.as_slice()))
    }

    /// Drop the cached snapshot; the next access fetches.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// When the cached snapshot was fetched, if one is held.
    pub fn fetched_at(&self) -> Option<Instant> {
        self.slot.as_ref().map(|s| s.fetched_at)
    }
}
