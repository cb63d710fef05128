//! Data cleanup: sweeps stale analytics and expired recommendations
//!
//! A sweep snapshots the candidate keys, then removes each one with a single
//! conditional map operation. Nothing is held across the whole pass, so
//! readers and writers keep running while it executes.

mod background;

pub use background::{start_cleanup_task, CleanupHandle};

use crate::analytics::MetricsStore;
use crate::cache::RecommendationCache;
use crate::errors::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub stale_request_entries: usize,
    pub stale_caching_entries: usize,
    pub expired_recommendations: usize,
    pub elapsed: Duration,
}

impl CleanupReport {
    pub fn total_removed(&self) -> usize {
        self.stale_request_entries + self.stale_caching_entries + self.expired_recommendations
    }
}

/// Lifetime totals across sweeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStats {
    pub sweeps: u64,
    pub stale_entries_removed: u64,
    pub expired_recommendations_removed: u64,
}

#[derive(Debug, Default)]
struct CleanupCounters {
    sweeps: AtomicU64,
    stale_entries_removed: AtomicU64,
    expired_recommendations_removed: AtomicU64,
}

/// Removes stale metrics and expired cache entries
pub struct CleanupManager {
    store: Arc<MetricsStore>,
    cache: Arc<RecommendationCache>,
    staleness_window: Duration,
    counters: CleanupCounters,
}

impl CleanupManager {
    pub fn new(
        store: Arc<MetricsStore>,
        cache: Arc<RecommendationCache>,
        staleness_window: Duration,
    ) -> Result<Self> {
        if staleness_window.is_zero() {
            return Err(AdvisorError::invalid_configuration(
                "staleness_window",
                "staleness window must be greater than zero",
            ));
        }

        Ok(Self {
            store,
            cache,
            staleness_window,
            counters: CleanupCounters::default(),
        })
    }

    /// Run one sweep.
    ///
    /// Safe to call concurrently with itself and with recording, lookups and
    /// inserts. Entries already removed by a racing thread are skipped.
    pub fn cleanup_old_data(&self) -> CleanupReport {
        let started = Instant::now();

        // Fixed once per sweep; anything touched after it survives
        let stale = match started.checked_sub(self.staleness_window) {
            Some(cutoff) => self.store.remove_stale(cutoff),
            None => Default::default(),
        };

        let expired = self.cache.purge_expired();
        self.cache.reconcile_tracking();

        let report = CleanupReport {
            stale_request_entries: stale.request_entries,
            stale_caching_entries: stale.caching_entries,
            expired_recommendations: expired,
            elapsed: started.elapsed(),
        };

        self.counters.sweeps.fetch_add(1, Ordering::Relaxed);
        self.counters.stale_entries_removed.fetch_add(
            (stale.request_entries + stale.caching_entries) as u64,
            Ordering::Relaxed,
        );
        self.counters
            .expired_recommendations_removed
            .fetch_add(expired as u64, Ordering::Relaxed);

        debug!(
            removed = report.total_removed(),
            stale_requests = report.stale_request_entries,
            stale_caching = report.stale_caching_entries,
            expired = report.expired_recommendations,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "cleanup sweep finished"
        );

        report
    }

    pub fn staleness_window(&self) -> Duration {
        self.staleness_window
    }

    pub fn stats(&self) -> CleanupStats {
        CleanupStats {
            sweeps: self.counters.sweeps.load(Ordering::Relaxed),
            stale_entries_removed: self.counters.stale_entries_removed.load(Ordering::Relaxed),
            expired_recommendations_removed: self
                .counters
                .expired_recommendations_removed
                .load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CleanupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupManager")
            .field("staleness_window", &self.staleness_window)
            .field("stats", &self.stats())
            .finish()
    }
}
