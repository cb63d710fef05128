//! Per-request-type running statistics
//!
//! Observations only need a shared reference to the entry: counters sit
//! behind a per-entry lock and the last-seen time is atomic. Writers keep the
//! map shard's read guard while they update an entry; the cleanup sweep removes entries under the shard's write guard and
//! re-checks staleness, so an update can never land in a removed entry.

use crate::bounded::BoundedPush;
use crate::types::{RequestOutcome, RequestType};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Monotonic "last seen" timestamp stored as an offset from creation
#[derive(Debug)]
struct LastSeen {
    origin: Instant,
    offset_nanos: AtomicU64,
}

impl LastSeen {
    fn new(origin: Instant) -> Self {
        Self {
            origin,
            offset_nanos: AtomicU64::new(0),
        }
    }

    fn touch(&self, now: Instant) {
        let offset = nanos(now.saturating_duration_since(self.origin));
        self.offset_nanos.fetch_max(offset, Ordering::AcqRel);
    }

    fn get(&self) -> Instant {
        self.origin + Duration::from_nanos(self.offset_nanos.load(Ordering::Acquire))
    }
}

#[derive(Debug)]
struct RequestCounters {
    successes: u64,
    failures: u64,
    total_execution_nanos: u64,
    min_execution_nanos: u64,
    max_execution_nanos: u64,
    recent: VecDeque<Duration>,
}

/// Running execution statistics for one request type
///
/// Counters share one per-entry lock so a snapshot never mixes moments.
#[derive(Debug)]
pub struct RequestAnalysisData {
    counters: Mutex<RequestCounters>,
    recent_capacity: usize,
    last_seen: LastSeen,
}

impl RequestAnalysisData {
    fn new(now: Instant, recent_capacity: usize) -> Self {
        Self {
            counters: Mutex::new(RequestCounters {
                successes: 0,
                failures: 0,
                total_execution_nanos: 0,
                min_execution_nanos: u64::MAX,
                max_execution_nanos: 0,
                recent: VecDeque::with_capacity(recent_capacity),
            }),
            recent_capacity,
            last_seen: LastSeen::new(now),
        }
    }

    fn record(&self, outcome: RequestOutcome, duration: Duration, now: Instant) {
        self.last_seen.touch(now);
        let elapsed = nanos(duration);

        let mut counters = self.counters.lock();
        if outcome.is_success() {
            counters.successes += 1;
        } else {
            counters.failures += 1;
        }
        counters.total_execution_nanos = counters.total_execution_nanos.saturating_add(elapsed);
        counters.min_execution_nanos = counters.min_execution_nanos.min(elapsed);
        counters.max_execution_nanos = counters.max_execution_nanos.max(elapsed);
        counters.recent.push_bounded(duration, self.recent_capacity);
    }

    pub fn last_observed_at(&self) -> Instant {
        self.last_seen.get()
    }

    /// Point-in-time copy
    pub fn snapshot(&self, now: Instant) -> RequestAnalysis {
        let counters = self.counters.lock();
        let total_requests = counters.successes + counters.failures;
        let total_nanos = counters.total_execution_nanos;

        RequestAnalysis {
            total_requests,
            successful_requests: counters.successes,
            failed_requests: counters.failures,
            total_execution_time: Duration::from_nanos(total_nanos),
            average_execution_time: if total_requests == 0 {
                Duration::ZERO
            } else {
                Duration::from_nanos(total_nanos / total_requests)
            },
            min_execution_time: if counters.min_execution_nanos == u64::MAX {
                Duration::ZERO
            } else {
                Duration::from_nanos(counters.min_execution_nanos)
            },
            max_execution_time: Duration::from_nanos(counters.max_execution_nanos),
            recent_execution_times: counters.recent.iter().copied().collect(),
            idle_for: now.saturating_duration_since(self.last_observed_at()),
        }
    }
}

/// Cache effectiveness statistics for one request type
#[derive(Debug)]
pub struct CachingAnalysisData {
    /// Hits and misses
    counts: Mutex<(u64, u64)>,
    last_seen: LastSeen,
}

impl CachingAnalysisData {
    fn new(now: Instant) -> Self {
        Self {
            counts: Mutex::new((0, 0)),
            last_seen: LastSeen::new(now),
        }
    }

    fn record(&self, hit: bool, now: Instant) {
        self.last_seen.touch(now);
        let mut counts = self.counts.lock();
        if hit {
            counts.0 += 1;
        } else {
            counts.1 += 1;
        }
    }

    pub fn last_accessed_at(&self) -> Instant {
        self.last_seen.get()
    }

    /// Point-in-time copy
    pub fn snapshot(&self, now: Instant) -> CachingAnalysis {
        let (hits, misses) = *self.counts.lock();
        CachingAnalysis {
            hits,
            misses,
            idle_for: now.saturating_duration_since(self.last_accessed_at()),
        }
    }
}

/// Copy of [`RequestAnalysisData`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAnalysis {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_execution_time: Duration,
    pub average_execution_time: Duration,
    pub min_execution_time: Duration,
    pub max_execution_time: Duration,
    /// Most recent execution times, oldest first
    pub recent_execution_times: Vec<Duration>,
    /// Time since the last observation when the copy was taken
    pub idle_for: Duration,
}

impl RequestAnalysis {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }

    /// Nearest-rank percentile over the recent samples, `percentile` in `0..=100`
    pub fn recent_percentile(&self, percentile: f64) -> Option<Duration> {
        if self.recent_execution_times.is_empty() {
            return None;
        }
        let mut sorted = self.recent_execution_times.clone();
        sorted.sort_unstable();
        let rank = (percentile.clamp(0.0, 100.0) / 100.0 * sorted.len() as f64).ceil() as usize;
        Some(sorted[rank.saturating_sub(1).min(sorted.len() - 1)])
    }

    pub fn p95_execution_time(&self) -> Option<Duration> {
        self.recent_percentile(95.0)
    }
}

/// Copy of [`CachingAnalysisData`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachingAnalysis {
    pub hits: u64,
    pub misses: u64,
    pub idle_for: Duration,
}

impl CachingAnalysis {
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_ratio(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Counts of entries removed by [`MetricsStore::remove_stale`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaleRemoval {
    pub request_entries: usize,
    pub caching_entries: usize,
}

/// Mapping from request type to its mutable running statistics
#[derive(Debug)]
pub struct MetricsStore {
    requests: DashMap<RequestType, RequestAnalysisData>,
    caching: DashMap<RequestType, CachingAnalysisData>,
    recent_sample_capacity: usize,
}

impl MetricsStore {
    /// `recent_sample_capacity` bounds the per-type recent execution samples
    pub fn new(recent_sample_capacity: usize) -> Self {
        Self {
            requests: DashMap::new(),
            caching: DashMap::new(),
            recent_sample_capacity: recent_sample_capacity.max(1),
        }
    }

    pub(crate) fn record_request(
        &self,
        request_type: &RequestType,
        outcome: RequestOutcome,
        duration: Duration,
        now: Instant,
    ) {
        if let Some(data) = self.requests.get(request_type) {
            data.record(outcome, duration, now);
            return;
        }

        // First observation: entry() creates at most once per key
        let data = self
            .requests
            .entry(request_type.clone())
            .or_insert_with(|| RequestAnalysisData::new(now, self.recent_sample_capacity))
            .downgrade();
        data.record(outcome, duration, now);
    }

    pub(crate) fn record_cache_access(&self, request_type: &RequestType, hit: bool, now: Instant) {
        if let Some(data) = self.caching.get(request_type) {
            data.record(hit, now);
            return;
        }

        let data = self
            .caching
            .entry(request_type.clone())
            .or_insert_with(|| CachingAnalysisData::new(now))
            .downgrade();
        data.record(hit, now);
    }

    pub fn request_analysis(&self, request_type: &RequestType, now: Instant) -> Option<RequestAnalysis> {
        self.requests
            .get(request_type)
            .map(|data| data.snapshot(now))
    }

    pub fn caching_analysis(&self, request_type: &RequestType, now: Instant) -> Option<CachingAnalysis> {
        self.caching.get(request_type).map(|data| data.snapshot(now))
    }

    /// All request types with any recorded data, sorted
    pub fn request_types(&self) -> Vec<RequestType> {
        let mut keys: Vec<RequestType> = self
            .requests
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.caching.iter().map(|entry| entry.key().clone()))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    pub fn remove(&self, request_type: &RequestType) -> bool {
        let requests = self.requests.remove(request_type).is_some();
        let caching = self.caching.remove(request_type).is_some();
        requests || caching
    }

    /// Remove entries last observed before `cutoff`.
    ///
    /// Keys are snapshotted first, then each is removed only if it is still
    /// stale at removal time. Entries touched after `cutoff` are never removed.
    pub fn remove_stale(&self, cutoff: Instant) -> StaleRemoval {
        let stale_requests: Vec<RequestType> = self
            .requests
            .iter()
            .filter(|entry| entry.value().last_observed_at() < cutoff)
            .map(|entry| entry.key().clone())
            .collect();
        let stale_caching: Vec<RequestType> = self
            .caching
            .iter()
            .filter(|entry| entry.value().last_accessed_at() < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removal = StaleRemoval::default();
        for key in &stale_requests {
            if self
                .requests
                .remove_if(key, |_, data| data.last_observed_at() < cutoff)
                .is_some()
            {
                removal.request_entries += 1;
            }
        }
        for key in &stale_caching {
            if self
                .caching
                .remove_if(key, |_, data| data.last_accessed_at() < cutoff)
                .is_some()
            {
                removal.caching_entries += 1;
            }
        }
        removal
    }

    pub fn request_entry_count(&self) -> usize {
        self.requests.len()
    }

    pub fn caching_entry_count(&self) -> usize {
        self.caching.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.caching.is_empty()
    }

    pub fn clear(&self) {
        self.requests.clear();
        self.caching.clear();
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(100)
    }
}
