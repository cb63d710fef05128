//! Thread-safe recording and snapshotting of request analytics

use super::store::{CachingAnalysis, MetricsStore, RequestAnalysis};
use super::window::RollingWindow;
use crate::types::{RequestOutcome, RequestType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Default window for the recent cache hit rate
pub const DEFAULT_HIT_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Point-in-time analytics for one request type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub request_type: RequestType,
    pub requests: Option<RequestAnalysis>,
    pub caching: Option<CachingAnalysis>,
}

/// Totals across every tracked request type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub request_types: usize,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Hit rate over the rolling window only
    pub recent_cache_hit_rate: f64,
}

impl AnalyticsSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.total_requests - self.failed_requests) as f64 / self.total_requests as f64
        }
    }

    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// Records observations against request types and hands out copies.
///
/// Holds the store through an `Arc` so the cleanup manager can share it.
pub struct AnalyticsAggregator {
    store: Arc<MetricsStore>,
    hit_window: RollingWindow,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<MetricsStore>) -> Self {
        Self::with_hit_rate_window(store, DEFAULT_HIT_RATE_WINDOW)
    }

    pub fn with_hit_rate_window(store: Arc<MetricsStore>, window: Duration) -> Self {
        Self {
            store,
            hit_window: RollingWindow::new(window),
        }
    }

    /// Record one dispatched request
    pub fn record_request(
        &self,
        request_type: &RequestType,
        outcome: RequestOutcome,
        duration: Duration,
    ) {
        self.store
            .record_request(request_type, outcome, duration, Instant::now());
        trace!(request_type = %request_type, ?outcome, ?duration, "recorded request");
    }

    /// Record one cache lookup for a request type
    pub fn record_cache_access(&self, request_type: &RequestType, hit: bool) {
        self.store
            .record_cache_access(request_type, hit, Instant::now());
        if hit {
            self.hit_window.record_hit();
        } else {
            self.hit_window.record_miss();
        }
    }

    /// Copy of everything known about `request_type`, or `None` if untracked
    pub fn snapshot(&self, request_type: &RequestType) -> Option<AnalyticsSnapshot> {
        let now = Instant::now();
        let requests = self.store.request_analysis(request_type, now);
        let caching = self.store.caching_analysis(request_type, now);

        if requests.is_none() && caching.is_none() {
            return None;
        }

        Some(AnalyticsSnapshot {
            request_type: request_type.clone(),
            requests,
            caching,
        })
    }

    pub fn request_snapshot(&self, request_type: &RequestType) -> Option<RequestAnalysis> {
        self.store.request_analysis(request_type, Instant::now())
    }

    pub fn caching_snapshot(&self, request_type: &RequestType) -> Option<CachingAnalysis> {
        self.store.caching_analysis(request_type, Instant::now())
    }

    pub fn request_types(&self) -> Vec<RequestType> {
        self.store.request_types()
    }

    /// Snapshots of every tracked type, ordered by request type
    pub fn snapshot_all(&self) -> Vec<AnalyticsSnapshot> {
        self.request_types()
            .iter()
            .filter_map(|request_type| self.snapshot(request_type))
            .collect()
    }

    pub fn summary(&self) -> AnalyticsSummary {
        let mut summary = AnalyticsSummary {
            recent_cache_hit_rate: self.hit_window.hit_rate(),
            ..AnalyticsSummary::default()
        };

        for snapshot in self.snapshot_all() {
            summary.request_types += 1;
            if let Some(requests) = snapshot.requests {
                summary.total_requests += requests.total_requests;
                summary.failed_requests += requests.failed_requests;
            }
            if let Some(caching) = snapshot.caching {
                summary.cache_hits += caching.hits;
                summary.cache_misses += caching.misses;
            }
        }
        summary
    }

    /// Forget a request type entirely
    pub fn remove(&self, request_type: &RequestType) -> bool {
        self.store.remove(request_type)
    }

    pub fn store(&self) -> &Arc<MetricsStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn aggregator() -> AnalyticsAggregator {
        AnalyticsAggregator::new(Arc::new(MetricsStore::new(16)))
    }

    #[test]
    fn test_snapshot_of_unknown_type_is_none() {
        let analytics = aggregator();
        assert!(analytics.snapshot(&RequestType::from("nope")).is_none());
    }

    #[test]
    fn test_record_and_snapshot() {
        let analytics = aggregator();
        let key = RequestType::from("orders.get");

        analytics.record_request(&key, RequestOutcome::Success, Duration::from_millis(10));
        analytics.record_request(&key, RequestOutcome::Success, Duration::from_millis(30));
        analytics.record_request(&key, RequestOutcome::Failure, Duration::from_millis(20));
        analytics.record_cache_access(&key, true);
        analytics.record_cache_access(&key, false);
        analytics.record_cache_access(&key, true);

        let snapshot = analytics.snapshot(&key).unwrap();
        let requests = snapshot.requests.unwrap();
        assert_eq!(requests.total_requests, 3);
        assert_eq!(requests.successful_requests, 2);
        assert_eq!(requests.average_execution_time, Duration::from_millis(20));
        assert!((requests.success_rate() - 2.0 / 3.0).abs() < 1e-9);

        let caching = snapshot.caching.unwrap();
        assert_eq!(caching.hits, 2);
        assert_eq!(caching.misses, 1);
        assert!((caching.hit_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let analytics = aggregator();
        let key = RequestType::from("copy");
        analytics.record_request(&key, RequestOutcome::Success, Duration::from_millis(1));

        let before = analytics.request_snapshot(&key).unwrap();
        analytics.record_request(&key, RequestOutcome::Success, Duration::from_millis(1));

        assert_eq!(before.total_requests, 1);
        assert_eq!(analytics.request_snapshot(&key).unwrap().total_requests, 2);
    }

    #[test]
    fn test_concurrent_first_access_creates_one_entry_and_loses_nothing() {
        let analytics = Arc::new(aggregator());
        let key = RequestType::from("hot");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let analytics = Arc::clone(&analytics);
                let key = key.clone();
                thread::spawn(move || {
                    for i in 0..1_000 {
                        analytics.record_request(
                            &key,
                            RequestOutcome::from(i % 4 != 0),
                            Duration::from_micros(1),
                        );
                        analytics.record_cache_access(&key, i % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(analytics.store().request_entry_count(), 1);
        let snapshot = analytics.snapshot(&key).unwrap();
        let requests = snapshot.requests.unwrap();
        assert_eq!(requests.total_requests, 8_000);
        assert_eq!(requests.failed_requests, 2_000);
        assert_eq!(requests.total_execution_time, Duration::from_micros(8_000));
        assert_eq!(snapshot.caching.unwrap().total_accesses(), 8_000);
    }

    #[test]
    fn test_snapshot_is_consistent_while_writers_run() {
        let analytics = Arc::new(aggregator());
        let key = RequestType::from("contended");
        let duration = Duration::from_micros(3);

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let analytics = Arc::clone(&analytics);
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..20_000 {
                        analytics.record_request(&key, RequestOutcome::Failure, duration);
                    }
                })
            })
            .collect();

        while writers.iter().any(|w| !w.is_finished()) {
            if let Some(requests) = analytics.request_snapshot(&key) {
                let count = u32::try_from(requests.total_requests).unwrap();
                assert_eq!(requests.total_execution_time, duration * count);
                assert_eq!(requests.failed_requests, requests.total_requests);
                if count > 0 {
                    assert_eq!(requests.average_execution_time, duration);
                }
            }
        }
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(analytics.request_snapshot(&key).unwrap().total_requests, 80_000);
    }

    #[test]
    fn test_summary_across_types() {
        let analytics = aggregator();
        let a = RequestType::from("a");
        let b = RequestType::from("b");
        analytics.record_request(&a, RequestOutcome::Success, Duration::from_millis(1));
        analytics.record_request(&b, RequestOutcome::Failure, Duration::from_millis(1));
        analytics.record_cache_access(&b, true);

        let summary = analytics.summary();
        assert_eq!(summary.request_types, 2);
        assert_eq!(summary.total_requests, 2);
        assert!((summary.success_rate() - 0.5).abs() < 1e-9);
        assert_eq!(summary.cache_hit_ratio(), 1.0);
        assert_eq!(summary.recent_cache_hit_rate, 1.0);
        assert_eq!(analytics.request_types(), vec![a.clone(), b]);

        assert!(analytics.remove(&a));
        assert!(analytics.snapshot(&a).is_none());
    }
}
