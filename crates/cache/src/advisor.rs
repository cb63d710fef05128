//! Advisor facade wiring analytics, recommendations, cleanup and predictions
//!
//! Every component is constructed here and shared through `Arc`; nothing is
//! process-global. Dropping the advisor stops its background cleanup.

use crate::analytics::{AnalyticsAggregator, AnalyticsSnapshot, MetricsStore};
use crate::cache::RecommendationCache;
use crate::cleanup::{start_cleanup_task, CleanupHandle, CleanupManager, CleanupReport};
use crate::config::AdvisorConfig;
use crate::errors::Result;
use crate::eviction::create_eviction_policy;
use crate::prediction::PredictionQueue;
use crate::types::{OptimizationRecommendation, RequestOutcome, RequestType};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// External scorer turning analytics into a recommendation
pub trait Recommender: Send + Sync {
    /// `None` means there is nothing worth recommending yet
    fn recommend(&self, snapshot: &AnalyticsSnapshot) -> Option<OptimizationRecommendation>;
}

impl<F> Recommender for F
where
    F: Fn(&AnalyticsSnapshot) -> Option<OptimizationRecommendation> + Send + Sync,
{
    fn recommend(&self, snapshot: &AnalyticsSnapshot) -> Option<OptimizationRecommendation> {
        self(snapshot)
    }
}

/// Owns one instance of each component
pub struct OptimizationAdvisor {
    config: AdvisorConfig,
    analytics: AnalyticsAggregator,
    cache: Arc<RecommendationCache>,
    cleanup: Arc<CleanupManager>,
    predictions: PredictionQueue,
    background: Mutex<Option<CleanupHandle>>,
}

impl OptimizationAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(MetricsStore::new(config.recent_sample_capacity));
        let cache = Arc::new(RecommendationCache::new(
            config.cache_capacity,
            create_eviction_policy(config.eviction_policy),
        )?);
        let cleanup = Arc::new(CleanupManager::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            config.staleness_window,
        )?);
        let predictions = PredictionQueue::new(config.prediction_capacity)?;

        info!(
            capacity = config.cache_capacity,
            policy = %config.eviction_policy,
            "optimization advisor initialized"
        );

        Ok(Self {
            analytics: AnalyticsAggregator::new(store),
            cache,
            cleanup,
            predictions,
            background: Mutex::new(None),
            config,
        })
    }

    pub fn record_request(
        &self,
        request_type: &RequestType,
        outcome: RequestOutcome,
        duration: Duration,
    ) {
        self.analytics.record_request(request_type, outcome, duration);
    }

    pub fn record_cache_access(&self, request_type: &RequestType, hit: bool) {
        self.analytics.record_cache_access(request_type, hit);
    }

    /// Cached recommendation for `request_type`, or a fresh one from `recommender`.
    ///
    /// A fresh recommendation is cached with the configured default TTL.
    /// Returns `None` when the type has no analytics or the recommender
    /// declines.
    pub fn recommendation_for<R>(
        &self,
        request_type: &RequestType,
        recommender: &R,
    ) -> Result<Option<Arc<OptimizationRecommendation>>>
    where
        R: Recommender + ?Sized,
    {
        if let Some(cached) = self.cache.get(request_type) {
            return Ok(Some(cached));
        }

        let Some(snapshot) = self.analytics.snapshot(request_type) else {
            return Ok(None);
        };
        let Some(recommendation) = recommender.recommend(&snapshot) else {
            return Ok(None);
        };

        debug!(
            request_type = %request_type,
            strategy = ?recommendation.strategy,
            "caching fresh recommendation"
        );
        let shared = Arc::new(recommendation.clone());
        self.cache
            .put(request_type.clone(), recommendation, self.config.default_ttl)?;
        Ok(Some(shared))
    }

    /// Run one sweep now
    pub fn cleanup_old_data(&self) -> CleanupReport {
        self.cleanup.cleanup_old_data()
    }

    /// Start periodic sweeps on the current tokio runtime, replacing any
    /// running task. Does nothing when the configured interval is zero.
    pub fn start_background_cleanup(&self) {
        let handle = start_cleanup_task(Arc::clone(&self.cleanup), self.config.cleanup_interval);
        *self.background.lock() = Some(handle);
    }

    pub fn stop_background_cleanup(&self) {
        if let Some(mut handle) = self.background.lock().take() {
            handle.stop();
        }
    }

    pub fn analytics(&self) -> &AnalyticsAggregator {
        &self.analytics
    }

    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    pub fn cleanup(&self) -> &CleanupManager {
        &self.cleanup
    }

    pub fn predictions(&self) -> &PredictionQueue {
        &self.predictions
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }
}

impl std::fmt::Debug for OptimizationAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizationAdvisor")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("cleanup", &self.cleanup)
            .finish()
    }
}
