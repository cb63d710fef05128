//! Adaptive recommendation cache for a request-dispatch layer
//!
//! This crate observes per-request-type execution statistics, caches the
//! optimization recommendations an external scorer derives from them, and
//! keeps memory bounded under unbounded request-type churn:
//! - Analytics aggregation over a sharded, lock-per-shard metrics store
//! - A capacity-bounded recommendation cache with per-entry TTL
//! - Pluggable eviction policies (LRU, LFU, earliest-expiry)
//! - A cleanup sweep that never blocks readers, with an optional tokio task
//! - A bounded prediction queue with trend analysis

mod bounded;

pub mod advisor;
pub mod analytics;
pub mod cache;
pub mod cleanup;
pub mod config;
pub mod errors;
pub mod eviction;
pub mod prediction;
pub mod types;

pub use advisor::{OptimizationAdvisor, Recommender};
pub use analytics::{AnalyticsAggregator, AnalyticsSnapshot, AnalyticsSummary, MetricsStore};
pub use cache::{CacheEntryInfo, CacheStats, RecommendationCache};
pub use cleanup::{start_cleanup_task, CleanupHandle, CleanupManager, CleanupReport};
pub use config::{AdvisorConfig, AdvisorConfigBuilder, AdvisorConfigLoader, ConfigSource};
pub use errors::{AdvisorError, Error, RecoveryHint, Result};
pub use eviction::{create_eviction_policy, EvictionKind, EvictionPolicy};
pub use prediction::{ForecastKind, PredictionQueue, PredictionResult, PredictionTrend, TrendDirection};
pub use types::*;
