//! Request analytics: the metrics store and the aggregator in front of it

mod aggregator;
mod store;
mod window;

pub use aggregator::{AnalyticsAggregator, AnalyticsSnapshot, AnalyticsSummary};
pub use store::{
    CachingAnalysis, CachingAnalysisData, MetricsStore, RequestAnalysis, RequestAnalysisData,
    StaleRemoval,
};
pub use window::RollingWindow;
