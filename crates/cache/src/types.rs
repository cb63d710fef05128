//! Shared domain types for request analytics and recommendations

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Key identifying a category of dispatched request.
///
/// Request types join the metrics store, the recommendation cache and the
/// eviction policy's tracking structure. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestType(Arc<str>);

impl RequestType {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Key for a Rust request type, named after its type path
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequestType {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Borrow<str> for RequestType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Result of a dispatched request as reported by the middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    Success,
    Failure,
}

impl RequestOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<bool> for RequestOutcome {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// Optimization strategy suggested by a recommender
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStrategy {
    None,
    EnableCaching,
    BatchProcessing,
    Parallelization,
    CircuitBreaker,
    ConnectionPooling,
    MemoryPooling,
    Custom(String),
}

/// Urgency attached to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Recommendation payload produced by an external scorer.
///
/// The advisor stores, expires and evicts recommendations; it never
/// interprets their content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    pub strategy: OptimizationStrategy,
    pub priority: Priority,
    /// Scorer confidence, conventionally in `0.0..=1.0`
    pub confidence: f64,
    /// Human-readable reasoning
    pub reasoning: String,
    /// Expected latency gain if the recommendation is applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_improvement: Option<Duration>,
}

impl OptimizationRecommendation {
    pub fn new(
        strategy: OptimizationStrategy,
        priority: Priority,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            strategy,
            priority,
            confidence,
            reasoning: reasoning.into(),
            estimated_improvement: None,
        }
    }

    #[must_use]
    pub fn with_estimated_improvement(mut self, improvement: Duration) -> Self {
        self.estimated_improvement = Some(improvement);
        self
    }
}
