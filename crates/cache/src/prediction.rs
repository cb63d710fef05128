//! Bounded queue of recent forecasts for trend analysis
//!
//! The queue is FIFO-bounded by element count, not by age: once full, each
//! append drops the oldest result.

use crate::bounded::BoundedPush;
use crate::errors::{AdvisorError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Relative slope below which a trend counts as flat
const STABLE_SLOPE_THRESHOLD: f64 = 0.01;

/// What a forecast predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastKind {
    Throughput,
    Latency,
    ErrorRate,
}

/// One forecast produced by an external predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub kind: ForecastKind,
    pub value: f64,
    pub confidence: f64,
    pub predicted_at: DateTime<Utc>,
}

impl PredictionResult {
    pub fn new(kind: ForecastKind, value: f64, confidence: f64) -> Self {
        Self {
            kind,
            value,
            confidence,
            predicted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

/// Summary of the values currently in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionTrend {
    pub samples: usize,
    pub mean_value: f64,
    pub mean_confidence: f64,
    /// Least-squares slope of value per append
    pub slope: f64,
    pub direction: TrendDirection,
}

/// Bounded, append-only record of recent prediction results
#[derive(Debug)]
pub struct PredictionQueue {
    results: Mutex<VecDeque<PredictionResult>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl PredictionQueue {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            tracing::warn!("rejected prediction queue with zero capacity");
            return Err(AdvisorError::invalid_configuration(
                "prediction_capacity",
                "prediction queue capacity must be at least 1",
            ));
        }

        Ok(Self {
            results: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
        })
    }

    /// Append to the tail, dropping the head once over capacity
    pub fn append(&self, result: PredictionResult) {
        let dropped = self.results.lock().push_bounded(result, self.capacity);
        if dropped > 0 {
            self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        }
    }

    /// Current contents, oldest first
    pub fn snapshot(&self) -> Vec<PredictionResult> {
        self.results.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<PredictionResult> {
        self.results.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Results dropped to stay within capacity since creation
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.results.lock().clear();
    }

    /// Trend over all queued results
    pub fn trend(&self) -> Option<PredictionTrend> {
        Self::trend_of(self.snapshot().iter())
    }

    /// Trend over queued results of one kind
    pub fn trend_for(&self, kind: ForecastKind) -> Option<PredictionTrend> {
        Self::trend_of(self.snapshot().iter().filter(|r| r.kind == kind))
    }

    fn trend_of<'a>(results: impl Iterator<Item = &'a PredictionResult>) -> Option<PredictionTrend> {
        let points: Vec<(f64, f64)> = results.map(|r| (r.value, r.confidence)).collect();
        if points.is_empty() {
            return None;
        }

        let n = points.len() as f64;
        let mean_value = points.iter().map(|(v, _)| v).sum::<f64>() / n;
        let mean_confidence = points.iter().map(|(_, c)| c).sum::<f64>() / n;
        let mean_x = (n - 1.0) / 2.0;

        let (covariance, variance) = points.iter().enumerate().fold(
            (0.0, 0.0),
            |(cov, var), (i, (value, _))| {
                let dx = i as f64 - mean_x;
                (cov + dx * (value - mean_value), var + dx * dx)
            },
        );
        let slope = if variance == 0.0 {
            0.0
        } else {
            covariance / variance
        };

        let scale = mean_value.abs().max(f64::EPSILON);
        let direction = if (slope / scale).abs() < STABLE_SLOPE_THRESHOLD {
            TrendDirection::Stable
        } else if slope > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        };

        Some(PredictionTrend {
            samples: points.len(),
            mean_value,
            mean_confidence,
            slope,
            direction,
        })
    }
}
