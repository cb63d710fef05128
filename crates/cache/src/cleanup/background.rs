//! Background cleanup task management

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::CleanupManager;

/// Handle to a running cleanup task. The task stops when the handle drops.
#[derive(Debug)]
pub struct CleanupHandle {
    handle: Option<JoinHandle<()>>,
}

impl CleanupHandle {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the task. A sweep in progress runs to completion first since
    /// sweeps never yield.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the background cleanup task on the current tokio runtime.
///
/// A zero interval starts nothing (useful for tests); the returned handle then
/// reports `is_running() == false`.
pub fn start_cleanup_task(manager: Arc<CleanupManager>, interval: Duration) -> CleanupHandle {
    if interval == Duration::ZERO {
        return CleanupHandle { handle: None };
    }

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = manager.cleanup_old_data();
            if report.total_removed() > 0 {
                tracing::info!(
                    removed = report.total_removed(),
                    "background cleanup removed stale data"
                );
            }
        }
    });

    CleanupHandle {
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MetricsStore;
    use crate::cache::RecommendationCache;
    use crate::eviction::EvictionKind;

    fn manager() -> Arc<CleanupManager> {
        let store = Arc::new(MetricsStore::new(8));
        let cache = Arc::new(RecommendationCache::with_policy(4, EvictionKind::Lru).unwrap());
        Arc::new(CleanupManager::new(store, cache, Duration::from_secs(1)).unwrap())
    }

    #[tokio::test]
    async fn test_background_task_sweeps_periodically() {
        let manager = manager();
        let mut handle = start_cleanup_task(Arc::clone(&manager), Duration::from_millis(10));
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(manager.stats().sweeps >= 2);

        handle.stop();
        assert!(!handle.is_running());
        let sweeps = manager.stats().sweeps;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(manager.stats().sweeps, sweeps);
    }

    #[tokio::test]
    async fn test_zero_interval_starts_nothing() {
        let manager = manager();
        let handle = start_cleanup_task(Arc::clone(&manager), Duration::ZERO);
        assert!(!handle.is_running());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.stats().sweeps, 0);
    }
}
