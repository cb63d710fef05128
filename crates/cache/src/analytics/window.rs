//! Rolling window statistics for time-based hit rate analysis

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Tumbling hit/miss counter that resets once its window has elapsed.
///
/// The window start is an atomic offset from a fixed epoch, so recording never
/// takes a lock. Increments racing with a reset may be dropped; the counter is
/// an estimate.
pub struct RollingWindow {
    epoch: Instant,
    /// Nanoseconds after `epoch`
    window_start: AtomicU64,
    window_nanos: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RollingWindow {
    pub fn new(duration: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            window_start: AtomicU64::new(0),
            window_nanos: u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn record_hit(&self) {
        self.roll_window();
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.roll_window();
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hit_rate(&self) -> f64 {
        self.roll_window();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    fn roll_window(&self) {
        let now = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let start = self.window_start.load(Ordering::Acquire);

        if now.saturating_sub(start) > self.window_nanos
            && self
                .window_start
                .compare_exchange(start, now, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.hits.store(0, Ordering::Relaxed);
            self.misses.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let window = RollingWindow::new(Duration::from_millis(200));

        for _ in 0..7 {
            window.record_hit();
        }
        for _ in 0..3 {
            window.record_miss();
        }

        assert!((window.hit_rate() - 0.7).abs() < 0.01);

        // Wait for window to expire
        std::thread::sleep(Duration::from_millis(300));

        assert_eq!(window.hit_rate(), 0.0);
    }
}
