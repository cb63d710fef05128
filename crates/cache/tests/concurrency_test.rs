//! Integration tests for concurrent recording, caching and cleanup

use dispatch_advisor::{
    AdvisorConfig, EvictionKind, OptimizationAdvisor, OptimizationRecommendation,
    OptimizationStrategy, Priority, RequestOutcome, RequestType,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("dispatch_advisor=debug")
        .try_init();
}

fn recommendation(reasoning: String) -> OptimizationRecommendation {
    OptimizationRecommendation::new(
        OptimizationStrategy::Parallelization,
        Priority::Medium,
        0.7,
        reasoning,
    )
}

fn advisor(kind: EvictionKind) -> Arc<OptimizationAdvisor> {
    advisor_with(kind, Duration::from_millis(20))
}

fn advisor_with(kind: EvictionKind, staleness: Duration) -> Arc<OptimizationAdvisor> {
    let config = AdvisorConfig::builder()
        .with_cache_capacity(32)
        .with_staleness_window(staleness)
        .with_eviction_policy(kind)
        .with_cleanup_interval(Duration::ZERO)
        .build()
        .unwrap();
    Arc::new(OptimizationAdvisor::new(config).unwrap())
}

/// Worker threads mix sweeps with recording, inserts and lookups for a fixed time
fn run_mixed_workload(advisor: &Arc<OptimizationAdvisor>, duration: Duration) {
    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));
    let stop = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let advisor = Arc::clone(advisor);
            let barrier = Arc::clone(&barrier);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                barrier.wait();
                let mut i = 0_u64;
                while !stop.load(Ordering::Relaxed) {
                    let key = RequestType::from(format!("type-{}", (t as u64 * 7 + i) % 97));
                    advisor.record_request(
                        &key,
                        RequestOutcome::from(i % 5 != 0),
                        Duration::from_micros(i % 300),
                    );
                    let hit = advisor.cache().get(&key).is_some();
                    advisor.record_cache_access(&key, hit);

                    let ttl = Duration::from_millis(1 + i % 15);
                    advisor
                        .cache()
                        .put(key.clone(), recommendation(format!("{t}-{i}")), ttl)
                        .unwrap();

                    if i % 16 == 0 {
                        advisor.cleanup_old_data();
                    }
                    if i % 64 == 0 {
                        advisor.cache().invalidate(&key);
                    }
                    i += 1;
                }
            })
        })
        .collect();

    thread::sleep(duration);
    stop.store(true, Ordering::Relaxed);
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_mixed_workload_leaves_only_live_entries() {
    init_tracing();

    for kind in [EvictionKind::Lru, EvictionKind::Lfu, EvictionKind::Ttl] {
        let advisor = advisor(kind);
        run_mixed_workload(&advisor, Duration::from_millis(300));

        let cache = advisor.cache();
        assert!(cache.len() <= cache.capacity(), "{kind}: cache overflowed");

        // A final sweep leaves every present key with an entry live at sweep time
        let sweep_started = Instant::now();
        advisor.cleanup_old_data();
        for key in cache.keys() {
            let info = cache.entry_info(&key).unwrap();
            assert!(info.expires_at > sweep_started, "{kind}: expired entry survived");
        }
        assert!(cache.tracked_len() <= cache.capacity());
    }
}

#[test]
fn test_sweeps_concurrent_with_recording_lose_nothing() {
    init_tracing();

    let advisor = advisor_with(EvictionKind::Lru, Duration::from_secs(5));
    let key = RequestType::from("always-busy");
    let stop = Arc::new(AtomicBool::new(false));

    let sweeper = {
        let advisor = Arc::clone(&advisor);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                advisor.cleanup_old_data();
            }
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let advisor = Arc::clone(&advisor);
            let key = key.clone();
            thread::spawn(move || {
                for _ in 0..5_000 {
                    advisor.record_request(&key, RequestOutcome::Success, Duration::from_nanos(1));
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    sweeper.join().unwrap();

    let snapshot = advisor.analytics().request_snapshot(&key).unwrap();
    assert_eq!(snapshot.total_requests, 20_000);
}

#[test]
fn test_idle_types_are_swept_while_others_are_recorded() {
    init_tracing();

    let advisor = advisor(EvictionKind::Lru);
    for i in 0..50 {
        advisor.record_request(
            &RequestType::from(format!("idle-{i}")),
            RequestOutcome::Success,
            Duration::from_millis(1),
        );
    }
    thread::sleep(Duration::from_millis(40));

    let active = RequestType::from("active");
    advisor.record_request(&active, RequestOutcome::Success, Duration::from_millis(1));
    let report = advisor.cleanup_old_data();

    assert_eq!(report.stale_request_entries, 50);
    assert_eq!(advisor.analytics().request_types(), vec![active]);
}
