//! End-to-end scenarios across the public API

use dispatch_advisor::eviction::LruPolicy;
use dispatch_advisor::{
    AdvisorConfig, AnalyticsSnapshot, EvictionKind, EvictionPolicy, ForecastKind,
    OptimizationAdvisor, OptimizationRecommendation, OptimizationStrategy, PredictionResult,
    Priority, RecommendationCache, RequestOutcome, RequestType,
};
use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

const TTL: Duration = Duration::from_secs(60);

fn recommendation(strategy: OptimizationStrategy) -> OptimizationRecommendation {
    OptimizationRecommendation::new(strategy, Priority::Medium, 0.75, "scenario")
}

#[test]
fn test_capacity_three_scenario() {
    let cache = RecommendationCache::with_policy(3, EvictionKind::Lru).unwrap();
    let keys: Vec<RequestType> = ["a", "b", "c", "d"].into_iter().map(RequestType::from).collect();

    for key in &keys[..3] {
        cache
            .put(key.clone(), recommendation(OptimizationStrategy::EnableCaching), TTL)
            .unwrap();
    }
    assert_eq!(cache.stats().evictions, 0);

    cache
        .put(keys[3].clone(), recommendation(OptimizationStrategy::BatchProcessing), TTL)
        .unwrap();

    assert!(cache.get(&keys[0]).is_none());
    for key in &keys[1..] {
        assert!(cache.get(key).is_some(), "{key} should be cached");
    }
}

#[test]
fn test_lru_policy_contract() {
    let policy = LruPolicy::new();
    let deadline = Instant::now() + TTL;
    let [a, b, c] = ["A", "B", "C"].map(RequestType::from);
    let all: HashSet<RequestType> = [a.clone(), b.clone(), c.clone()].into_iter().collect();
    let present = |k: &RequestType| all.contains(k);

    policy.on_add(&a, deadline);
    policy.on_add(&b, deadline);
    policy.on_add(&c, deadline);
    assert_eq!(policy.key_to_evict(&present), Some(a.clone()));

    policy.on_access(&a);
    assert_eq!(policy.key_to_evict(&present), Some(b.clone()));

    policy.on_remove(&a);
    policy.on_add(&a, deadline);
    assert_eq!(policy.key_to_evict(&present), Some(b.clone()));

    // B vanished from the cache behind the policy's back
    let without_b = |k: &RequestType| k != &b && all.contains(k);
    assert_eq!(policy.key_to_evict(&without_b), Some(c));
    assert_eq!(policy.key_to_evict(&|_: &RequestType| false), None);
}

#[test]
fn test_expired_entry_is_never_a_hit() {
    let cache = RecommendationCache::with_policy(8, EvictionKind::Ttl).unwrap();
    let key = RequestType::from("flash");
    cache
        .put(key.clone(), recommendation(OptimizationStrategy::CircuitBreaker), Duration::from_millis(15))
        .unwrap();

    thread::sleep(Duration::from_millis(30));
    assert!(!cache.contains_key(&key));
    assert!(cache.get(&key).is_none());
}

#[test]
fn test_prediction_queue_keeps_latest_in_order() {
    let advisor = OptimizationAdvisor::new(
        AdvisorConfig::builder()
            .with_prediction_capacity(8)
            .build()
            .unwrap(),
    )
    .unwrap();

    for i in 0..13 {
        advisor
            .predictions()
            .append(PredictionResult::new(ForecastKind::Latency, f64::from(i), 0.9));
    }

    let values: Vec<f64> = advisor
        .predictions()
        .snapshot()
        .into_iter()
        .map(|r| r.value)
        .collect();
    assert_eq!(values, (5..13).map(f64::from).collect::<Vec<_>>());
}

#[test]
fn test_advisor_end_to_end() {
    let advisor = OptimizationAdvisor::new(
        AdvisorConfig::builder()
            .with_cache_capacity(2)
            .with_default_ttl(Duration::from_millis(50))
            .with_staleness_window(Duration::from_millis(50))
            .build()
            .unwrap(),
    )
    .unwrap();

    let scorer = |snapshot: &AnalyticsSnapshot| {
        let caching = snapshot.caching.as_ref()?;
        (caching.hit_ratio() < 0.5)
            .then(|| recommendation(OptimizationStrategy::EnableCaching))
    };

    let key = RequestType::from("inventory.lookup");
    advisor.record_request(&key, RequestOutcome::Success, Duration::from_millis(12));
    advisor.record_cache_access(&key, false);

    let rec = advisor.recommendation_for(&key, &scorer).unwrap().unwrap();
    assert_eq!(rec.strategy, OptimizationStrategy::EnableCaching);
    assert!(advisor.cache().contains_key(&key));

    thread::sleep(Duration::from_millis(80));
    let report = advisor.cleanup_old_data();
    assert_eq!(report.expired_recommendations, 1);
    assert_eq!(report.stale_request_entries, 1);
    assert_eq!(report.stale_caching_entries, 1);
    assert!(advisor.analytics().snapshot(&key).is_none());
    assert!(advisor.cache().is_empty());
}
