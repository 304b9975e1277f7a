//! End-to-end [`PeriodicLeaderboard`] scenarios against a real Redis instance.
#![cfg(feature = "redis-integration")]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use zrank_lb::{CycleSpec, LeaderboardOptions, PeriodicLeaderboard, PeriodicOptions, PredefinedCycle};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_base_key(test_name: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("zrank-lb-test:periodic:{test_name}:{}:{n}", std::process::id())
}

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

async fn cleanup(periodic: &PeriodicLeaderboard<i64>, cycle_keys: &[&str]) {
    for cycle_key in cycle_keys {
        periodic.get_leaderboard(cycle_key).await.clear().await.unwrap();
    }
}

#[tokio::test]
async fn existing_keys_matches_populated_cycles() {
    let base_key = unique_base_key("existing");
    let pool = zrank_lb::pool::get_redis_pool(redis_url()).expect("pool config is well-formed");
    let periodic = PeriodicLeaderboard::<i64>::new(
        pool,
        base_key.clone(),
        PeriodicOptions::new(
            LeaderboardOptions::default(),
            CycleSpec::Predefined(PredefinedCycle::Daily),
        ),
    );

    let a = periodic.get_leaderboard("y2024-m12-d25").await;
    let b = periodic.get_leaderboard("y2024-m12-d26").await;
    a.update_one("alice", 10, None).await.unwrap();
    b.update_one("bob", 20, None).await.unwrap();

    let found = periodic.get_existing_keys().await.unwrap();
    let expected: HashSet<String> = ["y2024-m12-d25", "y2024-m12-d26"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(found, expected);

    cleanup(&periodic, &["y2024-m12-d25", "y2024-m12-d26"]).await;
}

#[tokio::test]
async fn same_cycle_key_returns_the_same_instance() {
    let base_key = unique_base_key("same-instance");
    let pool = zrank_lb::pool::get_redis_pool(redis_url()).expect("pool config is well-formed");
    let periodic = PeriodicLeaderboard::<i64>::new(
        pool,
        base_key,
        PeriodicOptions::new(
            LeaderboardOptions::default(),
            CycleSpec::Predefined(PredefinedCycle::Weekly),
        ),
    );

    let a = periodic.get_leaderboard("w01").await;
    a.update_one("x", 1, None).await.unwrap();
    let b = periodic.get_leaderboard("w01").await;

    // Same cached Leaderboard instance: a write through `a` is visible without a round trip
    // through `b`'s own construction, since both point at the identical qualified key.
    assert_eq!(a.key(), b.key());
    assert_eq!(b.find(&zrank_lb::EntryId::new("x")).await.unwrap().unwrap().score, 1);

    cleanup(&periodic, &["w01"]).await;
}
