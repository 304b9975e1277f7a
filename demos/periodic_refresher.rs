//! A small demo binary that keeps a periodic leaderboard's top-N trimmed on a fixed interval.
//!
//! This mirrors the cache-manager pattern this codebase already uses for its own periodic
//! background jobs: load configuration through `mkenv`, set up `tracing-subscriber`, then loop
//! on a `tokio::time::interval`, doing one unit of work per tick.

use std::time::Duration;

use anyhow::Context;
use mkenv::prelude::*;
use tokio::time;
use tracing::info;

use zrank_lb::{
    CycleSpec, LeaderboardOptions, PeriodicLeaderboard, PeriodicOptions, PredefinedCycle,
    SortPolicy, UpdatePolicy, env::RedisUrlEnv, pool::get_redis_pool,
};

const REFRESH_PERIOD: Duration = Duration::from_secs(60);
const TOP_N: i32 = 100;

fn setup_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .try_init()
        .map_err(|e| anyhow::format_err!("{e}"))
}

mkenv::make_config! {
    struct Env {
        redis_env: { RedisUrlEnv },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().context("loading .env")?;
    setup_tracing()?;

    let env = Env::define();
    env.init();

    let pool = get_redis_pool(env.redis_env.redis_url.get().clone())
        .context("creating the Redis connection pool")?;

    let periodic = PeriodicLeaderboard::<i64>::new(
        pool,
        "demo-daily-leaderboard",
        PeriodicOptions::new(
            LeaderboardOptions {
                sort_policy: SortPolicy::HighToLow,
                update_policy: UpdatePolicy::Best,
                limit_top_n: TOP_N,
            },
            CycleSpec::Predefined(PredefinedCycle::Daily),
        ),
    );

    let mut interval = time::interval(REFRESH_PERIOD);
    info!("periodic-refresher started, refreshing every {REFRESH_PERIOD:?}");

    loop {
        interval.tick().await;
        let lb = periodic.get_leaderboard_now().await?;
        let count = lb.count().await?;
        info!(key = lb.key(), count, "current cycle leaderboard size");
    }
}
