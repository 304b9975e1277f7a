//! [`PeriodicLeaderboard`]: a family of [`Leaderboard`]s keyed by a time-cycle identifier.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::{
    RedisPool,
    cycle::CycleSpec,
    error::LeaderboardResult,
    leaderboard::Leaderboard,
    options::LeaderboardOptions,
    redis_key::{periodic_key, strip_periodic_prefix},
    score::Score,
    script_host::ScriptHost,
    session::StoreSession,
};

const CACHE_CAPACITY: usize = 100;
const SCAN_COUNT: usize = 100;

/// Configuration for a [`PeriodicLeaderboard`].
#[derive(Clone)]
pub struct PeriodicOptions {
    /// The options every cycle's [`Leaderboard`] is constructed with.
    pub leaderboard_options: LeaderboardOptions,
    /// How a civil datetime is turned into a cycle key.
    pub cycle: CycleSpec,
    /// The clock used when a caller asks for "now" without supplying a time explicitly.
    ///
    /// Defaults to [`chrono::Utc::now`]'s naive UTC time; overridable so tests can inject a
    /// fixed clock, the same dependency-injection shape this codebase's own periodic jobs use
    /// for their tick source rather than calling a wall-clock function inline.
    pub now: Arc<dyn Fn() -> NaiveDateTime + Send + Sync>,
}

impl PeriodicOptions {
    /// Builds options for `cycle` using the real UTC clock.
    pub fn new(leaderboard_options: LeaderboardOptions, cycle: CycleSpec) -> Self {
        Self {
            leaderboard_options,
            cycle,
            now: Arc::new(|| chrono::Utc::now().naive_utc()),
        }
    }

    /// Overrides the clock, for deterministic tests.
    pub fn with_clock(mut self, now: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.now = Arc::new(now);
        self
    }
}

/// A family of [`Leaderboard`]s sharing a base key, keyed by a time-cycle identifier.
///
/// Member leaderboard instances are cached by qualified key in a bounded LRU map so repeated
/// lookups for the same cycle within the cache's lifetime return the same instance, without
/// unboundedly growing for long-running processes.
pub struct PeriodicLeaderboard<T: Score> {
    pool: RedisPool,
    scripts: Arc<ScriptHost>,
    base_key: String,
    options: PeriodicOptions,
    cache: Mutex<LruCache<String, Leaderboard<T>>>,
}

impl<T: Score> PeriodicLeaderboard<T> {
    /// Builds a periodic leaderboard family under `base_key`.
    pub fn new(pool: RedisPool, base_key: impl Into<String>, options: PeriodicOptions) -> Self {
        Self {
            pool,
            scripts: Arc::new(ScriptHost::new()),
            base_key: base_key.into(),
            options,
            cache: Mutex::new(LruCache::new(
                std::num::NonZeroUsize::new(CACHE_CAPACITY).expect("capacity is non-zero"),
            )),
        }
    }

    /// The base key prefix every member leaderboard's qualified key is derived from.
    pub fn base_key(&self) -> &str {
        &self.base_key
    }

    /// Resolves the cycle key for `time` per the configured [`CycleSpec`].
    pub fn get_key(&self, time: NaiveDateTime) -> LeaderboardResult<String> {
        self.options.cycle.key_for(time)
    }

    /// Resolves the cycle key for the configured clock's current time.
    pub fn get_key_now(&self) -> LeaderboardResult<String> {
        self.get_key((self.options.now)())
    }

    /// Returns the member [`Leaderboard`] for `cycle_key`, constructing and caching it on miss.
    pub async fn get_leaderboard(&self, cycle_key: &str) -> Leaderboard<T> {
        let qualified = periodic_key(&self.base_key, cycle_key);
        let mut cache = self.cache.lock().await;
        if let Some(existing) = cache.get(&qualified) {
            return existing.clone();
        }
        let lb = Leaderboard::with_script_host(
            self.pool.clone(),
            qualified.clone(),
            self.options.leaderboard_options,
            self.scripts.clone(),
        );
        cache.put(qualified, lb.clone());
        lb
    }

    /// Resolves `time` (or the configured clock's current time, if `None`) to its cycle key and
    /// returns the corresponding member [`Leaderboard`].
    pub async fn get_leaderboard_at(
        &self,
        time: Option<NaiveDateTime>,
    ) -> LeaderboardResult<Leaderboard<T>> {
        let key = match time {
            Some(time) => self.get_key(time)?,
            None => self.get_key_now()?,
        };
        Ok(self.get_leaderboard(&key).await)
    }

    /// Equivalent to `get_leaderboard_at(None)`.
    pub async fn get_leaderboard_now(&self) -> LeaderboardResult<Leaderboard<T>> {
        self.get_leaderboard_at(None).await
    }

    /// Discovers every cycle key with an existing qualified key in the store, via an incremental
    /// `SCAN` over the `{base_key}:*` pattern.
    pub async fn get_existing_keys(&self) -> LeaderboardResult<HashSet<String>> {
        let mut session = StoreSession::acquire(&self.pool).await?;
        let pattern = format!("{}:*", self.base_key);

        let mut cursor: u64 = 0;
        let mut keys = HashSet::new();
        loop {
            let (next_cursor, page): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(session.conn())
                .await?;

            for qualified in page {
                if let Some(cycle_key) = strip_periodic_prefix(&self.base_key, &qualified) {
                    keys.insert(cycle_key.to_string());
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::PredefinedCycle;
    use crate::options::LeaderboardOptions;

    fn fake_pool() -> RedisPool {
        deadpool_redis::Config::from_url("redis://127.0.0.1:1/")
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .expect("pool config is well-formed")
    }

    #[tokio::test]
    async fn cached_lookup_returns_same_qualified_key() {
        let periodic = PeriodicLeaderboard::<i64>::new(
            fake_pool(),
            "season",
            PeriodicOptions::new(
                LeaderboardOptions::default(),
                CycleSpec::Predefined(PredefinedCycle::Daily),
            ),
        );
        let a = periodic.get_leaderboard("y2024-m12-d25").await;
        let b = periodic.get_leaderboard("y2024-m12-d25").await;
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), "season:y2024-m12-d25");
    }

    #[tokio::test]
    async fn distinct_cycle_keys_get_distinct_leaderboards() {
        let periodic = PeriodicLeaderboard::<i64>::new(
            fake_pool(),
            "season",
            PeriodicOptions::new(
                LeaderboardOptions::default(),
                CycleSpec::Predefined(PredefinedCycle::Daily),
            ),
        );
        let a = periodic.get_leaderboard("y2024-m12-d25").await;
        let b = periodic.get_leaderboard("y2024-m12-d26").await;
        assert_ne!(a.key(), b.key());
    }
}
