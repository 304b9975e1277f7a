//! [`ScriptHost`]: loads the four server-side scripts once and resolves their names to the
//! server-assigned content digest Redis expects `EVALSHA` to be called with.

use std::collections::HashMap;

use tokio::sync::OnceCell;

use crate::{RedisPool, error::LeaderboardResult};

const BEST: &str = "best";
const RANGESCORE: &str = "rangescore";
const AROUND: &str = "around";
const KEEPTOP: &str = "keeptop";

const SCRIPT_SOURCES: &[(&str, &str)] = &[
    (BEST, include_str!("scripts/best.lua")),
    (RANGESCORE, include_str!("scripts/rangescore.lua")),
    (AROUND, include_str!("scripts/around.lua")),
    (KEEPTOP, include_str!("scripts/keeptop.lua")),
];

/// Preloads the crate's four Lua scripts into Redis and remembers each one's digest.
///
/// [`ScriptHost::prepare`] is idempotent and safe to call concurrently from multiple tasks: only
/// the first caller actually performs the `SCRIPT LOAD` round trips, and every caller (including
/// that first one) observes the same completed digest table once it returns.
#[derive(Debug, Default)]
pub struct ScriptHost {
    digests: OnceCell<HashMap<&'static str, String>>,
}

impl ScriptHost {
    /// Builds an unprepared script host. No I/O happens until [`ScriptHost::prepare`] (or a
    /// lookup that triggers it) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every script into the store and records its digest, unless this has already
    /// happened.
    pub async fn prepare(&self, pool: &RedisPool) -> LeaderboardResult<()> {
        self.digests
            .get_or_try_init(|| async {
                let mut conn = pool.get().await?;
                let mut digests = HashMap::with_capacity(SCRIPT_SOURCES.len());
                for (name, source) in SCRIPT_SOURCES {
                    let sha: String = deadpool_redis::redis::cmd("SCRIPT")
                        .arg("LOAD")
                        .arg(*source)
                        .query_async(&mut conn)
                        .await?;
                    digests.insert(*name, sha);
                }
                Ok::<_, crate::error::LeaderboardError>(digests)
            })
            .await?;
        Ok(())
    }

    /// Resolves `name` to its digest, preparing the host first if needed.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not one of the four script names this crate ships; that would be a
    /// bug in this crate, not a condition a caller can trigger.
    pub async fn digest(&self, pool: &RedisPool, name: &str) -> LeaderboardResult<String> {
        self.prepare(pool).await?;
        let digests = self.digests.get().expect("prepare() just completed");
        Ok(digests
            .get(name)
            .unwrap_or_else(|| panic!("unknown script name `{name}`"))
            .clone())
    }

    pub(crate) async fn digest_best(&self, pool: &RedisPool) -> LeaderboardResult<String> {
        self.digest(pool, BEST).await
    }

    pub(crate) async fn digest_rangescore(&self, pool: &RedisPool) -> LeaderboardResult<String> {
        self.digest(pool, RANGESCORE).await
    }

    pub(crate) async fn digest_around(&self, pool: &RedisPool) -> LeaderboardResult<String> {
        self.digest(pool, AROUND).await
    }

    pub(crate) async fn digest_keeptop(&self, pool: &RedisPool) -> LeaderboardResult<String> {
        self.digest(pool, KEEPTOP).await
    }
}
