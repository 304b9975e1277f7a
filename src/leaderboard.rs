//! The [`Leaderboard`] type and its operations.

use std::marker::PhantomData;
use std::time::Duration;

use deadpool_redis::redis::{self, AsyncCommands as _};

use crate::{
    RedisPool,
    entry::{Entry, EntryId, EntryUpdate},
    error::{LeaderboardError, LeaderboardResult},
    options::{LeaderboardOptions, UpdatePolicy},
    pipeline::PipelineBatch,
    score::Score,
    script_host::ScriptHost,
    session::StoreSession,
};

const RETRY_BACKOFFS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// A single ranked set of identified participants, scored by a value of type `T`.
///
/// A `Leaderboard` owns no local mutable state: every read and write goes through the backing
/// key in the connection pool's store. Cloning a `Leaderboard` is cheap since `RedisPool` is
/// itself a cheap-to-clone handle.
#[derive(Clone)]
pub struct Leaderboard<T: Score> {
    pool: RedisPool,
    scripts: std::sync::Arc<ScriptHost>,
    key: String,
    options: LeaderboardOptions,
    _score: PhantomData<T>,
}

impl<T: Score> Leaderboard<T> {
    /// Builds a leaderboard backed by `key`, using a fresh [`ScriptHost`].
    pub fn new(pool: RedisPool, key: impl Into<String>, options: LeaderboardOptions) -> Self {
        Self::with_script_host(pool, key, options, std::sync::Arc::new(ScriptHost::new()))
    }

    /// Builds a leaderboard sharing `scripts` with other leaderboards on the same pool, so a
    /// single `SCRIPT LOAD` round trip per script serves all of them.
    pub fn with_script_host(
        pool: RedisPool,
        key: impl Into<String>,
        options: LeaderboardOptions,
        scripts: std::sync::Arc<ScriptHost>,
    ) -> Self {
        Self {
            pool,
            scripts,
            key: key.into(),
            options,
            _score: PhantomData,
        }
    }

    /// The qualified key this leaderboard is backed by.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The options this leaderboard was constructed with.
    pub fn options(&self) -> LeaderboardOptions {
        self.options
    }

    /// Returns `id`'s 1-based rank under the current sort policy, or `None` if absent.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn rank(&self, id: &EntryId) -> LeaderboardResult<Option<i64>> {
        let mut session = StoreSession::acquire(&self.pool).await?;
        let rank: Option<i64> = self.raw_rank(session.conn(), id.as_str()).await?;
        Ok(rank.map(|r| r + 1))
    }

    async fn raw_rank(
        &self,
        conn: &mut deadpool_redis::Connection,
        id: &str,
    ) -> LeaderboardResult<Option<i64>> {
        Ok(match self.options.sort_policy {
            crate::options::SortPolicy::HighToLow => conn.zrevrank(&self.key, id).await?,
            crate::options::SortPolicy::LowToHigh => conn.zrank(&self.key, id).await?,
        })
    }

    /// Returns `id`'s score and 1-based rank, or `None` if absent.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn find(&self, id: &EntryId) -> LeaderboardResult<Option<Entry<T>>> {
        let mut session = StoreSession::acquire(&self.pool).await?;
        let score: Option<f64> = session.conn().zscore(&self.key, id.as_str()).await?;
        let Some(score) = score else {
            return Ok(None);
        };
        let rank = self
            .raw_rank(session.conn(), id.as_str())
            .await?
            .unwrap_or(0);
        Ok(Some(Entry {
            id: id.clone(),
            score: T::from_store(score)?,
            rank: rank + 1,
        }))
    }

    /// Returns the entry at 1-based `rank`, or `None` if out of range.
    pub async fn at(&self, rank: i64) -> LeaderboardResult<Option<Entry<T>>> {
        if rank <= 0 {
            return Ok(None);
        }
        Ok(self.list(rank, rank).await?.into_iter().next())
    }

    /// Equivalent to `update([{id, value}], policy).first`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn update_one(
        &self,
        id: impl Into<String>,
        value: T,
        policy: Option<UpdatePolicy>,
    ) -> LeaderboardResult<T> {
        let results = self
            .update(vec![EntryUpdate::new(id, value)], policy)
            .await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| LeaderboardError::ProtocolError {
                script: "update",
                detail: "empty result for single-entry update".to_string(),
            })
    }

    /// Applies every update in `entries` atomically (as one pipeline flush), retrying up to 3
    /// times with 1s/2s/4s backoff on connection-class failures.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, entries)))]
    pub async fn update(
        &self,
        entries: Vec<EntryUpdate<T>>,
        policy: Option<UpdatePolicy>,
    ) -> LeaderboardResult<Vec<T>> {
        let effective_policy = policy.unwrap_or(self.options.update_policy);

        let mut last_err = None;
        for (attempt, backoff) in std::iter::once(None)
            .chain(RETRY_BACKOFFS.into_iter().map(Some))
            .enumerate()
        {
            if let Some(backoff) = backoff {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempt, ?backoff, "retrying leaderboard update");
                tokio::time::sleep(backoff).await;
            }

            match self.update_once(&entries, effective_policy).await {
                Ok(values) => return Ok(values),
                Err(e) if e.is_connection_failure() && attempt < RETRY_BACKOFFS.len() => {
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.expect("loop always runs at least once"))
    }

    async fn update_once(
        &self,
        entries: &[EntryUpdate<T>],
        policy: UpdatePolicy,
    ) -> LeaderboardResult<Vec<T>> {
        let mut session = StoreSession::acquire(&self.pool).await?;

        let prior_card: i64 = if self.options.is_capped() {
            session.conn().zcard(&self.key).await?
        } else {
            0
        };

        let best_digest = if matches!(policy, UpdatePolicy::Best) {
            Some(self.scripts.digest_best(&self.pool).await?)
        } else {
            None
        };

        let over_cap = self.options.is_capped()
            && prior_card + entries.len() as i64 > self.options.limit_top_n as i64;
        let trim_count = if over_cap {
            prior_card + entries.len() as i64 - self.options.limit_top_n as i64
        } else {
            0
        };

        let raw: Vec<redis::Value> = {
            let mut batch = PipelineBatch::new(&mut session);
            for entry in entries {
                match policy {
                    UpdatePolicy::Replace => {
                        batch
                            .pipe()
                            .zadd(&self.key, entry.id.as_str(), entry.value.to_store());
                    }
                    UpdatePolicy::Aggregate => {
                        batch
                            .pipe()
                            .zincr(&self.key, entry.id.as_str(), entry.value.to_store());
                    }
                    UpdatePolicy::Best => {
                        let digest = best_digest.as_deref().expect("loaded above");
                        batch.pipe().cmd("EVALSHA").arg(digest).arg(1).arg(&self.key).arg(
                            entry.value.to_store(),
                        ).arg(entry.id.as_str()).arg(self.options.sort_policy.script_direction());
                    }
                }
            }
            if trim_count > 0 {
                // Direction-aware: HIGH_TO_LOW's worst members sit at the lowest native ranks,
                // LOW_TO_HIGH's worst sit at the highest; §4.6's `keeptop` script trims only the
                // former and is exposed separately as `Leaderboard::keep_top` for that case.
                let (lo, hi) = match self.options.sort_policy {
                    crate::options::SortPolicy::HighToLow => (0i64, trim_count - 1),
                    crate::options::SortPolicy::LowToHigh => {
                        (self.options.limit_top_n as i64, -1i64)
                    }
                };
                batch.pipe().zremrangebyrank(&self.key, lo as isize, hi as isize);
            }
            batch.query().await?
        };

        // ZADD's reply is the count of newly-added members, not the stored score, so REPLACE
        // results come straight from the caller's own input; ZINCRBY and the `best` script both
        // reply with the resulting stored score and go through the pipeline reply instead.
        let mut out = Vec::with_capacity(entries.len());
        for (entry, raw_value) in entries.iter().zip(raw.into_iter().take(entries.len())) {
            let value = match policy {
                UpdatePolicy::Replace => entry.value,
                UpdatePolicy::Aggregate | UpdatePolicy::Best => {
                    decode_numeric_reply::<T>(&raw_value, "update")?
                }
            };
            out.push(value);
        }
        Ok(out)
    }

    /// Removes every id in `ids`. Removing an absent id is a no-op.
    pub async fn remove(&self, ids: &[EntryId]) -> LeaderboardResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut session = StoreSession::acquire(&self.pool).await?;
        let members: Vec<&str> = ids.iter().map(EntryId::as_str).collect();
        let _: i64 = session.conn().zrem(&self.key, members).await?;
        Ok(())
    }

    /// Deletes this leaderboard's key entirely.
    pub async fn clear(&self) -> LeaderboardResult<()> {
        let mut session = StoreSession::acquire(&self.pool).await?;
        let _: i64 = session.conn().del(&self.key).await?;
        Ok(())
    }

    /// Returns the inclusive, 1-based range `[lower, upper]`, ranked sequentially from `lower`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn list(&self, lower: i64, upper: i64) -> LeaderboardResult<Vec<Entry<T>>> {
        let lower = lower.max(1);
        let upper = upper.max(1);
        if upper < lower {
            return Ok(Vec::new());
        }
        let mut session = StoreSession::acquire(&self.pool).await?;
        let lo = (lower - 1).max(0);
        let hi = upper - 1;
        let raw: Vec<(String, f64)> = match self.options.sort_policy {
            crate::options::SortPolicy::HighToLow => {
                session
                    .conn()
                    .zrevrange_withscores(&self.key, lo as isize, hi as isize)
                    .await?
            }
            crate::options::SortPolicy::LowToHigh => {
                session
                    .conn()
                    .zrange_withscores(&self.key, lo as isize, hi as isize)
                    .await?
            }
        };

        let mut out = Vec::with_capacity(raw.len());
        for (i, (id, score)) in raw.into_iter().enumerate() {
            out.push(Entry {
                id: EntryId::new(id),
                score: T::from_store(score)?,
                rank: lower + i as i64,
            });
        }
        Ok(out)
    }

    /// Returns every entry with a score in `[min, max]`, via the `rangescore` script.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn list_by_score(&self, min: f64, max: f64) -> LeaderboardResult<Vec<Entry<T>>> {
        let digest = self.scripts.digest_rangescore(&self.pool).await?;
        let mut session = StoreSession::acquire(&self.pool).await?;
        let reply: (i64, Vec<redis::Value>) = redis::cmd("EVALSHA")
            .arg(&digest)
            .arg(1)
            .arg(&self.key)
            .arg(min)
            .arg(max)
            .arg(self.options.sort_policy.script_name())
            .query_async(session.conn())
            .await?;
        decode_flat_script_reply::<T>(reply, "rangescore")
    }

    /// Equivalent to `list(1, n)`.
    pub async fn top(&self, n: i64) -> LeaderboardResult<Vec<Entry<T>>> {
        self.list(1, n).await
    }

    /// Returns the worst `n` ranked members, worst-ranked first.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn bottom(&self, n: i64) -> LeaderboardResult<Vec<Entry<T>>> {
        if n <= 0 {
            return Ok(Vec::new());
        }
        let card = self.count().await?;
        if card == 0 {
            return Ok(Vec::new());
        }
        let start_rank = card - n.min(card) + 1;
        let mut entries = self.list(start_rank, card).await?;
        entries.reverse();
        Ok(entries)
    }

    /// Returns the neighborhood of `id`: `distance` members on each side, via the `around` script.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn around(
        &self,
        id: &EntryId,
        distance: i64,
        fill_borders: bool,
    ) -> LeaderboardResult<Vec<Entry<T>>> {
        let digest = self.scripts.digest_around(&self.pool).await?;
        let mut session = StoreSession::acquire(&self.pool).await?;
        let reply: (i64, Vec<redis::Value>) = redis::cmd("EVALSHA")
            .arg(&digest)
            .arg(1)
            .arg(&self.key)
            .arg(id.as_str())
            .arg(distance)
            .arg(if fill_borders { "true" } else { "false" })
            .arg(self.options.sort_policy.script_name())
            .query_async(session.conn())
            .await?;
        decode_flat_script_reply::<T>(reply, "around")
    }

    /// Produces a lazy, finite stream of rank-ordered batches of size at most `batch_size`,
    /// starting at rank 1 and terminating on the first short (or empty) batch.
    pub fn export_stream(
        &self,
        batch_size: i64,
    ) -> impl futures::Stream<Item = LeaderboardResult<Vec<Entry<T>>>> + '_ {
        futures::stream::unfold((1i64, false), move |(cursor, done)| async move {
            if done {
                return None;
            }
            let page = self.list(cursor, cursor + batch_size - 1).await;
            match page {
                Ok(entries) => {
                    let short = entries.len() < batch_size as usize;
                    if entries.is_empty() {
                        None
                    } else {
                        let next_cursor = cursor + entries.len() as i64;
                        Some((Ok(entries), (next_cursor, short)))
                    }
                }
                Err(e) => Some((Err(e), (cursor, true))),
            }
        })
    }

    /// The number of members currently held under this leaderboard's key.
    pub async fn count(&self) -> LeaderboardResult<i64> {
        let mut session = StoreSession::acquire(&self.pool).await?;
        Ok(session.conn().zcard(&self.key).await?)
    }

    /// Trims this leaderboard down to its `n` lowest native-ascending-ranked members via the
    /// `keeptop` script, a no-op if the cardinality is already at or below `n`.
    ///
    /// Unlike `update`'s own cap enforcement, this is not sort-policy-aware: it always removes
    /// the lowest native ranks, which matches "keep the best" only under `SortPolicy::HighToLow`.
    /// Exposed as a standalone maintenance operation for callers who want to enforce a cap
    /// outside of a write, e.g. after a bulk import done through some other path.
    pub async fn keep_top(&self, n: i64) -> LeaderboardResult<()> {
        let digest = self.scripts.digest_keeptop(&self.pool).await?;
        let mut session = StoreSession::acquire(&self.pool).await?;
        let _: redis::Value = redis::cmd("EVALSHA")
            .arg(&digest)
            .arg(1)
            .arg(&self.key)
            .arg(n)
            .query_async(session.conn())
            .await?;
        Ok(())
    }
}

fn decode_numeric_reply<T: Score>(value: &redis::Value, script: &'static str) -> LeaderboardResult<T> {
    let as_str = match value {
        redis::Value::BulkString(bytes) => std::str::from_utf8(bytes).ok(),
        redis::Value::Int(n) => return T::from_store(*n as f64),
        redis::Value::Double(d) => return T::from_store(*d),
        _ => None,
    };
    let parsed: f64 = as_str
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| LeaderboardError::ProtocolError {
            script,
            detail: format!("expected a numeric reply, got {value:?}"),
        })?;
    T::from_store(parsed)
}

fn decode_flat_script_reply<T: Score>(
    reply: (i64, Vec<redis::Value>),
    script: &'static str,
) -> LeaderboardResult<Vec<Entry<T>>> {
    let (base_rank, flat) = reply;
    if base_rank < 0 {
        return Ok(Vec::new());
    }
    if flat.len() % 2 != 0 {
        return Err(LeaderboardError::ProtocolError {
            script,
            detail: format!("expected an even-length flat array, got {} items", flat.len()),
        });
    }

    let mut out = Vec::with_capacity(flat.len() / 2);
    for (i, pair) in flat.chunks_exact(2).enumerate() {
        let id = match &pair[0] {
            redis::Value::BulkString(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            other => {
                return Err(LeaderboardError::ProtocolError {
                    script,
                    detail: format!("expected a member id, got {other:?}"),
                });
            }
        };
        let score = decode_numeric_reply::<T>(&pair[1], script)?;
        out.push(Entry {
            id: EntryId::new(id),
            score,
            rank: base_rank + i as i64 + 1,
        });
    }
    Ok(out)
}

/// Re-derives standard competition ranking (1224) over an already score-sorted slice of entries.
///
/// Equal scores share a rank; the next distinct score jumps by the number of tied predecessors.
/// This does not change the store-assigned, lexicographically-tie-broken `rank` field on each
/// entry — it is an opt-in read-side view for callers who want ties collapsed, generalizing the
/// "rank by key equality" iterator adapter this crate's own ecosystem already uses, from "by key"
/// to "by entry score".
pub fn competition_rank<T: Score>(entries: &[Entry<T>]) -> Vec<(i64, &Entry<T>)> {
    let mut out = Vec::with_capacity(entries.len());
    let mut rank = 0i64;
    let mut offset = 1i64;
    let mut previous_score: Option<T> = None;

    for entry in entries {
        match previous_score {
            None => rank += 1,
            Some(prev) if prev == entry.score => offset += 1,
            Some(_) => {
                rank += offset;
                offset = 1;
            }
        }
        previous_score = Some(entry.score);
        out.push((rank, entry));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SortPolicy;

    fn entry(id: &str, score: i64, rank: i64) -> Entry<i64> {
        Entry {
            id: EntryId::new(id),
            score,
            rank,
        }
    }

    #[test]
    fn competition_rank_collapses_ties() {
        let entries = vec![
            entry("a", 30, 1),
            entry("b", 31, 2),
            entry("c", 31, 3),
            entry("d", 33, 4),
            entry("e", 34, 5),
            entry("f", 34, 6),
            entry("g", 34, 7),
            entry("h", 35, 8),
            entry("i", 36, 9),
        ];
        let ranked = competition_rank(&entries);
        let ranks: Vec<i64> = ranked.iter().map(|(r, _)| *r).collect();
        assert_eq!(ranks, vec![1, 2, 2, 4, 5, 5, 5, 8, 9]);
    }

    #[test]
    fn sort_policy_script_tokens() {
        assert_eq!(SortPolicy::HighToLow.script_direction(), "desc");
        assert_eq!(SortPolicy::LowToHigh.script_direction(), "asc");
        assert_eq!(SortPolicy::HighToLow.script_name(), "high_to_low");
        assert_eq!(SortPolicy::LowToHigh.script_name(), "low_to_high");
    }
}
