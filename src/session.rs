//! A thin borrow of one connection from the pool, scoping a single unit of work.

use crate::{RedisConnection, RedisPool, error::LeaderboardResult};

/// A connection checked out of a [`RedisPool`] for the duration of one operation.
///
/// This exists so that `Leaderboard` methods have a single place to go through when they need a
/// connection, rather than calling `pool.get()` at every call site.
pub struct StoreSession {
    conn: RedisConnection,
}

impl StoreSession {
    /// Borrows a connection from `pool`.
    pub async fn acquire(pool: &RedisPool) -> LeaderboardResult<Self> {
        Ok(Self {
            conn: pool.get().await?,
        })
    }

    /// Returns the underlying connection, for issuing a command directly.
    pub fn conn(&mut self) -> &mut RedisConnection {
        &mut self.conn
    }

    /// Consumes the session, yielding the underlying connection.
    pub fn into_conn(self) -> RedisConnection {
        self.conn
    }
}
