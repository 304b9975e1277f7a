//! A module containing the [`LeaderboardError`] enum, the single error type surfaced by this crate.

use deadpool_redis::PoolError;

/// Represents any type of error that could happen when using this crate.
///
/// Absent members and absent cycle keys are never represented by a variant here: every read
/// operation that may legitimately find nothing returns `Option::None` instead.
#[derive(thiserror::Error, Debug)]
pub enum LeaderboardError {
    /// A transport-layer failure from the connection pool.
    ///
    /// This is the only variant [`Leaderboard::update`](crate::Leaderboard::update) retries.
    #[error(transparent)]
    PoolError(#[from] PoolError),
    /// A transport-layer or command-level failure reported by the Redis connection itself.
    ///
    /// Treated the same as [`Self::PoolError`] for retry purposes when the underlying
    /// [`redis::RedisError`](deadpool_redis::redis::RedisError) is connection-class
    /// (see [`LeaderboardError::is_connection_failure`]).
    #[error(transparent)]
    Redis(#[from] deadpool_redis::redis::RedisError),
    /// A server-side script returned a reply shape other than the one its caller expected.
    #[error("script `{script}` returned an unexpected reply shape: {detail}")]
    ProtocolError {
        /// The name of the script whose reply could not be parsed.
        script: &'static str,
        /// A short description of what was expected instead.
        detail: String,
    },
    /// The declared score type is neither `i32`, `i64` nor `f64`.
    ///
    /// Unreachable through this crate's public API, since the declared type is pinned at compile
    /// time by the sealed [`Score`](crate::score::Score) trait; retained for taxonomy
    /// completeness (see DESIGN.md).
    #[error("unsupported declared score type")]
    UnsupportedType,
    /// A decoded `i32` score fell outside the representable range.
    #[error("decoded score {0} does not fit in i32")]
    Overflow(f64),
    /// The configured cycle is neither a known predefined tag nor a custom function.
    #[error("invalid periodic leaderboard cycle")]
    InvalidCycle,
}

impl LeaderboardError {
    /// Returns whether this error is a connection-class failure eligible for the retry policy
    /// documented on [`Leaderboard::update`](crate::Leaderboard::update).
    pub fn is_connection_failure(&self) -> bool {
        match self {
            LeaderboardError::PoolError(_) => true,
            LeaderboardError::Redis(e) => e.is_connection_dropped() || e.is_io_error(),
            _ => false,
        }
    }
}

/// Shortcut for creating a [`LeaderboardError::ProtocolError`] with a formatted detail message.
#[macro_export]
macro_rules! protocol_error {
    ($script:expr, $($t:tt)*) => {{
        $crate::error::LeaderboardError::ProtocolError {
            script: $script,
            detail: $crate::error::__private::format!($($t)*),
        }
    }};
}

#[doc(hidden)]
pub mod __private {
    pub use std::format;
}

/// Represents the result of a computation that could return a [`LeaderboardError`].
pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
