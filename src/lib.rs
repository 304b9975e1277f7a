//! A leaderboard engine layered on top of a Redis-compatible sorted-set store.
//!
//! This crate exposes two abstractions: [`Leaderboard`], a single ranked set of identified
//! participants scored by a numeric value, and [`PeriodicLeaderboard`], a family of leaderboards
//! keyed by a time-cycle identifier (minute, hour, day, week, month, year, or a user-supplied
//! scheme).
//!
//! All mutable state lives in the backing Redis server; an instance of either type owns nothing
//! beyond its own configuration and a handle to the connection pool.

#![warn(missing_docs)]

pub mod cycle;
pub mod entry;
pub mod env;
pub mod error;
pub mod leaderboard;
pub mod options;
pub mod periodic;
pub mod pipeline;
pub mod pool;
pub mod redis_key;
pub mod score;
pub mod script_host;
pub mod session;

pub use cycle::{CycleSpec, PredefinedCycle};
pub use entry::{Entry, EntryId, EntryUpdate};
pub use error::{LeaderboardError, LeaderboardResult};
pub use leaderboard::{Leaderboard, competition_rank};
pub use options::{LeaderboardOptions, SortPolicy, UpdatePolicy};
pub use periodic::{PeriodicLeaderboard, PeriodicOptions};
pub use score::Score;
pub use script_host::ScriptHost;

/// The Redis connection pool type used throughout this crate.
pub type RedisPool = deadpool_redis::Pool;
/// A single borrowed Redis connection, checked out of a [`RedisPool`].
pub type RedisConnection = deadpool_redis::Connection;
