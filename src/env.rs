//! Environment declarations used by the binaries built on top of this crate.
//!
//! The core library itself never reads the environment directly — it is constructed purely from
//! caller-supplied arguments (a [`RedisPool`](crate::RedisPool), a key, [`LeaderboardOptions`]).
//! This module exists for the demo binary (see `demos/periodic_refresher.rs`) and for any
//! embedding application that wants the same `mkenv`-declared loading this codebase's other
//! services already use for their own Redis URL.

mkenv::make_env! {
/// The environment used to set up a connection with the Redis database.
pub RedisUrlEnv:
    /// The URL to the Redis database.
    redis_url: {
        id: RedisUrl(String),
        kind: normal,
        var: "REDIS_URL",
        desc: "The URL to the Redis database",
    },
}
