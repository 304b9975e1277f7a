//! The [`Score`] trait: this crate's compile-time closed set of declared leaderboard value types.
//!
//! The distilled specification this crate implements describes the declared numeric type as a
//! small runtime enum (`{INT32, INT64, FLOAT64}`) matched on during decode, to avoid reflective
//! type-name switching. Rust already has no reflective type switch to begin with; the idiomatic
//! translation of "closed set of three numeric kinds, decoded by a pure function of the kind" is
//! a sealed trait with exactly three implementations, decoded by a method on the implementation
//! rather than a `match` over a tag. See DESIGN.md for the full rationale.

use crate::error::{LeaderboardError, LeaderboardResult};

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
}

/// A numeric type a [`Leaderboard`](crate::Leaderboard) may be declared over.
///
/// Implemented only for `i32`, `i64` and `f64` — the three kinds the specification names. The
/// trait is sealed so no other type can ever implement it.
pub trait Score: sealed::Sealed + Copy + Send + Sync + PartialOrd + 'static {
    /// Widens this value to the `f64` the store represents scores as.
    fn to_store(self) -> f64;

    /// Narrows a store-native `f64` back to `Self`, applying the rounding and range rules
    /// documented on [`Leaderboard::list`](crate::Leaderboard::list) et al.
    fn from_store(value: f64) -> LeaderboardResult<Self>;
}

impl Score for f64 {
    fn to_store(self) -> f64 {
        self
    }

    fn from_store(value: f64) -> LeaderboardResult<Self> {
        Ok(value)
    }
}

impl Score for i64 {
    fn to_store(self) -> f64 {
        self as f64
    }

    fn from_store(value: f64) -> LeaderboardResult<Self> {
        Ok(value.round_ties_even() as i64)
    }
}

impl Score for i32 {
    fn to_store(self) -> f64 {
        self as f64
    }

    fn from_store(value: f64) -> LeaderboardResult<Self> {
        let rounded = value.round_ties_even();
        if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
            return Err(LeaderboardError::Overflow(value));
        }
        Ok(rounded as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_passes_through() {
        assert_eq!(f64::from_store(150.25).unwrap(), 150.25);
    }

    #[test]
    fn i64_rounds_half_to_even() {
        assert_eq!(i64::from_store(2.5).unwrap(), 2);
        assert_eq!(i64::from_store(3.5).unwrap(), 4);
        assert_eq!(i64::from_store(-2.5).unwrap(), -2);
    }

    #[test]
    fn i32_rounds_half_to_even() {
        assert_eq!(i32::from_store(2.5).unwrap(), 2);
        assert_eq!(i32::from_store(3.5).unwrap(), 4);
    }

    #[test]
    fn i32_overflow_is_reported() {
        let past_max = i32::MAX as f64 + 10.0;
        assert!(matches!(
            i32::from_store(past_max),
            Err(LeaderboardError::Overflow(_))
        ));
    }

    #[test]
    fn encode_widens_to_f64() {
        assert_eq!(42i32.to_store(), 42.0);
        assert_eq!(42i64.to_store(), 42.0);
    }
}
