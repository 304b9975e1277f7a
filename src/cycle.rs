//! Time-cycle specification and key derivation for [`PeriodicLeaderboard`](crate::PeriodicLeaderboard).

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{LeaderboardError, LeaderboardResult};

/// One of the predefined cycle tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredefinedCycle {
    /// Resets every minute.
    Minute,
    /// Resets every hour.
    Hourly,
    /// Resets every day.
    Daily,
    /// Resets every ISO-8601 week.
    Weekly,
    /// Resets every month.
    Monthly,
    /// Resets every year.
    Yearly,
}

/// How a [`PeriodicLeaderboard`](crate::PeriodicLeaderboard) derives a cycle key from a civil
/// datetime.
#[derive(Clone)]
pub enum CycleSpec {
    /// One of the predefined tags.
    Predefined(PredefinedCycle),
    /// A user-supplied function mapping a civil datetime to a cycle key.
    Custom(Arc<dyn Fn(NaiveDateTime) -> String + Send + Sync>),
}

impl std::fmt::Debug for CycleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleSpec::Predefined(p) => f.debug_tuple("Predefined").field(p).finish(),
            CycleSpec::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl CycleSpec {
    /// Resolves the cycle key for `time`.
    ///
    /// Fails with [`LeaderboardError::InvalidCycle`] only in principle — every variant of this
    /// enum is constructible only through a valid predefined tag or a caller-supplied function,
    /// so in practice this always succeeds. The fallible signature matches the specification's
    /// "any other value" case, which in a typed embedding can only arise from a custom function
    /// instantiated before it's ready; kept for forward compatibility with such a failure mode.
    pub fn key_for(&self, time: NaiveDateTime) -> LeaderboardResult<String> {
        Ok(match self {
            CycleSpec::Predefined(p) => p.key_for(time),
            CycleSpec::Custom(f) => f(time),
        })
    }
}

impl PredefinedCycle {
    fn key_for(self, time: NaiveDateTime) -> String {
        let year = time.year();
        let month = time.month();
        let day = time.day();
        let hour = time.hour();
        let minute = time.minute();

        match self {
            PredefinedCycle::Yearly => format!("y{year:04}"),
            PredefinedCycle::Monthly => format!("y{year:04}-m{month:02}"),
            PredefinedCycle::Weekly => format!("w{:04}", time.iso_week().week()),
            PredefinedCycle::Daily => format!("y{year:04}-m{month:02}-d{day:02}"),
            PredefinedCycle::Hourly => format!("y{year:04}-m{month:02}-d{day:02}-h{hour:02}"),
            PredefinedCycle::Minute => {
                format!("y{year:04}-m{month:02}-d{day:02}-h{hour:02}-m{minute:02}")
            }
        }
    }
}

/// Fails with [`LeaderboardError::InvalidCycle`] when given a string that matches neither a
/// predefined tag nor can be parsed as one; this is a convenience entry point for configuration
/// formats (e.g. a config file naming the cycle as `"DAILY"`) that don't have a typed
/// `PredefinedCycle` value to hand.
pub fn parse_predefined(tag: &str) -> LeaderboardResult<PredefinedCycle> {
    Ok(match tag.to_ascii_uppercase().as_str() {
        "MINUTE" => PredefinedCycle::Minute,
        "HOURLY" => PredefinedCycle::Hourly,
        "DAILY" => PredefinedCycle::Daily,
        "WEEKLY" => PredefinedCycle::Weekly,
        "MONTHLY" => PredefinedCycle::Monthly,
        "YEARLY" => PredefinedCycle::Yearly,
        _ => return Err(LeaderboardError::InvalidCycle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 45)
            .unwrap()
    }

    #[test]
    fn minute_cycle_key_matches_scenario_s5() {
        let spec = CycleSpec::Predefined(PredefinedCycle::Minute);
        let key = spec.key_for(dt(2024, 12, 25, 14, 30)).unwrap();
        assert_eq!(key, "y2024-m12-d25-h14-m30");
    }

    #[test]
    fn yearly_cycle_ignores_month_and_day() {
        let spec = CycleSpec::Predefined(PredefinedCycle::Yearly);
        assert_eq!(
            spec.key_for(dt(2024, 1, 1, 0, 0)).unwrap(),
            spec.key_for(dt(2024, 12, 31, 23, 59)).unwrap()
        );
    }

    #[test]
    fn weekly_cycle_is_zero_padded_iso_week() {
        let spec = CycleSpec::Predefined(PredefinedCycle::Weekly);
        let key = spec.key_for(dt(2024, 1, 2, 0, 0)).unwrap();
        assert!(key.starts_with('w'));
        assert_eq!(key.len(), 5);
    }

    #[test]
    fn custom_cycle_is_used_verbatim() {
        let spec = CycleSpec::Custom(Arc::new(|_| "fixed".to_string()));
        assert_eq!(spec.key_for(dt(2024, 1, 1, 0, 0)).unwrap(), "fixed");
    }

    #[test]
    fn parses_predefined_tag_case_insensitively() {
        assert_eq!(parse_predefined("daily").unwrap(), PredefinedCycle::Daily);
        assert!(parse_predefined("fortnightly").is_err());
    }
}
