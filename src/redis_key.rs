//! The single key-layout rule this crate needs: how a [`PeriodicLeaderboard`](crate::PeriodicLeaderboard)
//! derives the qualified key of one of its member leaderboards.
//!
//! A standalone [`Leaderboard`](crate::Leaderboard) uses whatever key string its caller passes to
//! [`Leaderboard::new`](crate::Leaderboard::new) directly; there is no derivation to document for
//! it.

/// Builds the qualified key `{base_key}:{cycle_key}` used by a periodic leaderboard's member.
pub fn periodic_key(base_key: &str, cycle_key: &str) -> String {
    format!("{base_key}:{cycle_key}")
}

/// Strips the `{base_key}:` prefix from a qualified key discovered by a keyspace scan.
///
/// Returns `None` if `qualified` does not start with that exact prefix — the caller is expected
/// to have scanned with the matching `{base_key}:*` pattern, so this should not normally happen,
/// but a `SCAN` pattern match is not a guarantee against a pathological key collision.
pub fn strip_periodic_prefix<'a>(base_key: &str, qualified: &'a str) -> Option<&'a str> {
    qualified
        .strip_prefix(base_key)
        .and_then(|rest| rest.strip_prefix(':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_qualified_key() {
        assert_eq!(periodic_key("season", "y2024-m12"), "season:y2024-m12");
    }

    #[test]
    fn strips_known_prefix() {
        assert_eq!(
            strip_periodic_prefix("season", "season:y2024-m12"),
            Some("y2024-m12")
        );
    }

    #[test]
    fn rejects_unrelated_key() {
        assert_eq!(strip_periodic_prefix("season", "other:y2024-m12"), None);
    }
}
