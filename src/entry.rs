//! The [`Entry`] and [`EntryUpdate`] data model.

/// A single row of a leaderboard: a participant, their score, and their 1-based rank.
///
/// Ranks are always 1-based here; the store's native rank is 0-based and is converted at every
/// boundary that crosses into this crate's public API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Entry<T> {
    /// The participant's identifier.
    pub id: EntryId,
    /// The participant's score, decoded to the leaderboard's declared type.
    pub score: T,
    /// The participant's 1-based rank under the leaderboard's sort policy.
    pub rank: i64,
}

/// A non-empty participant identifier.
///
/// This is a thin wrapper over `String` rather than a bare `String` so that the "non-empty"
/// invariant from the data model is enforced once, at construction, instead of being silently
/// assumed at every call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Wraps `id` as an [`EntryId`].
    ///
    /// # Panics
    ///
    /// Panics if `id` is empty; member identifiers are required to be non-empty by the data
    /// model.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.is_empty(), "leaderboard entry id must not be empty");
        Self(id)
    }

    /// Returns this identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<EntryId> for String {
    fn from(value: EntryId) -> Self {
        value.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A pair describing one proposed mutation passed to
/// [`Leaderboard::update`](crate::Leaderboard::update).
#[derive(Debug, Clone)]
pub struct EntryUpdate<T> {
    /// The participant's identifier.
    pub id: EntryId,
    /// The value to apply, interpreted according to the effective update policy.
    pub value: T,
}

impl<T> EntryUpdate<T> {
    /// Builds a new update for `id` with `value`.
    pub fn new(id: impl Into<String>, value: T) -> Self {
        Self {
            id: EntryId::new(id),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn rejects_empty_id() {
        EntryId::new("");
    }

    #[test]
    fn accepts_nonempty_id() {
        assert_eq!(EntryId::new("alice").as_str(), "alice");
    }
}
