use serde::{Deserialize, Serialize};

/// Sort order for song listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Entry,
    Title,
    AuthorMusic,
    AuthorLyric,
}

impl SortKey {
    pub const ALL: [Self; 4] = [Self::Entry, Self::Title, Self::AuthorMusic, Self::AuthorLyric];

    /// The name used by callers and the status file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Title => "title",
            Self::AuthorMusic => "authorMusic",
            Self::AuthorLyric => "authorLyric",
        }
    }

    /// Exact lookup, no trimming.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }

    /// Lenient lookup: surrounding whitespace is ignored and anything
    /// unrecognized (including the empty string) falls back to `Entry`.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw.trim()).unwrap_or_default()
    }

    /// Whether `raw` names a sort key exactly as stored.
    #[must_use]
    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_some()
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_keys() {
        assert_eq!(SortKey::normalize("entry"), SortKey::Entry);
        assert_eq!(SortKey::normalize("title"), SortKey::Title);
        assert_eq!(SortKey::normalize("authorMusic"), SortKey::AuthorMusic);
        assert_eq!(SortKey::normalize("authorLyric"), SortKey::AuthorLyric);
        assert_eq!(SortKey::normalize("  title  "), SortKey::Title);
    }

    #[test]
    fn test_normalize_falls_back_to_entry() {
        assert_eq!(SortKey::normalize(""), SortKey::Entry);
        assert_eq!(SortKey::normalize("drop table songs"), SortKey::Entry);
        assert_eq!(SortKey::normalize("Title"), SortKey::Entry);
    }

    #[test]
    fn test_is_valid() {
        assert!(SortKey::is_valid("authorLyric"));
        assert!(!SortKey::is_valid(""));
        assert!(!SortKey::is_valid(" entry"));
        assert!(!SortKey::is_valid("nonsense"));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SortKey::AuthorMusic).unwrap();
        assert_eq!(json, "\"authorMusic\"");
        let key: SortKey = serde_json::from_str("\"authorLyric\"").unwrap();
        assert_eq!(key, SortKey::AuthorLyric);
    }
}
