use serde::{Deserialize, Serialize};

/// What an author contributed to a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    Words,
    Music,
}

impl AuthorRole {
    /// The value stored in `authors.author_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Music => "music",
        }
    }

    /// Map a source `type` attribute onto a role. Only `music` is music;
    /// `words`, `translation` and untyped authors all credit the text.
    #[must_use]
    pub fn from_attr(attr: Option<&str>) -> Self {
        match attr.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("music") => Self::Music,
            _ => Self::Words,
        }
    }
}

impl std::fmt::Display for AuthorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An author credit attached to a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub role: AuthorRole,
    pub value: String,
}

impl Author {
    #[must_use]
    pub fn new(role: AuthorRole, value: impl Into<String>) -> Self {
        Self {
            role,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_attr() {
        assert_eq!(AuthorRole::from_attr(Some("music")), AuthorRole::Music);
        assert_eq!(AuthorRole::from_attr(Some(" Music ")), AuthorRole::Music);
        assert_eq!(AuthorRole::from_attr(Some("words")), AuthorRole::Words);
        assert_eq!(AuthorRole::from_attr(Some("translation")), AuthorRole::Words);
        assert_eq!(AuthorRole::from_attr(None), AuthorRole::Words);
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(AuthorRole::Words.as_str(), "words");
        assert_eq!(AuthorRole::Music.to_string(), "music");
    }
}
