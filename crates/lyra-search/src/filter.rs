//! Turning user search text into a SQL filter.

use lyra_core::remove_diacritics;

/// Minimum length, in characters, of a text search.
pub const MIN_TEXT_SEARCH: usize = 3;

/// How a search string restricts the song list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Every song.
    All,

    /// Songs whose entry number, as text, equals the digits.
    Entry(String),

    /// Songs whose normalized title, any author or any verse contains the
    /// pattern, or whose entry number equals the raw text.
    Text { pattern: String, raw: String },
}

impl SearchFilter {
    /// Classify search text.
    ///
    /// Blank text and non-numeric text shorter than [`MIN_TEXT_SEARCH`]
    /// characters do not filter at all.
    #[must_use]
    pub fn parse(search: &str) -> Self {
        let text = search.trim();
        if text.is_empty() {
            return Self::All;
        }
        if text.chars().all(|c| c.is_ascii_digit()) {
            return Self::Entry(text.to_string());
        }
        if text.chars().count() < MIN_TEXT_SEARCH {
            return Self::All;
        }
        Self::Text {
            pattern: format!("%{}%", escape_like(&remove_diacritics(text))),
            raw: text.to_string(),
        }
    }

    /// The `WHERE` clause for a query over `songs s`, or an empty string.
    #[must_use]
    pub fn where_clause(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::Entry(_) => "WHERE CAST(s.entry AS TEXT) = ?1",
            Self::Text { .. } => {
                "WHERE s.title_d LIKE ?1 ESCAPE '\\'
                    OR EXISTS (SELECT 1 FROM authors a
                                WHERE a.song_id = s.id AND a.author_value_d LIKE ?1 ESCAPE '\\')
                    OR EXISTS (SELECT 1 FROM verses vf
                                WHERE vf.song_id = s.id AND vf.lines_d LIKE ?1 ESCAPE '\\')
                    OR CAST(s.entry AS TEXT) = ?2"
            }
        }
    }

    /// Positional parameters matching [`SearchFilter::where_clause`].
    #[must_use]
    pub fn params(&self) -> Vec<String> {
        match self {
            Self::All => Vec::new(),
            Self::Entry(digits) => vec![digits.clone()],
            Self::Text { pattern, raw } => vec![pattern.clone(), raw.clone()],
        }
    }
}

/// Escape `LIKE` wildcards so user text matches literally.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
