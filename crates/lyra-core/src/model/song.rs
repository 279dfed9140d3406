use serde::{Deserialize, Serialize};

/// A song row as stored in the `songs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub songbook_acronym: String,
    pub title: String,

    /// Diacritics-free copy of `title`, written together with it.
    pub title_normalized: String,

    /// Verse names in performance order, space separated ("v1 c v2 c").
    pub verse_order: String,

    /// Numeric entry used for sorting and numeric search.
    pub entry_number: i64,

    /// The entry exactly as the source spelled it ("511A", "067b").
    pub entry_text: String,

    pub kytara_file: Option<String>,
    pub notes_file: Option<String>,
}

/// The insertable part of a song. Normalized columns are derived by the
/// store when the row is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub songbook_acronym: String,
    pub title: String,
    pub verse_order: String,
    pub entry_number: i64,
    pub entry_text: String,
    pub kytara_file: Option<String>,
    pub notes_file: Option<String>,
}

impl NewSong {
    #[must_use]
    pub fn new(
        songbook_acronym: impl Into<String>,
        title: impl Into<String>,
        entry_number: i64,
        entry_text: impl Into<String>,
    ) -> Self {
        Self {
            songbook_acronym: songbook_acronym.into(),
            title: title.into(),
            verse_order: String::new(),
            entry_number,
            entry_text: entry_text.into(),
            kytara_file: None,
            notes_file: None,
        }
    }

    #[must_use]
    pub fn with_verse_order(mut self, verse_order: impl Into<String>) -> Self {
        self.verse_order = verse_order.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_song() {
        let song = NewSong::new("KK", "Viděl jsem pramen vody", 511, "511A");
        assert_eq!(song.entry_number, 511);
        assert_eq!(song.entry_text, "511A");
        assert!(song.verse_order.is_empty());
        assert!(song.kytara_file.is_none());
    }

    #[test]
    fn test_new_song_builder() {
        let song = NewSong::new("EZ", "Hrad přepevný", 1, "1")
            .with_verse_order("v1 v2 v3");

        assert_eq!(song.verse_order, "v1 v2 v3");
        assert!(song.notes_file.is_none());
    }
}
