use serde::{Deserialize, Serialize};

use crate::error::QueryResult;

/// One row of the full song list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: i64,
    pub entry_number: i64,
    pub entry_text: String,
    pub title: String,

    /// Every verse of the song, separated by blank lines.
    pub verses: String,

    /// First music credit, or empty.
    pub author_music: String,

    /// First words credit, or empty.
    pub author_lyric: String,
    pub kytara_file: String,
    pub songbook_acronym: String,
}

/// One row of the lightweight song list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongHeader {
    pub id: i64,
    pub entry_number: i64,
    pub entry_text: String,
    pub title: String,
    pub title_normalized: String,
    pub verse_order: String,
    pub kytara_file: String,
}

/// What a presentation view needs to show a song verse by verse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub verse_order: String,
    pub verses: Vec<ProjectionVerse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionVerse {
    pub name: String,
    pub lines: String,
}

impl Projection {
    pub fn to_json(&self) -> QueryResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.verse_order.is_empty() && self.verses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_json_keys() {
        let projection = Projection {
            verse_order: "v1 c".to_string(),
            verses: vec![ProjectionVerse {
                name: "v1".to_string(),
                lines: "Hrad přepevný".to_string(),
            }],
        };
        let value: serde_json::Value =
            serde_json::from_str(&projection.to_json().unwrap()).unwrap();
        assert_eq!(value["verse_order"], "v1 c");
        assert_eq!(value["verses"][0]["name"], "v1");
        assert_eq!(value["verses"][0]["lines"], "Hrad přepevný");
    }

    #[test]
    fn test_empty_projection() {
        let projection = Projection::default();
        assert!(projection.is_empty());
        assert_eq!(
            projection.to_json().unwrap(),
            r#"{"verse_order":"","verses":[]}"#
        );
    }
}
