use serde::{Deserialize, Serialize};

/// One verse of a song. `lines` keeps line breaks as `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    /// Verse label referenced by the song's verse order ("v1", "c").
    pub name: String,
    pub lines: String,
}

impl Verse {
    #[must_use]
    pub fn new(name: impl Into<String>, lines: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: lines.into(),
        }
    }
}
