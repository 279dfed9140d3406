use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest acronym the `songbooks` table accepts.
pub const MAX_ACRONYM_LEN: usize = 10;

/// A named collection of songs from one source (e.g. a liturgical hymnal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Songbook {
    /// Short identifier, primary key of the `songbooks` table ("EZ", "KK").
    pub acronym: String,
    /// Human-readable display name.
    pub name: String,
}

impl Songbook {
    /// Build a songbook, rejecting acronyms that are empty or longer than
    /// [`MAX_ACRONYM_LEN`] characters.
    pub fn new(acronym: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let acronym = acronym.into();
        validate_acronym(&acronym)?;
        Ok(Self {
            acronym,
            name: name.into(),
        })
    }
}

/// Check the acronym constraint enforced by the schema.
fn validate_acronym(acronym: &str) -> Result<()> {
    if acronym.is_empty() {
        return Err(Error::InvalidData("songbook acronym is empty".to_string()));
    }
    if acronym.chars().count() > MAX_ACRONYM_LEN {
        return Err(Error::InvalidData(format!(
            "songbook acronym {acronym:?} must be {MAX_ACRONYM_LEN} characters or less"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_songbook_new() {
        let sb = Songbook::new("EZ", "Evangelický zpěvník 2021").unwrap();
        assert_eq!(sb.acronym, "EZ");
        assert_eq!(sb.name, "Evangelický zpěvník 2021");
    }

    #[test]
    fn test_acronym_length_limit() {
        assert!(Songbook::new("ABCDEFGHIJ", "ten").is_ok());
        assert!(Songbook::new("ABCDEFGHIJK", "eleven").is_err());
        assert!(Songbook::new("", "empty").is_err());
    }
}
