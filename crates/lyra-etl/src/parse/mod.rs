//! Song file parsers.
//!
//! Two source dialects are supported: OpenLyrics-style files (EZ) and
//! OpenSong-style files (KK). Both produce the same [`ParsedSong`].

pub mod ez;
pub mod kk;

use std::path::Path;

use lyra_core::model::{Author, NewSong, Verse};
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub use kk::{parse_hymn_number, split_verses, strip_title_number};

/// A song as read from one source file, before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSong {
    pub title: String,
    pub entry_number: i64,
    pub entry_text: String,
    pub verse_order: String,
    pub authors: Vec<Author>,
    pub verses: Vec<Verse>,
}

impl ParsedSong {
    /// The `songs` row for this song within the given songbook.
    #[must_use]
    pub fn to_new_song(&self, songbook_acronym: &str) -> NewSong {
        NewSong::new(
            songbook_acronym,
            self.title.clone(),
            self.entry_number,
            self.entry_text.clone(),
        )
        .with_verse_order(self.verse_order.clone())
    }
}

/// The XML dialect of a songbook's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// OpenLyrics: titles, songbook entry, authors and named verses.
    Ez,
    /// OpenSong: title, hymn number and one lyrics block with verse markers.
    Kk,
}

impl Dialect {
    pub fn parse_str(self, xml: &str) -> Result<ParsedSong, ParseError> {
        match self {
            Self::Ez => ez::parse_str(xml),
            Self::Kk => kk::parse_str(xml),
        }
    }

    pub fn parse_file(self, path: impl AsRef<Path>) -> Result<ParsedSong, ParseError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(&xml)
    }
}

/// What the document walker reports, with the element path from the root.
#[derive(Debug)]
pub(crate) enum Node<'a> {
    Open {
        path: &'a [String],
        element: &'a BytesStart<'a>,
    },
    Text {
        path: &'a [String],
        text: &'a str,
    },
    Close {
        path: &'a [String],
    },
}

/// Walk a `<song>` document and feed every element and text run to `visit`.
pub(crate) fn walk<F>(xml: &str, mut visit: F) -> Result<(), ParseError>
where
    F: FnMut(Node<'_>) -> Result<(), ParseError>,
{
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|source| ParseError::Xml {
            position: reader.buffer_position(),
            source,
        })?;

        match event {
            Event::Start(element) => {
                enter(&mut path, &mut seen_root, &element)?;
                visit(Node::Open {
                    path: &path,
                    element: &element,
                })?;
            }
            Event::Empty(element) => {
                enter(&mut path, &mut seen_root, &element)?;
                visit(Node::Open {
                    path: &path,
                    element: &element,
                })?;
                visit(Node::Close { path: &path })?;
                path.pop();
            }
            Event::End(_) => {
                visit(Node::Close { path: &path })?;
                path.pop();
            }
            Event::Text(text) if !path.is_empty() => {
                let text = text.unescape().map_err(|source| ParseError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                visit(Node::Text {
                    path: &path,
                    text: &text,
                })?;
            }
            Event::CData(data) if !path.is_empty() => {
                let text = String::from_utf8_lossy(&data);
                visit(Node::Text {
                    path: &path,
                    text: &text,
                })?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = path.last() {
        return Err(ParseError::Xml {
            position: reader.buffer_position(),
            source: quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(open.clone())),
        });
    }
    if !seen_root {
        return Err(ParseError::MissingRoot);
    }
    Ok(())
}

fn enter(
    path: &mut Vec<String>,
    seen_root: &mut bool,
    element: &BytesStart<'_>,
) -> Result<(), ParseError> {
    let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
    if path.is_empty() {
        if *seen_root || name != "song" {
            return Err(ParseError::MissingRoot);
        }
        *seen_root = true;
    }
    path.push(name);
    Ok(())
}

/// Whether `path` is exactly `expected`.
pub(crate) fn at(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

/// Attribute value by local name, unescaped.
pub(crate) fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|source| ParseError::Xml { position: 0, source })?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|source| ParseError::Xml { position: 0, source })?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_requires_song_root() {
        let result = walk("<hymn><title>x</title></hymn>", |_| Ok(()));
        assert!(matches!(result, Err(ParseError::MissingRoot)));

        let result = walk("", |_| Ok(()));
        assert!(matches!(result, Err(ParseError::MissingRoot)));
    }

    #[test]
    fn test_walk_rejects_unclosed_elements() {
        let result = walk("<song><title>x</title>", |_| Ok(()));
        assert!(matches!(result, Err(ParseError::Xml { .. })));
    }

    #[test]
    fn test_walk_rejects_mismatched_tags() {
        let result = walk("<song><title>x</titel></song>", |_| Ok(()));
        assert!(matches!(result, Err(ParseError::Xml { .. })));
    }

    #[test]
    fn test_walk_reports_paths() {
        let mut texts = Vec::new();
        walk(
            "<?xml version=\"1.0\"?>\n<song><a><b>one</b></a><c/>two</song>",
            |node| {
                if let Node::Text { path, text } = node {
                    texts.push((path.join("/"), text.to_string()));
                }
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(
            texts,
            vec![
                ("song/a/b".to_string(), "one".to_string()),
                ("song".to_string(), "two".to_string()),
            ]
        );
    }

    #[test]
    fn test_dialect_parse_file_missing() {
        let err = Dialect::Ez.parse_file("/nonexistent/song.xml").unwrap_err();
        assert!(matches!(err, ParseError::Read { .. }));
    }

    #[test]
    fn test_to_new_song() {
        let parsed = ParsedSong {
            title: "Hrad přepevný".to_string(),
            entry_number: 1,
            entry_text: "1".to_string(),
            verse_order: "v1 v2".to_string(),
            ..ParsedSong::default()
        };
        let song = parsed.to_new_song("EZ");
        assert_eq!(song.songbook_acronym, "EZ");
        assert_eq!(song.verse_order, "v1 v2");
        assert_eq!(song.entry_number, 1);
    }
}
