//! OpenSong song files (KK).
//!
//! Lyrics arrive as a single text block where `[V1]`, `[V2]` … lines open
//! verses. Titles carry the hymn number as their first word.

use lyra_core::model::Verse;

use super::{at, walk, Node, ParsedSong};
use crate::error::ParseError;

const TITLE: &[&str] = &["song", "title"];
const HYMN_NUMBER: &[&str] = &["song", "hymn_number"];
const LYRICS: &[&str] = &["song", "lyrics"];

/// Parse an OpenSong document.
pub fn parse_str(xml: &str) -> Result<ParsedSong, ParseError> {
    let mut title = String::new();
    let mut hymn_number = String::new();
    let mut lyrics = String::new();

    walk(xml, |node| {
        if let Node::Text { path, text } = node {
            if at(path, TITLE) {
                title.push_str(text);
            } else if at(path, HYMN_NUMBER) {
                hymn_number.push_str(text);
            } else if at(path, LYRICS) {
                lyrics.push_str(text);
            }
        }
        Ok(())
    })?;

    let hymn_number = hymn_number.trim();
    Ok(ParsedSong {
        title: strip_title_number(&title),
        entry_number: parse_hymn_number(hymn_number),
        entry_text: hymn_number.to_string(),
        verse_order: String::new(),
        authors: Vec::new(),
        verses: split_verses(&lyrics),
    })
}

/// Numeric value of the leading ASCII digits: "511A" → 511, "067b" → 67,
/// "2.4" → 2. No leading digit yields 0.
pub fn parse_hymn_number(raw: &str) -> i64 {
    let raw = raw.trim();
    let digits = raw
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw, |end| &raw[..end]);
    digits.parse().unwrap_or(0)
}

/// Drop a leading number token from a title: "065 Litanie" → "Litanie".
/// Titles whose first word does not start with a digit are only trimmed.
pub fn strip_title_number(title: &str) -> String {
    let title = title.trim();
    match title.split_once(' ') {
        Some((token, rest)) if token.starts_with(|c: char| c.is_ascii_digit()) => {
            rest.trim().to_string()
        }
        _ => title.to_string(),
    }
}

/// Split a lyrics block into verses at `[V…]` marker lines.
///
/// Lines are trimmed and blank lines dropped. Text before the first marker
/// and markers without any lines are discarded.
pub fn split_verses(lyrics: &str) -> Vec<Verse> {
    let mut verses = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in lyrics.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with("[V") {
            if let Some(end) = line.find(']') {
                flush(&mut verses, current.take());
                current = Some((line[1..end].to_lowercase(), Vec::new()));
                continue;
            }
        }
        if let Some((_, lines)) = &mut current {
            lines.push(line);
        }
    }
    flush(&mut verses, current);
    verses
}

fn flush(verses: &mut Vec<Verse>, verse: Option<(String, Vec<&str>)>) {
    if let Some((name, lines)) = verse {
        if !lines.is_empty() {
            verses.push(Verse::new(name, lines.join("\n")));
        }
    }
}
