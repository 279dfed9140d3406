//! OpenLyrics song files (EZ).

use std::sync::LazyLock;

use lyra_core::model::{Author, AuthorRole, Verse};
use regex::Regex;

use super::{at, attribute, kk::parse_hymn_number, walk, Node, ParsedSong};
use crate::error::ParseError;

const TITLE: &[&str] = &["song", "properties", "titles", "title"];
const SONGBOOK: &[&str] = &["song", "properties", "songbooks", "songbook"];
const VERSE_ORDER: &[&str] = &["song", "properties", "verseOrder"];
const AUTHOR: &[&str] = &["song", "properties", "authors", "author"];
const VERSE: &[&str] = &["song", "lyrics", "verse"];
const LINES: &[&str] = &["song", "lyrics", "verse", "lines"];

#[allow(clippy::expect_used)]
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid blank-run regex"));

#[allow(clippy::expect_used)]
static BLANKS_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("valid newline-blanks regex"));

#[allow(clippy::expect_used)]
static LINES_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<lines>|</lines>").expect("valid lines-tag regex"));

/// Parse an OpenLyrics document.
pub fn parse_str(xml: &str) -> Result<ParsedSong, ParseError> {
    let mut builder = Builder::default();
    walk(xml, |node| builder.visit(node))?;
    Ok(builder.finish())
}

/// Clean verse text: trim, turn literal `<br/>` markers into newlines, drop
/// stray `<lines>` wrappers and squeeze runs of spaces and tabs. Newlines
/// are kept, without blanks on either side.
pub fn clean_lines(raw: &str) -> String {
    let text = raw.trim().replace("<br />", "\n").replace("<br/>", "\n");
    let text = LINES_TAGS.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, " ");
    BLANKS_AROUND_NEWLINE.replace_all(&text, "\n").into_owned()
}

#[derive(Debug, Default)]
struct Builder {
    song: ParsedSong,
    has_title: bool,
    has_songbook: bool,
    author: Option<(AuthorRole, String)>,
    verse: Option<(String, String)>,
    after_break: bool,
}

impl Builder {
    fn visit(&mut self, node: Node<'_>) -> Result<(), ParseError> {
        match node {
            Node::Open { path, element } => {
                if at(path, SONGBOOK) && !self.has_songbook {
                    self.has_songbook = true;
                    let entry = attribute(element, "entry")?.unwrap_or_default();
                    let entry = entry.trim();
                    self.song.entry_number = parse_hymn_number(entry);
                    self.song.entry_text = entry.to_string();
                } else if at(path, AUTHOR) {
                    let kind = attribute(element, "type")?;
                    self.author = Some((AuthorRole::from_attr(kind.as_deref()), String::new()));
                } else if at(path, VERSE) {
                    let name = attribute(element, "name")?.unwrap_or_default();
                    self.verse = Some((name.trim().to_string(), String::new()));
                } else if at(path, LINES) {
                    // consecutive <lines> blocks of one verse are separate lines
                    if let Some((_, raw)) = &mut self.verse {
                        if !raw.trim().is_empty() {
                            line_break(raw);
                        }
                    }
                    self.after_break = true;
                } else if within_lines(path) && path.last().is_some_and(|name| name == "br") {
                    if let Some((_, raw)) = &mut self.verse {
                        line_break(raw);
                    }
                    self.after_break = true;
                }
            }
            Node::Text { path, text } => {
                if at(path, TITLE) && !self.has_title {
                    self.song.title.push_str(text);
                } else if at(path, VERSE_ORDER) {
                    self.song.verse_order.push_str(text);
                } else if at(path, AUTHOR) {
                    if let Some((_, value)) = &mut self.author {
                        value.push_str(text);
                    }
                } else if within_lines(path) && !path.iter().any(|name| name == "comment") {
                    if let Some((_, raw)) = &mut self.verse {
                        let text = if self.after_break {
                            text.trim_start()
                        } else {
                            text
                        };
                        if !text.is_empty() {
                            raw.push_str(text);
                            self.after_break = false;
                        }
                    }
                }
            }
            Node::Close { path } => {
                if at(path, TITLE) {
                    self.has_title = !self.song.title.trim().is_empty();
                } else if at(path, AUTHOR) {
                    if let Some((role, value)) = self.author.take() {
                        let value = value.trim();
                        if !value.is_empty() {
                            self.song.authors.push(Author::new(role, value));
                        }
                    }
                } else if at(path, VERSE) {
                    if let Some((name, raw)) = self.verse.take() {
                        self.song.verses.push(Verse::new(name, clean_lines(&raw)));
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> ParsedSong {
        self.song.title = self.song.title.trim().to_string();
        self.song.verse_order = self.song.verse_order.trim().to_string();
        self.song
    }
}

fn within_lines(path: &[String]) -> bool {
    path.len() >= LINES.len() && at(&path[..LINES.len()], LINES)
}

/// End the current line, dropping blanks left before the break.
fn line_break(raw: &mut String) {
    let keep = raw.trim_end_matches([' ', '\t']).len();
    raw.truncate(keep);
    raw.push('\n');
}
