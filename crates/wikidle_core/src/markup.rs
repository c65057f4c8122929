//! crates/wikidle_core/src/markup.rs
//!
//! A lightweight markup scanner. It splits a document into tag and text segments
//! without building a tree, which is all the obscurer and the attribute rewrites need.

use regex::Regex;

//=========================================================================================
// Segments
//=========================================================================================

/// One slice of a markup document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Anything between `<` and its closing `>`: elements, comments, doctype.
    Tag(&'a str),
    /// Character data between tags.
    Text(&'a str),
}

/// Iterates over the segments of `html` in document order.
pub fn segments(html: &str) -> Segments<'_> {
    Segments { html, pos: 0 }
}

pub struct Segments<'a> {
    html: &'a str,
    pos: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.html[self.pos..];
        if rest.is_empty() {
            return None;
        }

        if opens_tag(rest) {
            let len = tag_len(rest);
            self.pos += len;
            return Some(Segment::Tag(&rest[..len]));
        }

        // Text runs until the next `<` that really opens a tag.
        let mut len = rest.len();
        for (offset, _) in rest.match_indices('<').filter(|(i, _)| *i > 0) {
            if opens_tag(&rest[offset..]) {
                len = offset;
                break;
            }
        }
        self.pos += len;
        Some(Segment::Text(&rest[..len]))
    }
}

fn opens_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<')
        && matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?')
}

/// Byte length of the tag at the start of `s`, honoring quoted attribute values and comments.
fn tag_len(s: &str) -> usize {
    if s.starts_with("<!--") {
        return s[4..].find("-->").map(|end| end + 4 + 3).unwrap_or(s.len());
    }

    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            (None, _) => {}
        }
    }
    s.len()
}

//=========================================================================================
// Start Tags
//=========================================================================================

/// A parsed start tag whose attributes can be edited and rendered back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attrs: Vec<(String, Option<String>)>,
    pub self_closing: bool,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn render(&self) -> String {
        let mut out = format!("<{}", self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
        }
        if self.self_closing {
            out.push_str(" /");
        }
        out.push('>');
        out
    }
}

/// Compiled patterns for reading start tags. Built once and shared by reference.
#[derive(Debug, Clone)]
pub struct TagParser {
    name: Regex,
    attr: Regex,
}

impl Default for TagParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TagParser {
    pub fn new() -> Self {
        Self {
            name: Regex::new(r"^<([A-Za-z][A-Za-z0-9:-]*)").expect("tag name pattern is valid"),
            attr: Regex::new(
                r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
            )
            .expect("attribute pattern is valid"),
        }
    }

    /// Parses `tag` when it is a start tag; end tags, comments and doctypes yield `None`.
    pub fn parse(&self, tag: &str) -> Option<StartTag> {
        let caps = self.name.captures(tag)?;
        let name_match = caps.get(1)?;
        let name = name_match.as_str().to_ascii_lowercase();

        let body = tag[name_match.end()..].trim_end_matches('>');
        let self_closing = body.trim_end().ends_with('/');
        let body = body.trim_end().trim_end_matches('/');

        let attrs = self
            .attr
            .captures_iter(body)
            .filter_map(|c| {
                let key = c.get(1)?.as_str().to_string();
                let value = c
                    .get(2)
                    .or_else(|| c.get(3))
                    .or_else(|| c.get(4))
                    .map(|m| m.as_str().to_string());
                Some((key, value))
            })
            .collect();

        Some(StartTag {
            name,
            attrs,
            self_closing,
        })
    }
}

/// Escapes text for safe inclusion in element content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
