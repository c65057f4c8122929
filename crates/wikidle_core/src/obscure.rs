//! crates/wikidle_core/src/obscure.rs
//!
//! Turns article markup into its guessable form. Every word that lives in a text node
//! and is not a stop-word becomes an addressable span with a stable index; its text is
//! replaced by a mask of the same length in code points.

use crate::markup::{segments, Segment};
use crate::normalize::{is_excluded, normalize};
use regex::Regex;
use std::collections::BTreeMap;

/// Filler character used for masked words.
pub const MASK_CHAR: char = '#';

/// The result of obscuring one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObscuredDocument {
    /// The markup with every guessable word replaced by a placeholder span.
    pub html: String,
    /// Normalized word -> span indices, in document order.
    pub tokens: BTreeMap<String, Vec<usize>>,
    /// Span index -> original surface text.
    pub words: BTreeMap<usize, String>,
}

/// Text-node tokenizer. Construct once at startup and share by reference.
#[derive(Debug, Clone)]
pub struct Obscurer {
    word: Regex,
}

impl Default for Obscurer {
    fn default() -> Self {
        Self::new()
    }
}

impl Obscurer {
    pub fn new() -> Self {
        // Character references are matched first so that `&amp;` never yields a word.
        Self {
            word: Regex::new(r"&#?\w+;|\w+").expect("word pattern is valid"),
        }
    }

    pub fn obscure(&self, markup: &str) -> ObscuredDocument {
        let mut doc = ObscuredDocument {
            html: String::with_capacity(markup.len()),
            ..Default::default()
        };
        let mut next_index = 0usize;

        for segment in segments(markup) {
            match segment {
                Segment::Tag(tag) => doc.html.push_str(tag),
                Segment::Text(text) => {
                    let mut last = 0;
                    for found in self.word.find_iter(text) {
                        doc.html.push_str(&text[last..found.start()]);
                        last = found.end();

                        let word = found.as_str();
                        let key = normalize(word);
                        if word.starts_with('&') || key.is_empty() || is_excluded(&key) {
                            doc.html.push_str(word);
                            continue;
                        }

                        doc.html.push_str(&placeholder(next_index, word));
                        doc.tokens.entry(key).or_default().push(next_index);
                        doc.words.insert(next_index, word.to_string());
                        next_index += 1;
                    }
                    doc.html.push_str(&text[last..]);
                }
            }
        }

        doc
    }
}

/// A run of [`MASK_CHAR`] as long as `word` in code points.
pub fn mask(word: &str) -> String {
    std::iter::repeat(MASK_CHAR).take(word.chars().count()).collect()
}

/// The placeholder that stands in for span `index` in the obscured document.
pub fn placeholder(index: usize, word: &str) -> String {
    format!(
        r#"<span class="obscured" id="obscured-{}">{}</span>"#,
        index,
        mask(word)
    )
}
