//! crates/wikidle_core/src/normalize.rs
//!
//! Canonical comparison keys for words. Every "is this the same word" decision in the
//! game (guess de-duplication, hit counting, win detection, stop-words) goes through
//! [`normalize`].

/// Characters trimmed from both ends of a word before comparison.
const TRIMMED: &[char] = &[
    '.', ',', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '¿', '?', '¡', '!', ' ',
];

/// Function words that are never obscured, never scored and never required to win.
pub const STOP_WORDS: &[&str] = &[
    "a", "con", "de", "del", "en", "es", "para", "por", "sin", "el", "la", "los", "las", "un",
    "uno", "unos", "una", "unas", "y", "o", "u", "e", "que", "le", "les", "lo",
];

/// Maps a surface word to its comparison key.
pub fn normalize(word: &str) -> String {
    let lowered = word.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| c.is_whitespace() || TRIMMED.contains(&c));

    trimmed
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect()
}

/// True when the (already normalized) key is a stop-word.
pub fn is_excluded(key: &str) -> bool {
    STOP_WORDS.contains(&key)
}
