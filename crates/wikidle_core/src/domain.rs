//! crates/wikidle_core/src/domain.rs
//!
//! Defines the pure, core data structures for the game.
//! These structs are independent of any database or transport format.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Day Keys
//=========================================================================================

const DAY_KEY_FORMAT: &str = "%Y%m%d";

/// Identifies one game instance. Rendered as `YYYYMMDD` wherever it leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

#[derive(Debug, thiserror::Error)]
#[error("Invalid day key '{0}', expected YYYYMMDD")]
pub struct DayKeyError(String);

impl DayKey {
    /// The day key for the current UTC date.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn previous(&self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    pub fn next(&self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }

    /// Number of days from `earlier` to `self`. Negative when `earlier` is in the future.
    pub fn days_since(&self, earlier: DayKey) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(DayKeyError(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT)
            .map(Self)
            .map_err(|_| DayKeyError(s.to_string()))
    }
}

impl Serialize for DayKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

//=========================================================================================
// Article
//=========================================================================================

/// The obscured article of one game-day. Built once, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: DayKey,
    pub title: String,
    /// Normalized title words, in title order. Only used for win detection.
    pub title_tokens: Vec<String>,
    /// Normalized word -> span indices where it occurs in the body.
    pub tokens: BTreeMap<String, Vec<usize>>,
    /// Span index -> original surface text.
    pub words: BTreeMap<usize, String>,
    pub obscured_html: String,
    pub unobscured_html: String,
    #[serde(default)]
    pub clues: Vec<String>,
}

impl Article {
    /// Span indices for a normalized key, empty when the word is not in the body.
    pub fn spans_for(&self, key: &str) -> &[usize] {
        self.tokens.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

//=========================================================================================
// Queue
//=========================================================================================

/// A pending article title waiting to become some day's game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTitle {
    pub id: i64,
    pub title: String,
    pub preferred_day: Option<DayKey>,
}

//=========================================================================================
// Game Session
//=========================================================================================

/// One player's guesses for one game-day. Field names are short because the session
/// travels with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    #[serde(rename = "i")]
    pub article_id: DayKey,
    /// Raw guesses in submission order.
    #[serde(rename = "s", default)]
    pub guesses: Vec<String>,
    #[serde(rename = "w", default)]
    pub won: bool,
}

impl GameSession {
    pub fn new(article_id: DayKey) -> Self {
        Self {
            article_id,
            guesses: Vec::new(),
            won: false,
        }
    }
}
