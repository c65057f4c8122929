//! crates/wikidle_core/src/session.rs
//!
//! Per-player state that round-trips through the client on every request, plus the
//! day-to-day winning streak.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Article, DayKey, GameSession};
use crate::evaluator::{self, GuessOutcome};

/// A streak whose last win is older than this many days is reset.
pub const STREAK_STALE_AFTER_DAYS: i64 = 3;

//=========================================================================================
// Player Data
//=========================================================================================

/// Everything the client carries between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    #[serde(rename = "i")]
    pub id: Uuid,
    #[serde(rename = "g")]
    pub game: GameSession,
    #[serde(rename = "s", default)]
    pub streak: u32,
    /// Day of the most recent win.
    #[serde(rename = "t", default)]
    pub last_win: Option<DayKey>,
}

/// A session snapshot ready for the durable store.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub player_id: Uuid,
    pub day: DayKey,
    pub game_data: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("Token payload is not valid player data: {0}")]
    Payload(#[from] serde_json::Error),
}

impl PlayerData {
    /// A brand-new player with an empty game for `today`.
    pub fn new(today: DayKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            game: GameSession::new(today),
            streak: 0,
            last_win: None,
        }
    }

    /// Reads the transport token. Missing or malformed tokens yield a new player; a
    /// token from another day keeps the player and streak but starts a fresh game.
    pub fn decode(token: Option<&str>, today: DayKey) -> Self {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Self::new(today),
        };

        match Self::parse_token(token) {
            Ok(mut player) => {
                player.roll_over(today);
                player
            }
            Err(e) => {
                warn!("Discarding malformed game data token: {}", e);
                Self::new(today)
            }
        }
    }

    fn parse_token(token: &str) -> Result<Self, TokenError> {
        // Plain JSON is accepted too, which is what older clients stored.
        if token.starts_with('{') {
            return Ok(serde_json::from_str(token)?);
        }
        let bytes = URL_SAFE_NO_PAD.decode(token)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Serializes into the compact, header-safe transport token.
    pub fn encode(&self) -> Result<String, TokenError> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Moves the player to `today`: drops another day's game and expires a stale streak.
    pub fn roll_over(&mut self, today: DayKey) {
        if self.game.article_id != today {
            self.game = GameSession::new(today);
        }

        if let Some(last) = self.last_win {
            if today.days_since(last) > STREAK_STALE_AFTER_DAYS {
                self.streak = 0;
            }
        }
    }

    /// Counts a win on `day` towards the streak. Winning the day after the previous
    /// win extends the streak; any other gap starts a new one.
    pub fn record_win(&mut self, day: DayKey) {
        match self.last_win {
            Some(last) if last == day => return,
            Some(last) if last == day.previous() => self.streak = self.streak.saturating_add(1),
            _ => self.streak = 1,
        }
        self.last_win = Some(day);
    }

    /// Runs the guess through the evaluator and updates the streak on the first win.
    pub fn submit_guess(&mut self, article: &Article, raw_guess: &str) -> GuessOutcome {
        let was_won = self.game.won;
        let outcome = evaluator::submit_guess(&mut self.game, article, raw_guess);
        if !was_won && self.game.won {
            self.record_win(article.id);
        }
        outcome
    }

    pub fn game_record(&self) -> Result<GameRecord, serde_json::Error> {
        Ok(GameRecord {
            player_id: self.id,
            day: self.game.article_id,
            game_data: serde_json::to_value(&self.game)?,
        })
    }
}
