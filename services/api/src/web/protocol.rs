//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.
//! The client renders them; HTML fragments inside are already safe to insert.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wikidle_core::evaluator::{ClueStatus, Rejection};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// A single guess.
#[derive(Deserialize, Debug, ToSchema)]
pub struct GuessRequest {
    /// The word as typed by the player.
    pub q: String,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// A body span to unmask.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct RevealedWord {
    pub span: usize,
    pub word: String,
}

/// A title banner word to unmask.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct TitleWord {
    pub position: usize,
    pub word: String,
}

/// One line of the attempts list.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct AttemptView {
    pub number: usize,
    pub word: String,
    pub hits: usize,
}

/// Clue state after a guess.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClueView {
    None,
    Countdown { remaining: usize },
    Unlocked { number: usize, text: String },
}

impl From<ClueStatus> for ClueView {
    fn from(status: ClueStatus) -> Self {
        match status {
            ClueStatus::None => Self::None,
            ClueStatus::Countdown { remaining } => Self::Countdown { remaining },
            ClueStatus::Unlocked { number, text } => Self::Unlocked { number, text },
        }
    }
}

/// Statistics shown once the game is won.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct WinSummary {
    pub title: String,
    pub attempts: usize,
    pub total_players: i64,
    pub total_wins: i64,
    pub streak: u32,
    pub words: Vec<String>,
}

/// Everything needed to render the game page.
#[derive(Serialize, Debug, ToSchema)]
pub struct GameView {
    pub day: String,
    /// The obscured article, or the revealed one once the game is won.
    pub article_html: String,
    /// Base URL for links inside the revealed article.
    pub base_url: String,
    pub motd: String,
    pub search_placeholder: String,
    pub won: bool,
    pub attempts: Vec<AttemptView>,
    pub revealed: Vec<RevealedWord>,
    pub title_revealed: Vec<TitleWord>,
    pub clues: Vec<String>,
    pub summary: Option<WinSummary>,
}

/// The result of a scored guess.
#[derive(Serialize, Debug, ToSchema)]
pub struct GuessResponse {
    pub attempt: AttemptView,
    pub revealed: Vec<RevealedWord>,
    pub title_revealed: Vec<TitleWord>,
    pub won: bool,
    pub clue: ClueView,
    pub search_placeholder: String,
    /// Present once the game is won.
    pub article_html: Option<String>,
    pub motd: Option<String>,
    pub summary: Option<WinSummary>,
}

/// Why a guess was ignored.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    Empty,
    Duplicate,
    StopWord,
    AlreadyWon,
}

impl From<Rejection> for IgnoredReason {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Empty => Self::Empty,
            Rejection::Duplicate => Self::Duplicate,
            Rejection::StopWord => Self::StopWord,
            Rejection::AlreadyWon => Self::AlreadyWon,
        }
    }
}

/// Sent with `202 Accepted` when a guess changes nothing.
#[derive(Serialize, Debug, ToSchema)]
pub struct GuessIgnored {
    pub ignored: IgnoredReason,
}
