//! crates/wikidle_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the game's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Article, DayKey, QueuedTitle};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait GameStore: Send + Sync {
    // --- Articles ---
    /// Returns `PortError::NotFound` when no article was built for `day`.
    async fn get_article(&self, day: DayKey) -> PortResult<Article>;

    /// Idempotent upsert keyed by `day`.
    async fn save_article(&self, day: DayKey, article: &Article) -> PortResult<()>;

    // --- Game Records ---
    /// Idempotent upsert keyed by `(player_id, day)`. `game_data` is the day's session as JSON.
    async fn save_game_record(
        &self,
        player_id: Uuid,
        day: DayKey,
        game_data: serde_json::Value,
    ) -> PortResult<()>;

    async fn count_sessions(&self, day: DayKey) -> PortResult<i64>;

    async fn count_wins(&self, day: DayKey) -> PortResult<i64>;

    // --- Article Queue ---
    /// The entry reserved for `preferred_day` if any, otherwise the oldest entry.
    async fn take_next_queued_title(&self, preferred_day: DayKey) -> PortResult<Option<QueuedTitle>>;

    async fn delete_from_queue(&self, id: i64) -> PortResult<()>;

    async fn enqueue_title(&self, title: &str, preferred_day: Option<DayKey>) -> PortResult<i64>;
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetches the raw markup of the article called `title`.
    async fn fetch_markup(&self, title: &str) -> PortResult<String>;

    /// Titles of articles related to `title`, used as clues.
    async fn related_titles(&self, title: &str) -> PortResult<Vec<String>>;
}
