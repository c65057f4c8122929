//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `GameStore` port. It backs the service tests
//! and local runs without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use wikidle_core::domain::{Article, DayKey, QueuedTitle};
use wikidle_core::ports::{GameStore, PortError, PortResult};

#[derive(Default)]
pub struct MemoryStore {
    articles: RwLock<HashMap<DayKey, Article>>,
    games: RwLock<HashMap<(Uuid, DayKey), serde_json::Value>>,
    queue: RwLock<Vec<QueuedTitle>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored record for `(player_id, day)`, if any.
    pub async fn game_record(&self, player_id: Uuid, day: DayKey) -> Option<serde_json::Value> {
        self.games.read().await.get(&(player_id, day)).cloned()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get_article(&self, day: DayKey) -> PortResult<Article> {
        self.articles
            .read()
            .await
            .get(&day)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Article {} not found", day)))
    }

    async fn save_article(&self, day: DayKey, article: &Article) -> PortResult<()> {
        self.articles.write().await.insert(day, article.clone());
        Ok(())
    }

    async fn save_game_record(
        &self,
        player_id: Uuid,
        day: DayKey,
        game_data: serde_json::Value,
    ) -> PortResult<()> {
        self.games.write().await.insert((player_id, day), game_data);
        Ok(())
    }

    async fn count_sessions(&self, day: DayKey) -> PortResult<i64> {
        let games = self.games.read().await;
        Ok(games.keys().filter(|(_, d)| *d == day).count() as i64)
    }

    async fn count_wins(&self, day: DayKey) -> PortResult<i64> {
        let games = self.games.read().await;
        Ok(games
            .iter()
            .filter(|((_, d), data)| *d == day && data["w"].as_bool().unwrap_or(false))
            .count() as i64)
    }

    async fn take_next_queued_title(&self, preferred_day: DayKey) -> PortResult<Option<QueuedTitle>> {
        let queue = self.queue.read().await;
        Ok(queue
            .iter()
            .find(|q| q.preferred_day == Some(preferred_day))
            .or_else(|| queue.first())
            .cloned())
    }

    async fn delete_from_queue(&self, id: i64) -> PortResult<()> {
        self.queue.write().await.retain(|q| q.id != id);
        Ok(())
    }

    async fn enqueue_title(&self, title: &str, preferred_day: Option<DayKey>) -> PortResult<i64> {
        let mut queue = self.queue.write().await;
        let id = queue.iter().map(|q| q.id).max().unwrap_or(0) + 1;
        queue.push(QueuedTitle {
            id,
            title: title.to_string(),
            preferred_day,
        });
        Ok(id)
    }
}
