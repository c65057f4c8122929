//! services/api/src/web/cache.rs
//!
//! Keeps the current day's article in memory. Only one day is ever current, so the
//! cache holds a single entry and a newer day replaces it.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use wikidle_core::domain::{Article, DayKey};
use wikidle_core::ports::{GameStore, PortResult};

pub struct ArticleCache {
    enabled: bool,
    current: RwLock<Option<Arc<Article>>>,
}

impl ArticleCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: RwLock::new(None),
        }
    }

    /// The article for `day`, read through the cache when it is enabled.
    pub async fn get(&self, store: &dyn GameStore, day: DayKey) -> PortResult<Arc<Article>> {
        if self.enabled {
            if let Some(article) = self.current.read().await.as_ref().filter(|a| a.id == day) {
                return Ok(article.clone());
            }
        }

        let article = Arc::new(store.get_article(day).await?);

        if self.enabled {
            let mut current = self.current.write().await;
            if current.as_ref().map_or(true, |cached| cached.id <= day) {
                info!("Caching article '{}' for {}", article.title, day);
                *current = Some(article.clone());
            }
        }

        Ok(article)
    }
}
