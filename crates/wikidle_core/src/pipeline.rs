//! crates/wikidle_core/src/pipeline.rs
//!
//! The daily batch job: pick a title, fetch its markup, build the article and store it.
//! Nothing is stored unless every step succeeds.

use std::sync::Arc;
use tracing::{info, warn};

use crate::builder::{ArticleBuilder, BuildError};
use crate::domain::{Article, DayKey};
use crate::ports::{ArticleSource, GameStore};

pub struct ArticlePipeline {
    builder: Arc<ArticleBuilder>,
    source: Arc<dyn ArticleSource>,
    store: Arc<dyn GameStore>,
}

impl ArticlePipeline {
    pub fn new(
        builder: Arc<ArticleBuilder>,
        source: Arc<dyn ArticleSource>,
        store: Arc<dyn GameStore>,
    ) -> Self {
        Self {
            builder,
            source,
            store,
        }
    }

    /// Takes the next queued title for `day` and removes it from the queue.
    pub async fn next_title(&self, day: DayKey) -> Result<String, BuildError> {
        let queued = self
            .store
            .take_next_queued_title(day)
            .await
            .map_err(BuildError::Store)?
            .ok_or(BuildError::EmptyQueue)?;

        self.store
            .delete_from_queue(queued.id)
            .await
            .map_err(BuildError::Store)?;

        info!("Took '{}' from the article queue for {}", queued.title, day);
        Ok(queued.title)
    }

    /// Builds the article `title` for `day` and saves it, replacing any earlier build.
    pub async fn run(&self, title: &str, day: DayKey) -> Result<Article, BuildError> {
        info!("Building article '{}' for {}", title, day);

        let fetch_error = |source| BuildError::Fetch {
            title: title.to_string(),
            source,
        };
        let markup = self.source.fetch_markup(title).await.map_err(fetch_error)?;
        let related = self.source.related_titles(title).await.map_err(fetch_error)?;

        let article = self.builder.build(day, title, &markup, &related)?;
        if article.words.is_empty() {
            warn!("Article '{}' produced no guessable words", article.title);
        }

        self.store
            .save_article(day, &article)
            .await
            .map_err(BuildError::Store)?;

        info!(
            "Stored article '{}' for {} ({} spans, {} clues)",
            article.title,
            day,
            article.words.len(),
            article.clues.len()
        );
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueuedTitle;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeStore {
        articles: Mutex<Vec<Article>>,
        queue: Mutex<Vec<QueuedTitle>>,
    }

    #[async_trait]
    impl GameStore for FakeStore {
        async fn get_article(&self, day: DayKey) -> PortResult<Article> {
            self.articles
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == day)
                .cloned()
                .ok_or_else(|| PortError::NotFound(day.to_string()))
        }
        async fn save_article(&self, _day: DayKey, article: &Article) -> PortResult<()> {
            self.articles.lock().unwrap().push(article.clone());
            Ok(())
        }
        async fn save_game_record(&self, _: Uuid, _: DayKey, _: serde_json::Value) -> PortResult<()> {
            Ok(())
        }
        async fn count_sessions(&self, _: DayKey) -> PortResult<i64> {
            Ok(0)
        }
        async fn count_wins(&self, _: DayKey) -> PortResult<i64> {
            Ok(0)
        }
        async fn take_next_queued_title(&self, day: DayKey) -> PortResult<Option<QueuedTitle>> {
            let queue = self.queue.lock().unwrap();
            Ok(queue
                .iter()
                .find(|q| q.preferred_day == Some(day))
                .or_else(|| queue.first())
                .cloned())
        }
        async fn delete_from_queue(&self, id: i64) -> PortResult<()> {
            self.queue.lock().unwrap().retain(|q| q.id != id);
            Ok(())
        }
        async fn enqueue_title(&self, title: &str, preferred_day: Option<DayKey>) -> PortResult<i64> {
            let mut queue = self.queue.lock().unwrap();
            let id = queue.len() as i64 + 1;
            queue.push(QueuedTitle {
                id,
                title: title.to_string(),
                preferred_day,
            });
            Ok(id)
        }
    }

    struct FakeSource {
        fail: bool,
    }

    #[async_trait]
    impl ArticleSource for FakeSource {
        async fn fetch_markup(&self, title: &str) -> PortResult<String> {
            if self.fail {
                return Err(PortError::Unexpected("timed out".to_string()));
            }
            Ok(format!("<section><p>{title} es un astro brillante.</p></section>"))
        }
        async fn related_titles(&self, _title: &str) -> PortResult<Vec<String>> {
            Ok(vec!["Luna".to_string()])
        }
    }

    fn pipeline(store: Arc<FakeStore>, fail: bool) -> ArticlePipeline {
        ArticlePipeline::new(
            Arc::new(ArticleBuilder::new()),
            Arc::new(FakeSource { fail }),
            store,
        )
    }

    #[tokio::test]
    async fn builds_and_stores_the_article() {
        let store = Arc::new(FakeStore::default());
        let day: DayKey = "20240301".parse().unwrap();

        let article = pipeline(store.clone(), false).run("Sol", day).await.unwrap();
        assert_eq!(article.clues, vec!["Luna"]);
        assert_eq!(store.get_article(day).await.unwrap(), article);
    }

    #[tokio::test]
    async fn fetch_failures_store_nothing() {
        let store = Arc::new(FakeStore::default());
        let day: DayKey = "20240301".parse().unwrap();

        let result = pipeline(store.clone(), true).run("Sol", day).await;
        assert!(matches!(result, Err(BuildError::Fetch { .. })));
        assert!(matches!(store.get_article(day).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn next_title_prefers_the_day_and_consumes_the_entry() {
        let store = Arc::new(FakeStore::default());
        let day: DayKey = "20240301".parse().unwrap();
        store.enqueue_title("Luna", None).await.unwrap();
        store.enqueue_title("Sol", Some(day)).await.unwrap();

        let p = pipeline(store.clone(), false);
        assert_eq!(p.next_title(day).await.unwrap(), "Sol");
        assert_eq!(p.next_title(day).await.unwrap(), "Luna");
        assert!(matches!(p.next_title(day).await, Err(BuildError::EmptyQueue)));
    }
}
