//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `GameStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;
use wikidle_core::domain::{Article, DayKey, QueuedTitle};
use wikidle_core::ports::{GameStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `GameStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ArticleRecord {
    content: Json<Article>,
}
impl ArticleRecord {
    fn to_domain(self) -> Article {
        self.content.0
    }
}

#[derive(FromRow)]
struct QueueRecord {
    id: i64,
    title: String,
    preferred_day: Option<String>,
}
impl QueueRecord {
    fn to_domain(self) -> QueuedTitle {
        QueuedTitle {
            id: self.id,
            title: self.title,
            preferred_day: self.preferred_day.and_then(|d| d.parse().ok()),
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `GameStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl GameStore for DbAdapter {
    async fn get_article(&self, day: DayKey) -> PortResult<Article> {
        let record = sqlx::query_as::<_, ArticleRecord>("SELECT content FROM article WHERE id = $1")
            .bind(day.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Article {} not found", day)),
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn save_article(&self, day: DayKey, article: &Article) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO article (id, title, content) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, content = EXCLUDED.content",
        )
        .bind(day.to_string())
        .bind(&article.title)
        .bind(Json(article))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn save_game_record(
        &self,
        player_id: Uuid,
        day: DayKey,
        game_data: serde_json::Value,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO game (player_id, game_id, game_data) VALUES ($1, $2, $3) \
             ON CONFLICT (player_id, game_id) DO UPDATE SET game_data = EXCLUDED.game_data, updated_at = NOW()",
        )
        .bind(player_id)
        .bind(day.to_string())
        .bind(game_data)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn count_sessions(&self, day: DayKey) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM game WHERE game_id = $1")
            .bind(day.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn count_wins(&self, day: DayKey) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM game WHERE game_id = $1 AND COALESCE((game_data->>'w')::boolean, false)",
        )
        .bind(day.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn take_next_queued_title(&self, preferred_day: DayKey) -> PortResult<Option<QueuedTitle>> {
        let reserved = sqlx::query_as::<_, QueueRecord>(
            "SELECT id, title, preferred_day FROM article_queue WHERE preferred_day = $1 ORDER BY id LIMIT 1",
        )
        .bind(preferred_day.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = reserved {
            return Ok(Some(record.to_domain()));
        }

        let oldest = sqlx::query_as::<_, QueueRecord>(
            "SELECT id, title, preferred_day FROM article_queue ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(oldest.map(QueueRecord::to_domain))
    }

    async fn delete_from_queue(&self, id: i64) -> PortResult<()> {
        sqlx::query("DELETE FROM article_queue WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn enqueue_title(&self, title: &str, preferred_day: Option<DayKey>) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO article_queue (title, preferred_day) VALUES ($1, $2) RETURNING id",
        )
        .bind(title)
        .bind(preferred_day.map(|d| d.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }
}
