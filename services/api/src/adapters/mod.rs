pub mod db;
pub mod memory;
pub mod wiki;

pub use db::DbAdapter;
pub use memory::MemoryStore;
pub use wiki::WikipediaAdapter;

use crate::error::ApiError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use wikidle_core::ports::GameStore;

/// `DATABASE_URL` value that selects the in-memory store.
pub const IN_MEMORY_DATABASE_URL: &str = "memory";

/// Opens the store named by `database_url` and brings its schema up to date.
pub async fn open_store(database_url: &str) -> Result<Arc<dyn GameStore>, ApiError> {
    if database_url == IN_MEMORY_DATABASE_URL {
        warn!("Using the in-memory store; nothing survives a restart.");
        return Ok(Arc::new(MemoryStore::new()));
    }

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    let db_adapter = DbAdapter::new(pool);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    Ok(Arc::new(db_adapter))
}
