//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::{cache::ArticleCache, persist_task::PersistQueue};
use std::sync::Arc;
use wikidle_core::ports::GameStore;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub config: Arc<Config>,
    pub articles: ArticleCache,
    pub persist: PersistQueue,
}

impl AppState {
    pub fn new(store: Arc<dyn GameStore>, config: Arc<Config>, persist: PersistQueue) -> Self {
        Self {
            articles: ArticleCache::new(config.article_cache),
            store,
            config,
            persist,
        }
    }
}
