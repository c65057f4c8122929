pub mod cache;
pub mod middleware;
pub mod persist_task;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::{player_context, RequestContext, GAME_DATA_HEADER};
pub use rest::{game_handler, guess_handler, health_handler, ApiDoc};
pub use state::AppState;

/// Builds the game API. Binaries add CORS and the Swagger UI on top.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Game routes carry the player session header
    let game_routes = Router::new()
        .route("/game", get(game_handler))
        .route("/guess", post(guess_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            player_context,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(game_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
