//! services/api/src/web/middleware.rs
//!
//! Player session middleware for the game routes.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;
use wikidle_core::{DayKey, PlayerData};

use crate::web::state::AppState;

/// Carries the player's state in both directions.
pub const GAME_DATA_HEADER: &str = "x-game-data";

/// Per-request game context, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub day: DayKey,
    pub player: PlayerData,
}

/// Middleware that restores the player from the `x-game-data` header.
///
/// A missing or unreadable header starts a new player. Handlers that change the player
/// return it as a response extension; it is then written back to the header and queued
/// for persistence. Otherwise the incoming state is echoed unchanged.
pub async fn player_context(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Decode the player for today's game
    let day = state.config.game_day.unwrap_or_else(DayKey::today);
    let token = req
        .headers()
        .get(GAME_DATA_HEADER)
        .and_then(|v| v.to_str().ok());
    let player = PlayerData::decode(token, day);

    // 2. Hand it to the handler
    req.extensions_mut().insert(RequestContext {
        day,
        player: player.clone(),
    });
    let mut response = next.run(req).await;

    // 3. Persist whatever the handler returned
    let player = match response.extensions_mut().remove::<PlayerData>() {
        Some(updated) => {
            match updated.game_record() {
                Ok(record) => state.persist.dispatch(record),
                Err(e) => error!("Failed to serialize game record: {:?}", e),
            }
            updated
        }
        None => player,
    };

    // 4. Send it back to the client
    match player.encode().map(HeaderValue::try_from) {
        Ok(Ok(value)) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(GAME_DATA_HEADER), value);
        }
        Ok(Err(e)) => error!("Game data token is not a valid header value: {:?}", e),
        Err(e) => error!("Failed to encode game data: {:?}", e),
    }

    response
}
