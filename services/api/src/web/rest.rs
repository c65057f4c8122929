//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the game endpoints and the master definition
//! for the OpenAPI specification.

use crate::web::{
    middleware::RequestContext,
    protocol::{
        AttemptView, ClueView, GameView, GuessIgnored, GuessRequest, GuessResponse,
        IgnoredReason, RevealedWord, TitleWord, WinSummary,
    },
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use wikidle_core::{
    evaluator::{self, ClueStatus},
    Article, GuessOutcome, PlayerData, PortError,
};

const MOTD_PLAYING: &str = "Adivina el artículo de hoy";
const PLACEHOLDER_DEFAULT: &str = "Prueba una palabra...";
const PLACEHOLDER_CLUE: &str = "Recibiste una pista!";
const NO_GAME_YET: &str = "Todavía no hay artículo para hoy. Vuelve en un rato.";
const GENERIC_FAILURE: &str = "Lo siento, ha ocurrido un error.";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(health_handler, game_handler, guess_handler),
    components(schemas(
        GuessRequest,
        GameView,
        GuessResponse,
        GuessIgnored,
        IgnoredReason,
        AttemptView,
        RevealedWord,
        TitleWord,
        ClueView,
        WinSummary
    )),
    tags(
        (name = "Wikidle API", description = "Guess the daily encyclopedia article word by word.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up"))
)]
pub async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Loads today's game for the player in `x-game-data`, replaying their guesses.
#[utoipa::path(
    get,
    path = "/game",
    responses(
        (status = 200, description = "Today's game", body = GameView),
        (status = 404, description = "No article has been built for today"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-game-data" = Option<String>, Header, description = "Player state returned by a previous response.")
    )
)]
pub async fn game_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let article = app_state
        .articles
        .get(app_state.store.as_ref(), ctx.day)
        .await
        .map_err(port_failure)?;

    let mut player = ctx.player;
    // The replay is authoritative; a client cannot claim a win it did not earn.
    let replay = evaluator::replay(&article, &player.game.guesses);
    player.game.won = replay.won;
    if replay.won {
        player.record_win(article.id);
    }

    let attempt_count = replay.attempts.len();
    let (article_html, motd, summary) = if replay.won {
        let summary = win_summary(&app_state, &article, &player, attempt_count).await?;
        (
            article.unobscured_html.clone(),
            win_motd(attempt_count),
            Some(summary),
        )
    } else {
        (article.obscured_html.clone(), MOTD_PLAYING.to_string(), None)
    };

    let view = GameView {
        day: ctx.day.to_string(),
        article_html,
        base_url: wiki_link_base(&app_state),
        motd,
        search_placeholder: PLACEHOLDER_DEFAULT.to_string(),
        won: replay.won,
        attempts: replay
            .attempts
            .iter()
            .map(|a| AttemptView {
                number: a.number,
                word: a.word.clone(),
                hits: a.hits,
            })
            .collect(),
        revealed: replay
            .revealed_words(&article)
            .into_iter()
            .map(|(span, word)| RevealedWord {
                span,
                word: word.to_string(),
            })
            .collect(),
        title_revealed: title_words(&article, replay.title_revealed.iter().copied()),
        clues: evaluator::unlocked_clues(attempt_count, &article.clues).to_vec(),
        summary,
    };

    Ok((Extension(player), Json(view)))
}

/// Submits one guess for today's game.
///
/// Guesses that change nothing (empty, repeated, stop-words, or after the win) are
/// answered with `202 Accepted` and leave the player state untouched.
#[utoipa::path(
    post,
    path = "/guess",
    request_body = GuessRequest,
    responses(
        (status = 200, description = "The guess was scored", body = GuessResponse),
        (status = 202, description = "The guess was ignored", body = GuessIgnored),
        (status = 404, description = "No article has been built for today"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-game-data" = Option<String>, Header, description = "Player state returned by a previous response.")
    )
)]
pub async fn guess_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<GuessRequest>,
) -> Result<Response, (StatusCode, String)> {
    let article = app_state
        .articles
        .get(app_state.store.as_ref(), ctx.day)
        .await
        .map_err(port_failure)?;

    let mut player = ctx.player;
    let scored = match player.submit_guess(&article, &payload.q) {
        GuessOutcome::Rejected(rejection) => {
            let body = GuessIgnored {
                ignored: rejection.into(),
            };
            return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
        }
        GuessOutcome::Scored(scored) => scored,
    };

    let search_placeholder = match &scored.clue {
        ClueStatus::None => PLACEHOLDER_DEFAULT.to_string(),
        ClueStatus::Countdown { remaining } => {
            format!("Recibirás una pista en {} intentos", remaining)
        }
        ClueStatus::Unlocked { .. } => PLACEHOLDER_CLUE.to_string(),
    };

    let (article_html, motd, summary) = if scored.won {
        info!(
            "Player {} guessed '{}' in {} attempts",
            player.id, article.title, scored.attempt
        );
        let summary = win_summary(&app_state, &article, &player, scored.attempt).await?;
        (
            Some(article.unobscured_html.clone()),
            Some(win_motd(scored.attempt)),
            Some(summary),
        )
    } else {
        (None, None, None)
    };

    let response = GuessResponse {
        attempt: AttemptView {
            number: scored.attempt,
            word: scored.word.clone(),
            hits: scored.hits,
        },
        revealed: scored
            .revealed
            .iter()
            .filter_map(|span| {
                article.words.get(span).map(|word| RevealedWord {
                    span: *span,
                    word: word.clone(),
                })
            })
            .collect(),
        title_revealed: title_words(&article, scored.title_revealed.iter().copied()),
        won: scored.won,
        clue: scored.clue.into(),
        search_placeholder,
        article_html,
        motd,
        summary,
    };

    Ok((Extension(player), Json(response)).into_response())
}

//=========================================================================================
// Helpers
//=========================================================================================

fn win_motd(attempts: usize) -> String {
    format!("Adivinaste el artículo de hoy en {} intentos!", attempts)
}

/// Where links in the revealed article point to.
fn wiki_link_base(app_state: &AppState) -> String {
    format!("{}/wiki/", app_state.config.wiki_base_url)
}

/// Pairs banner positions with the title word shown there.
fn title_words(article: &Article, positions: impl Iterator<Item = usize>) -> Vec<TitleWord> {
    let words: Vec<&str> = article.title.split_whitespace().collect();
    positions
        .filter_map(|position| {
            words.get(position).map(|word| TitleWord {
                position,
                word: word.to_string(),
            })
        })
        .collect()
}

async fn win_summary(
    app_state: &AppState,
    article: &Article,
    player: &PlayerData,
    attempts: usize,
) -> Result<WinSummary, (StatusCode, String)> {
    let (total_players, total_wins) = futures::try_join!(
        app_state.store.count_sessions(article.id),
        app_state.store.count_wins(article.id)
    )
    .map_err(port_failure)?;

    Ok(WinSummary {
        title: article.title.clone(),
        attempts,
        total_players,
        total_wins,
        streak: player.streak,
        words: player.game.guesses.clone(),
    })
}

/// Maps a port failure to a response. Details stay in the log.
fn port_failure(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => {
            warn!("No game available: {}", msg);
            (StatusCode::NOT_FOUND, NO_GAME_YET.to_string())
        }
        PortError::Unexpected(msg) => {
            error!("Failed to serve game: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
        }
    }
}
