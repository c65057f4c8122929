//! services/api/src/bin/api.rs

use api_lib::{
    adapters::open_store,
    config::Config,
    error::ApiError,
    web::{self, persist_task::PersistQueue, rest::ApiDoc, state::AppState, GAME_DATA_HEADER},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Game Store ---
    let store = open_store(&config.database_url).await?;

    // --- 3. Start the Persistence Worker ---
    let (persist, persist_worker) = PersistQueue::spawn(store.clone());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, config.clone(), persist));

    // --- 5. Create the Web Router ---
    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let game_data = HeaderName::from_static(GAME_DATA_HEADER);
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, game_data.clone()])
        .expose_headers([game_data]);

    let app = Router::new()
        .merge(web::router(app_state))
        .layer(cors)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    // The router owned the last queue handle; let the worker drain what is left.
    if let Err(e) = persist_worker.await {
        tracing::error!("Persistence worker panicked: {:?}", e);
    }

    Ok(())
}
