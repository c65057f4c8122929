//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;
use wikidle_core::DayKey;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Base URL of the encyclopedia the articles come from.
    pub wiki_base_url: String,
    /// Hard limit for every fetch made while building an article.
    pub fetch_timeout: Duration,
    /// Keep the current day's article in memory instead of reading it on every request.
    pub article_cache: bool,
    pub cors_origin: String,
    /// Serve this day instead of the current UTC date.
    pub game_day: Option<DayKey>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Article Source Settings ---
        let wiki_base_url = std::env::var("WIKI_BASE_URL")
            .unwrap_or_else(|_| "https://es.wikipedia.org".to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_str = std::env::var("FETCH_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string());
        let fetch_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue("FETCH_TIMEOUT_SECS".to_string(), e.to_string()))?;

        // --- Load Web Settings ---
        let article_cache = parse_flag("ARTICLE_CACHE", true)?;
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let game_day = match std::env::var("GAME_DAY") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<DayKey>().map_err(|e| {
                ConfigError::InvalidValue("GAME_DAY".to_string(), e.to_string())
            })?),
            _ => None,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            wiki_base_url,
            fetch_timeout,
            article_cache,
            cors_origin,
            game_day,
        })
    }
}

fn parse_flag(name: &str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}
