//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub default_page_size: u32,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Remote endpoints ---
        let api_base_url = parse_url(
            "STORY_API_BASE_URL",
            var_or("STORY_API_BASE_URL", "https://story-api.dicoding.dev/v1"),
        )?;
        let geocoder_base_url = parse_url(
            "GEOCODER_BASE_URL",
            var_or("GEOCODER_BASE_URL", "https://nominatim.openstreetmap.org"),
        )?;
        let geocoder_user_agent = var_or("GEOCODER_USER_AGENT", "storyhub-client/0.1");

        // --- Offline database ---
        let database_url = var_or("OFFLINE_DB_URL", "sqlite://storyhub.db");
        if !database_url.starts_with("sqlite:") {
            return Err(ConfigError::InvalidValue(
                "OFFLINE_DB_URL".to_string(),
                format!("'{}' is not a sqlite URL", database_url),
            ));
        }
        let database_max_connections =
            parse_positive("OFFLINE_DB_MAX_CONNECTIONS", var_or("OFFLINE_DB_MAX_CONNECTIONS", "4"))?;

        let default_page_size =
            parse_positive("DEFAULT_PAGE_SIZE", var_or("DEFAULT_PAGE_SIZE", "18"))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            geocoder_base_url,
            geocoder_user_agent,
            database_url,
            database_max_connections,
            default_page_size,
            log_level,
        })
    }
}

fn parse_url(key: &str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim_end_matches('/').to_string();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed)
    } else {
        Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not an http(s) URL", value),
        ))
    }
}

fn parse_positive(key: &str, value: String) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", value),
        )),
    }
}
