//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint, used when only a Gemini key is configured.
pub const GEMINI_OPENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which key and endpoint the vision adapter talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisionCredentials {
    pub api_key: String,
    /// `None` means the client library's default (OpenAI).
    pub api_base: Option<String>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub data_dir: PathBuf,
    pub cors_origin: String,
    pub vision: VisionCredentials,
    pub vision_model: String,
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
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Load Vision Provider Settings ---
        // An OpenAI key wins when both are present.
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        let api_base_override = lookup("VISION_API_BASE").filter(|b| !b.trim().is_empty());

        let (vision, default_model) = match (openai_api_key, gemini_api_key) {
            (Some(api_key), _) => (
                VisionCredentials {
                    api_key,
                    api_base: api_base_override,
                },
                DEFAULT_OPENAI_MODEL,
            ),
            (None, Some(api_key)) => (
                VisionCredentials {
                    api_key,
                    api_base: Some(
                        api_base_override.unwrap_or_else(|| GEMINI_OPENAI_API_BASE.to_string()),
                    ),
                },
                DEFAULT_GEMINI_MODEL,
            ),
            (None, None) => {
                return Err(ConfigError::MissingVar(
                    "OPENAI_API_KEY or GEMINI_API_KEY".to_string(),
                ))
            }
        };

        let vision_model = lookup("VISION_MODEL").unwrap_or_else(|| default_model.to_string());

        Ok(Self {
            bind_address,
            log_level,
            data_dir,
            cors_origin,
            vision,
            vision_model,
        })
    }
}
