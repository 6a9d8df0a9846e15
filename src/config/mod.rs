//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::models::RatingBracket;
use crate::normalize::RateScale;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Backend API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the `me`, `heroes` and `stats` paths are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Session identifier sent as the `session_id` cookie
    #[serde(default)]
    pub session_id: Option<String>,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("dota-dash/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_id: None,
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Parsed base URL, with a trailing slash so relative joins keep the path.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| {
            ConfigError::ValidationError(format!("invalid base_url '{}': {}", self.base_url, e))
        })
    }
}

/// Listing and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub default_rating: RatingBracket,

    /// Rows per page for the hero table and match list
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// How incoming rate fields are interpreted
    #[serde(default)]
    pub rate_scale: RateScale,
}

fn default_page_size() -> usize {
    10
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_rating: RatingBracket::default(),
            page_size: default_page_size(),
            rate_scale: RateScale::default(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub view: ViewConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if self.view.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "Page size must be greater than 0".to_string(),
            ));
        }

        if let Some(session) = &self.api.session_id {
            if session.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "session_id must not be blank".to_string(),
                ));
            }
        }

        self.api.base_url()?;
        Ok(())
    }
}
