//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `BOUTIQUE_API_BASE` - Backend base URL (default: `http://localhost:8000`)
//! - `BOUTIQUE_DATA_DIR` - Directory for device-local state: token and
//!   anonymous cart (default: `.boutique`)
//! - `BOUTIQUE_PROFILE_PATH` - Current-profile endpoint (default: `/auth/me`;
//!   some backend builds expose it as `/me`)
//! - `BOUTIQUE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `BOUTIQUE_CATALOG_CACHE_SECS` - Product catalog cache TTL, 0 disables
//!   (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN (used by the CLI)
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE: &str = "http://localhost:8000";
const DEFAULT_DATA_DIR: &str = ".boutique";
const DEFAULT_PROFILE_PATH: &str = "/auth/me";
const DEFAULT_CATALOG_CACHE_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL every API path is appended to
    pub api_base: Url,
    /// Directory holding device-local persisted state
    pub data_dir: PathBuf,
    /// Path of the current-profile endpoint
    pub profile_path: String,
    /// Optional per-request timeout applied to the HTTP client
    pub http_timeout: Option<Duration>,
    /// How long product listings are cached; zero disables caching
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Configuration for the given backend with every other setting at its
    /// default.
    #[must_use]
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            profile_path: DEFAULT_PROFILE_PATH.to_string(),
            http_timeout: None,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base = get("BOUTIQUE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(&api_base)
            .map_err(|e| ConfigError::InvalidEnvVar("BOUTIQUE_API_BASE".to_string(), e.to_string()))?;
        if !matches!(api_base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "BOUTIQUE_API_BASE".to_string(),
                format!("unsupported scheme '{}'", api_base.scheme()),
            ));
        }

        let profile_path =
            get("BOUTIQUE_PROFILE_PATH").unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string());
        if !profile_path.starts_with('/') {
            return Err(ConfigError::InvalidEnvVar(
                "BOUTIQUE_PROFILE_PATH".to_string(),
                "must start with '/'".to_string(),
            ));
        }

        let http_timeout = get("BOUTIQUE_HTTP_TIMEOUT_SECS")
            .map(|value| parse_secs("BOUTIQUE_HTTP_TIMEOUT_SECS", &value))
            .transpose()?;
        let catalog_cache_ttl = get("BOUTIQUE_CATALOG_CACHE_SECS")
            .map(|value| parse_secs("BOUTIQUE_CATALOG_CACHE_SECS", &value))
            .transpose()?
            .unwrap_or(Duration::from_secs(DEFAULT_CATALOG_CACHE_SECS));

        Ok(Self {
            api_base,
            data_dir: get("BOUTIQUE_DATA_DIR").map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            profile_path,
            http_timeout,
            catalog_cache_ttl,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Same configuration with another profile endpoint path.
    #[must_use]
    pub fn with_profile_path(mut self, profile_path: impl Into<String>) -> Self {
        self.profile_path = profile_path.into();
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a whole number of seconds.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
