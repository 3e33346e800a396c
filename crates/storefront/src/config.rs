//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MOTOPARTS_API_URL` - Base URL of the storefront REST API
//!
//! ## Optional
//! - `MOTOPARTS_TOKEN_FILE` - Where the bearer token is persisted (default: `.motoparts/token`)
//! - `MOTOPARTS_USER_AGENT` - User agent sent with every request
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_TOKEN_FILE: &str = ".motoparts/token";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote API settings
    pub api: ApiConfig,
    /// File holding the persisted bearer token
    pub token_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Remote REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint is resolved against
    pub base_url: Url,
    /// User agent header value
    pub user_agent: String,
}

impl ApiConfig {
    /// Build an API configuration for a base URL with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("MOTOPARTS_API_URL", base_url)?,
            user_agent: default_user_agent(),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let raw_url = get_required_env("MOTOPARTS_API_URL")?;
        let api = ApiConfig {
            base_url: parse_base_url("MOTOPARTS_API_URL", &raw_url)?,
            user_agent: get_optional_env("MOTOPARTS_USER_AGENT")
                .unwrap_or_else(default_user_agent),
        };
        let token_file = PathBuf::from(get_env_or_default("MOTOPARTS_TOKEN_FILE", DEFAULT_TOKEN_FILE));
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api,
            token_file,
            sentry_dsn,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_user_agent() -> String {
    format!("motoparts-storefront/{}", env!("CARGO_PKG_VERSION"))
}

/// Parse and validate the API base URL.
///
/// A trailing slash is enforced so relative endpoints join under the base
/// path instead of replacing its last segment.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let normalised = format!("{}/", raw.trim().trim_end_matches('/'));
    let url = Url::parse(&normalised)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("TEST", "https://api.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn test_parse_base_url_collapses_slashes() {
        let url = parse_base_url("TEST", "http://localhost:5000/api///").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
    }

    #[test]
    fn test_parse_base_url_rejects_scheme() {
        let err = parse_base_url("TEST", "ftp://files.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("TEST", "not a url").is_err());
    }

    #[test]
    fn test_api_config_default_user_agent() {
        let config = ApiConfig::new("http://localhost:5000").unwrap();
        assert!(config.user_agent.starts_with("motoparts-storefront/"));
    }
}
