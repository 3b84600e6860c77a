//! Lead client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `NEXDOOR_API_URL` - Base URL of the lead service (default: `https://my-worker.nexdoor-ai.workers.dev`)
//! - `NEXDOOR_SESSION_FILE` - Where the signed-in session is kept (default: `.nexdoor/session.json`)
//! - `NEXDOOR_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://my-worker.nexdoor-ai.workers.dev";
const DEFAULT_SESSION_FILE: &str = ".nexdoor/session.json";
const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Lead client configuration.
#[derive(Debug, Clone)]
pub struct LeadsConfig {
    /// Base URL of the lead service
    pub api_url: Url,
    /// File holding the persisted session (`user`, `currentPage`)
    pub session_file: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Duration,
}

impl LeadsConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = get_or_default(&lookup, "NEXDOOR_API_URL", DEFAULT_API_URL);
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("NEXDOOR_API_URL".to_string(), e.to_string()))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "NEXDOOR_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let session_file = PathBuf::from(get_or_default(
            &lookup,
            "NEXDOOR_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));

        let timeout_secs = get_or_default(&lookup, "NEXDOOR_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("NEXDOOR_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "NEXDOOR_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            session_file,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
pub fn get_required<F>(lookup: F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a variable with a default value. Blank values count as unset.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
