//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KIOSK_BASE_URL` - Base URL of the catalog/order backend
//! - `KIOSK_INIT_DATA` - Platform-supplied init payload used to authenticate
//!
//! ## Optional
//! - `KIOSK_STORAGE_DIR` - Directory for persisted cart/token state
//!   (default: `.kiosk`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_STORAGE_DIR: &str = ".kiosk";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront engine configuration.
///
/// Implements `Debug` manually to redact the init payload, which carries the
/// platform user's signed identity.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, normalized without a trailing slash.
    pub base_url: String,
    /// Platform-supplied init payload exchanged for a bearer token.
    pub init_data: SecretString,
    /// Directory holding the persisted cart and token.
    pub storage_dir: PathBuf,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("base_url", &self.base_url)
            .field("init_data", &"[REDACTED]")
            .field("storage_dir", &self.storage_dir)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or the base
    /// URL does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = normalize_base_url("KIOSK_BASE_URL", &get_required_env("KIOSK_BASE_URL")?)?;
        let init_data = SecretString::from(get_required_env("KIOSK_INIT_DATA")?);
        let storage_dir =
            PathBuf::from(get_env_or_default("KIOSK_STORAGE_DIR", DEFAULT_STORAGE_DIR));

        Ok(Self {
            base_url,
            init_data,
            storage_dir,
        })
    }

    /// Build a configuration directly, normalizing the base URL.
    ///
    /// Used by embedders that receive the init payload from the platform
    /// shell at runtime rather than from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL does not parse.
    pub fn new(
        base_url: &str,
        init_data: impl Into<SecretString>,
        storage_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url("base_url", base_url)?,
            init_data: init_data.into(),
            storage_dir: storage_dir.into(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate a base URL and strip any trailing slash.
fn normalize_base_url(name: &str, raw: &str) -> Result<String, ConfigError> {
    url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_slash() {
        let url = normalize_base_url("test", "https://api.example.com/").unwrap();
        assert_eq!(url, "https://api.example.com");
    }

    #[test]
    fn test_normalize_keeps_clean_url() {
        let url = normalize_base_url("test", "https://api.example.com/v1").unwrap();
        assert_eq!(url, "https://api.example.com/v1");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let result = normalize_base_url("test", "not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_debug_redacts_init_data() {
        let config =
            StorefrontConfig::new("https://api.example.com", "signed-user-payload", ".kiosk")
                .unwrap();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("api.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("signed-user-payload"));
    }
}
