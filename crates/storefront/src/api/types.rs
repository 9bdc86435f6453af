//! Wire types for auth, registration, and order responses.

use serde::Deserialize;

/// Backend code: the bearer token expired (sent with HTTP 401).
pub const CODE_TOKEN_EXPIRED: i32 = 100;
/// Backend code: the account must register (sent with HTTP 403).
pub const CODE_REGISTRATION_REQUIRED: i32 = 101;
/// Backend code: the account awaits moderation (sent with HTTP 403).
pub const CODE_MODERATION_PENDING: i32 = 102;

/// Error fields the backend may attach to a non-success response.
///
/// Defaults to empty so that non-JSON bodies decode without failing; code
/// inspection then simply finds nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Decode leniently: anything that is not valid JSON becomes an empty
    /// body.
    #[must_use]
    pub fn decode(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// The backend's message, or a placeholder when absent.
    #[must_use]
    pub fn message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Successful authentication response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Successful registration response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterReceipt {
    #[serde(default)]
    pub status: Option<String>,
}

/// Successful order-creation response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderReceipt {
    #[serde(default)]
    pub status: Option<String>,
}
