//! HTTP client for the catalog/order backend.
//!
//! # Architecture
//!
//! - `reqwest` for HTTP with JSON bodies
//! - Lenient response decoding: non-JSON bodies decode to an empty error
//!   structure so error-code inspection never itself fails
//! - Exactly one retry, only on an expired-token signal, implemented as an
//!   explicit bounded loop
//! - Public catalog reads cached in-memory via `moka` (5 minute TTL)
//!
//! # Backend signals
//!
//! The backend distinguishes account states from request failures through
//! error codes: 100 (token expired, HTTP 401), 101 (registration required,
//! HTTP 403), 102 (moderation pending, HTTP 403). These are decoded into
//! dedicated [`ApiError`] variants so callers pattern-match instead of
//! probing untyped code fields.

mod client;
mod types;

pub use client::{BackendClient, TOKEN_HEADER};
pub use types::{
    AuthResponse, CODE_MODERATION_PENDING, CODE_REGISTRATION_REQUIRED, CODE_TOKEN_EXPIRED,
    ErrorBody, OrderReceipt, RegisterReceipt,
};

use kiosk_core::ProfileError;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network unreachable or the request could not be sent.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response carried an undecodable body.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Authentication was rejected or a token refresh did not stick.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The bearer token expired (backend code 100). Absorbed by the
    /// gateway's single retry; callers only see it re-mapped to
    /// [`ApiError::AuthFailed`] when the retry also expires.
    #[error("token expired")]
    TokenExpired,

    /// The account must complete registration (backend code 101).
    #[error("registration required")]
    RegistrationRequired,

    /// The account is awaiting moderation (backend code 102).
    #[error("account pending moderation")]
    ModerationPending,

    /// Client-side validation failed; no network call was made.
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ProfileError),

    /// The backend rejected a registration submission.
    #[error("registration rejected: {0}")]
    RegistrationFailed(String),

    /// The backend rejected an order submission.
    #[error("order rejected (status {status}): {message}")]
    OrderRejected { status: u16, message: String },

    /// A read request failed with a non-success status.
    #[error("request failed (status {status}): {message}")]
    RequestFailed { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::OrderRejected {
            status: 500,
            message: "out of stock".to_string(),
        };
        assert_eq!(err.to_string(), "order rejected (status 500): out of stock");

        let err = ApiError::AuthFailed("bad init data".to_string());
        assert_eq!(err.to_string(), "authentication failed: bad init data");
    }
}
