//! Backend client implementation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use kiosk_core::{CatalogPage, ItemDetail, Order, RegisterProfile};

use crate::config::StorefrontConfig;
use crate::services::session::TokenVault;

use super::ApiError;
use super::types::{
    AuthResponse, CODE_MODERATION_PENDING, CODE_REGISTRATION_REQUIRED, CODE_TOKEN_EXPIRED,
    ErrorBody, OrderReceipt, RegisterReceipt,
};

/// Header carrying the bearer token.
///
/// A custom header rather than `Authorization`, so intermediary gateways that
/// rewrite the standard scheme leave it alone.
pub const TOKEN_HEADER: &str = "X-Auth-Token";

const CATALOG_CACHE_CAPACITY: u64 = 1000;
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Cached catalog responses.
#[derive(Clone)]
enum CacheValue {
    Page(CatalogPage),
    Detail(ItemDetail),
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the catalog/order backend.
///
/// Catalog reads are public (no token attached) and cached for 5 minutes.
/// Token-attached operations share a single bounded-retry policy: on an
/// expired-token signal the client re-authenticates once and replays the
/// request; a second expiry surfaces as [`ApiError::AuthFailed`].
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: String,
    init_data: SecretString,
    vault: TokenVault,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// The vault is shared with the session controller, which owns the token
    /// lifecycle; the client only reads it for request headers and writes it
    /// on successful authentication.
    #[must_use]
    pub fn new(config: &StorefrontConfig, vault: TokenVault) -> Self {
        let cache = Cache::builder()
            .max_capacity(CATALOG_CACHE_CAPACITY)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                http: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                init_data: config.init_data.clone(),
                vault,
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Obtain a bearer token, cache-first.
    ///
    /// With `force_refresh` false a held token is returned without a network
    /// call. Otherwise the platform init payload is exchanged for a fresh
    /// token, which is stored in the vault (and thereby persisted).
    ///
    /// # Errors
    ///
    /// Returns `RegistrationRequired`/`ModerationPending` when the backend
    /// signals those account states, `AuthFailed` for any other rejection,
    /// and `Transport` when the request cannot be sent.
    #[instrument(skip(self))]
    pub async fn authenticate(&self, force_refresh: bool) -> Result<SecretString, ApiError> {
        if !force_refresh && let Some(token) = self.inner.vault.token() {
            return Ok(token);
        }

        let response = self
            .inner
            .http
            .post(self.endpoint("/user/auth"))
            .json(&serde_json::json!({ "initData": self.inner.init_data.expose_secret() }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::OK {
            let parsed: AuthResponse = serde_json::from_str(&text)?;
            let token = parsed
                .token
                .ok_or_else(|| ApiError::AuthFailed("no token in auth response".to_string()))?;
            self.inner.vault.store(&token);
            debug!("authenticated, token stored");
            return Ok(SecretString::from(token));
        }

        let body = ErrorBody::decode(&text);
        warn!(status = %status, code = ?body.error_code, "authentication rejected");
        match classify_signal(status, &body) {
            Some(signal @ (ApiError::RegistrationRequired | ApiError::ModerationPending)) => {
                Err(signal)
            }
            _ => Err(ApiError::AuthFailed(body.message())),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Submit a registration profile.
    ///
    /// Profiles are validated at construction ([`RegisterProfile::from_form`]),
    /// so an invalid profile never reaches this call.
    ///
    /// # Errors
    ///
    /// Returns `ModerationPending` when the backend signals code 102 (the
    /// caller treats this as the account now existing), `RegistrationFailed`
    /// for any other rejection.
    #[instrument(skip(self, profile))]
    pub async fn register(&self, profile: &RegisterProfile) -> Result<RegisterReceipt, ApiError> {
        let url = self.endpoint("/user/register/");
        let text = self
            .send_authed(StatusCode::OK, || self.inner.http.post(&url).json(profile))
            .await
            .map_err(|e| match e {
                ApiError::RequestFailed { message, .. } => ApiError::RegistrationFailed(message),
                other => other,
            })?;

        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    // =========================================================================
    // Catalog (public reads, cached)
    // =========================================================================

    /// List one level of the catalog: subfolders and products.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on a non-success status, `Decode` if a
    /// success body is not valid JSON.
    #[instrument(skip(self))]
    pub async fn list_catalog(&self, parent_ref: Option<&str>) -> Result<CatalogPage, ApiError> {
        let cache_key = format!("list:{}", parent_ref.unwrap_or(""));

        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for catalog page");
            return Ok(page);
        }

        let mut url = self.endpoint("/catalog/get_nomenclature_list");
        if let Some(parent) = parent_ref {
            url.push_str("?parent_ref=");
            url.push_str(parent);
        }

        let text = self.send_public(url).await?;
        let page: CatalogPage = serde_json::from_str(&text)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(page.clone()))
            .await;

        Ok(page)
    }

    /// Fetch a product detail record.
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` on a non-success status, `Decode` if a
    /// success body is not valid JSON.
    #[instrument(skip(self), fields(product_ref = %product_ref))]
    pub async fn get_detail(&self, product_ref: &str) -> Result<ItemDetail, ApiError> {
        let cache_key = format!("detail:{product_ref}");

        if let Some(CacheValue::Detail(detail)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product detail");
            return Ok(detail);
        }

        let url = self.endpoint(&format!("/catalog/get_nomenclature_detail/{product_ref}"));
        let text = self.send_public(url).await?;
        let detail: ItemDetail = serde_json::from_str(&text)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Detail(detail.clone()))
            .await;

        Ok(detail)
    }

    /// URL of a product image; plain construction, no request.
    #[must_use]
    pub fn image_url(&self, product_ref: &str) -> String {
        self.endpoint(&format!("/catalog/get_nomenclature_img/{product_ref}"))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order. Success is 201 strictly; any other 2xx is a
    /// rejection.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationRequired`/`ModerationPending` on account-state
    /// signals, `AuthFailed` when the token refresh retry also expires, and
    /// `OrderRejected` for any other non-201 status.
    #[instrument(skip(self, order))]
    pub async fn create_order(&self, order: &Order) -> Result<OrderReceipt, ApiError> {
        let url = self.endpoint("/order/");
        let text = self
            .send_authed(StatusCode::CREATED, || self.inner.http.post(&url).json(order))
            .await
            .map_err(|e| match e {
                ApiError::RequestFailed { status, message } => {
                    ApiError::OrderRejected { status, message }
                }
                other => other,
            })?;

        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Send a public GET; no token, no retry.
    async fn send_public(&self, url: String) -> Result<String, ApiError> {
        let response = self.inner.http.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::OK {
            return Ok(text);
        }

        let body = ErrorBody::decode(&text);
        Err(ApiError::RequestFailed {
            status: status.as_u16(),
            message: body.message(),
        })
    }

    /// Send a token-attached request with the bounded retry policy.
    ///
    /// The request is rebuilt from `build` on each attempt so the replay
    /// carries the freshly stored token. At most one refresh-and-replay
    /// happens; a second expired-token signal becomes `AuthFailed`.
    async fn send_authed<F>(&self, expected: StatusCode, build: F) -> Result<String, ApiError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut refreshed = false;
        loop {
            let mut request = build();
            if let Some(token) = self.inner.vault.token() {
                request = request.header(TOKEN_HEADER, token.expose_secret());
            }

            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;

            if status == expected {
                return Ok(text);
            }

            let body = ErrorBody::decode(&text);
            match classify_signal(status, &body) {
                Some(ApiError::TokenExpired) => {
                    if refreshed {
                        warn!("token expired again after refresh");
                        return Err(ApiError::AuthFailed(
                            "token expired again after refresh".to_string(),
                        ));
                    }
                    refreshed = true;
                    debug!("token expired, re-authenticating and replaying once");
                    self.authenticate(true).await?;
                }
                Some(signal) => return Err(signal),
                None => {
                    return Err(ApiError::RequestFailed {
                        status: status.as_u16(),
                        message: body.message(),
                    });
                }
            }
        }
    }
}

/// Map an HTTP status plus backend code onto an account-state signal.
fn classify_signal(status: StatusCode, body: &ErrorBody) -> Option<ApiError> {
    match (status.as_u16(), body.error_code) {
        (401, Some(CODE_TOKEN_EXPIRED)) => Some(ApiError::TokenExpired),
        (403, Some(CODE_REGISTRATION_REQUIRED)) => Some(ApiError::RegistrationRequired),
        (403, Some(CODE_MODERATION_PENDING)) => Some(ApiError::ModerationPending),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        let config = StorefrontConfig::new(
            "https://api.example.com/",
            "init-data",
            std::env::temp_dir().join(format!("kiosk-client-{}", uuid::Uuid::new_v4())),
        )
        .unwrap();
        let storage = crate::storage::Storage::open(&config.storage_dir).unwrap();
        BackendClient::new(&config, TokenVault::new(storage))
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = client();
        assert_eq!(
            client.endpoint("/user/auth"),
            "https://api.example.com/user/auth"
        );
    }

    #[test]
    fn test_image_url() {
        let client = client();
        assert_eq!(
            client.image_url("p1"),
            "https://api.example.com/catalog/get_nomenclature_img/p1"
        );
    }

    #[test]
    fn test_classify_token_expired() {
        let body = ErrorBody::decode(r#"{"error_code": 100}"#);
        assert!(matches!(
            classify_signal(StatusCode::UNAUTHORIZED, &body),
            Some(ApiError::TokenExpired)
        ));
    }

    #[test]
    fn test_classify_account_states() {
        let registration = ErrorBody::decode(r#"{"error_code": 101}"#);
        assert!(matches!(
            classify_signal(StatusCode::FORBIDDEN, &registration),
            Some(ApiError::RegistrationRequired)
        ));

        let moderation = ErrorBody::decode(r#"{"error_code": 102}"#);
        assert!(matches!(
            classify_signal(StatusCode::FORBIDDEN, &moderation),
            Some(ApiError::ModerationPending)
        ));
    }

    #[test]
    fn test_classify_requires_matching_status() {
        // Code 100 on a 403 is not an expiry signal; codes only count on
        // their documented statuses.
        let body = ErrorBody::decode(r#"{"error_code": 100}"#);
        assert!(classify_signal(StatusCode::FORBIDDEN, &body).is_none());

        let no_code = ErrorBody::decode("{}");
        assert!(classify_signal(StatusCode::UNAUTHORIZED, &no_code).is_none());
    }
}
