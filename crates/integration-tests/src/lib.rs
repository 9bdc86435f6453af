//! Integration test support for the Kiosk storefront engine.
//!
//! Provides an in-process mock backend (an `axum` server bound to an
//! ephemeral port) that speaks the real wire protocol: token issuance on
//! `/user/auth`, account-state signals as HTTP 401/403 with `error_code`
//! fields, strict 201 on order creation. Tests script the backend's
//! behavior per endpoint and assert on recorded call counts and the tokens
//! each request carried.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use kiosk_storefront::api::TOKEN_HEADER;
use kiosk_storefront::{
    BackendClient, CartStore, CheckoutController, SessionController, Storage, StorefrontConfig,
    TokenVault,
};

// =============================================================================
// Scripts
// =============================================================================

/// How the mock backend answers `/user/auth`.
#[derive(Debug, Clone)]
pub enum AuthScript {
    /// Issue `token-N` where N is the auth call count.
    Token,
    /// 403 with `error_code` 101.
    RegistrationRequired,
    /// 403 with `error_code` 102.
    ModerationPending,
    /// 401 with a plain error message.
    Reject,
}

/// How the mock backend answers `/order/`.
#[derive(Debug, Clone)]
pub enum OrderScript {
    /// 201 with a receipt body.
    Created,
    /// 401 with `error_code` 100 for the first `times` calls, then 201.
    ExpireFirst { times: usize },
    /// 403 with `error_code` 101.
    RegistrationRequired,
    /// 403 with `error_code` 102.
    ModerationPending,
    /// An arbitrary failure status and message.
    Reject { status: u16, message: String },
}

/// How the mock backend answers `/user/register/`.
#[derive(Debug, Clone)]
pub enum RegisterScript {
    /// 200 with a receipt body.
    Accepted,
    /// 403 with `error_code` 102.
    ModerationPending,
    /// 400 with a plain error message.
    Reject { message: String },
}

/// Full behavior script for one mock backend instance.
#[derive(Debug, Clone)]
pub struct BackendScript {
    pub auth: AuthScript,
    pub order: OrderScript,
    pub register: RegisterScript,
    /// Artificial latency on `/order/` (used to hold a submission in flight).
    pub order_delay: Duration,
}

impl Default for BackendScript {
    fn default() -> Self {
        Self {
            auth: AuthScript::Token,
            order: OrderScript::Created,
            register: RegisterScript::Accepted,
            order_delay: Duration::ZERO,
        }
    }
}

// =============================================================================
// Mock backend
// =============================================================================

/// Recorded traffic plus the script driving responses.
pub struct MockState {
    script: BackendScript,
    pub auth_calls: AtomicUsize,
    pub order_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub catalog_calls: AtomicUsize,
    /// The `X-Auth-Token` value each `/order/` request carried, in order.
    pub order_tokens: Mutex<Vec<Option<String>>>,
}

impl MockState {
    fn new(script: BackendScript) -> Self {
        Self {
            script,
            auth_calls: AtomicUsize::new(0),
            order_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            catalog_calls: AtomicUsize::new(0),
            order_tokens: Mutex::new(Vec::new()),
        }
    }

    /// Tokens seen on `/order/` requests so far.
    pub fn recorded_order_tokens(&self) -> Vec<Option<String>> {
        self.order_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A scripted backend listening on an ephemeral local port.
pub struct MockBackend {
    pub state: Arc<MockState>,
    pub base_url: String,
}

impl MockBackend {
    /// Bind, spawn, and return once the server is accepting connections.
    pub async fn start(script: BackendScript) -> Self {
        let state = Arc::new(MockState::new(script));

        let app = Router::new()
            .route("/user/auth", post(handle_auth))
            .route("/user/register/", post(handle_register))
            .route("/order/", post(handle_order))
            .route("/catalog/get_nomenclature_list", get(handle_list))
            .route(
                "/catalog/get_nomenclature_detail/{product_ref}",
                get(handle_detail),
            )
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock backend");
        let addr = listener.local_addr().expect("mock backend has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("mock backend exited");
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }
}

fn signal(status: StatusCode, code: i32, message: &str) -> Response {
    (
        status,
        Json(json!({ "error_code": code, "error": message })),
    )
        .into_response()
}

async fn handle_auth(State(state): State<Arc<MockState>>) -> Response {
    let n = state.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
    match &state.script.auth {
        AuthScript::Token => Json(json!({ "token": format!("token-{n}") })).into_response(),
        AuthScript::RegistrationRequired => {
            signal(StatusCode::FORBIDDEN, 101, "registration required")
        }
        AuthScript::ModerationPending => signal(StatusCode::FORBIDDEN, 102, "pending moderation"),
        AuthScript::Reject => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid init data" })),
        )
            .into_response(),
    }
}

async fn handle_register(State(state): State<Arc<MockState>>) -> Response {
    state.register_calls.fetch_add(1, Ordering::SeqCst);
    match &state.script.register {
        RegisterScript::Accepted => Json(json!({ "status": "registered" })).into_response(),
        RegisterScript::ModerationPending => {
            signal(StatusCode::FORBIDDEN, 102, "pending moderation")
        }
        RegisterScript::Reject { message } => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message })),
        )
            .into_response(),
    }
}

async fn handle_order(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let n = state.order_calls.fetch_add(1, Ordering::SeqCst) + 1;

    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .order_tokens
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(token);

    if !state.script.order_delay.is_zero() {
        tokio::time::sleep(state.script.order_delay).await;
    }

    match &state.script.order {
        OrderScript::Created => {
            (StatusCode::CREATED, Json(json!({ "status": "created" }))).into_response()
        }
        OrderScript::ExpireFirst { times } => {
            if n <= *times {
                signal(StatusCode::UNAUTHORIZED, 100, "token expired")
            } else {
                (StatusCode::CREATED, Json(json!({ "status": "created" }))).into_response()
            }
        }
        OrderScript::RegistrationRequired => {
            signal(StatusCode::FORBIDDEN, 101, "registration required")
        }
        OrderScript::ModerationPending => signal(StatusCode::FORBIDDEN, 102, "pending moderation"),
        OrderScript::Reject { status, message } => (
            StatusCode::from_u16(*status).expect("scripted status is valid"),
            Json(json!({ "error": message })),
        )
            .into_response(),
    }
}

async fn handle_list(State(state): State<Arc<MockState>>) -> Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "parent": [
            { "ref": "f1", "name": "Phones" }
        ],
        "nomenclature": [
            {
                "ref": "p1",
                "name": "Phone",
                "price": [
                    { "ref": "v1", "name": "64 GB", "price": 800 },
                    { "ref": "v2", "name": "128 GB", "price": 900 }
                ]
            }
        ]
    }))
    .into_response()
}

async fn handle_detail(
    State(state): State<Arc<MockState>>,
    Path(product_ref): Path<String>,
) -> Response {
    state.catalog_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "ref": product_ref,
        "name": "Phone",
        "description": "A phone.",
        "price": [
            { "ref": "v1", "name": "64 GB", "price": 800 }
        ]
    }))
    .into_response()
}

// =============================================================================
// Test harness
// =============================================================================

/// A fully wired storefront engine pointed at a scripted mock backend.
pub struct TestHarness {
    pub backend: MockBackend,
    pub storage: Storage,
    pub vault: TokenVault,
    pub gateway: BackendClient,
    pub session: SessionController,
    pub cart: CartStore,
    pub checkout: CheckoutController,
}

impl TestHarness {
    /// Start a mock backend and wire the full component graph against it,
    /// with the success-display delay zeroed out.
    pub async fn start(script: BackendScript) -> Self {
        // One global subscriber per test binary; later calls are no-ops.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let backend = MockBackend::start(script).await;

        let storage_dir =
            std::env::temp_dir().join(format!("kiosk-it-{}", uuid::Uuid::new_v4()));
        let config = StorefrontConfig::new(&backend.base_url, "test-init-data", storage_dir)
            .expect("valid test config");

        let storage = Storage::open(&config.storage_dir).expect("storage dir");
        let vault = TokenVault::new(storage.clone());
        let gateway = BackendClient::new(&config, vault.clone());
        let session = SessionController::new(gateway.clone(), vault.clone());
        let cart = CartStore::new(storage.clone());
        let checkout = CheckoutController::with_success_display(
            gateway.clone(),
            session.clone(),
            cart.clone(),
            Duration::ZERO,
        );

        Self {
            backend,
            storage,
            vault,
            gateway,
            session,
            cart,
            checkout,
        }
    }

    /// A catalog item matching the mock backend's list response.
    pub fn sample_item() -> (kiosk_core::CatalogItem, kiosk_core::PriceVariant) {
        let variant = kiosk_core::PriceVariant {
            variant_ref: "v1".to_string(),
            label: "64 GB".to_string(),
            unit_price: 800,
        };
        let item = kiosk_core::CatalogItem {
            product_ref: "p1".to_string(),
            parent: None,
            name: "Phone".to_string(),
            variants: vec![variant.clone()],
        };
        (item, variant)
    }
}
