//! Session lifecycle: token custody and account-state tracking.
//!
//! The [`TokenVault`] owns the bearer token (in memory, mirrored to disk);
//! the [`SessionController`] owns the derived authorization state and maps
//! backend account-state signals onto it. No other component holds token
//! material.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;
use tracing::{debug, instrument, warn};

use kiosk_core::RegisterProfile;

use crate::api::{ApiError, BackendClient};
use crate::storage::Storage;

/// Persistence key for the bearer token.
const TOKEN_KEY: &str = "token";

// =============================================================================
// TokenVault
// =============================================================================

/// Shared custody of the bearer token.
///
/// Clone-cheap handle held by both the session controller (lifecycle) and
/// the backend client (attaching the header, storing refreshed tokens).
/// Persistence is best-effort: a failed disk write keeps the in-memory token
/// authoritative for the rest of the session.
#[derive(Clone)]
pub struct TokenVault {
    inner: Arc<VaultInner>,
}

struct VaultInner {
    token: RwLock<Option<SecretString>>,
    storage: Storage,
}

impl TokenVault {
    /// Create a vault, rehydrating a previously persisted token.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        let token = storage.get(TOKEN_KEY).map(SecretString::from);

        Self {
            inner: Arc::new(VaultInner {
                token: RwLock::new(token),
                storage,
            }),
        }
    }

    /// The currently held token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the held token and persist it.
    pub fn store(&self, token: &str) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(SecretString::from(token));

        if let Err(e) = self.inner.storage.put(TOKEN_KEY, token) {
            warn!(error = %e, "failed to persist token");
        }
    }

    /// Drop the held token and its persisted copy.
    pub fn clear(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.storage.remove(TOKEN_KEY);
    }
}

// =============================================================================
// AuthState
// =============================================================================

/// Account authorization state as last reported by the backend.
///
/// Carries no token material; the token lives in the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No authentication attempt made yet.
    Uninitialized,
    /// The account is registered and approved.
    Authorized,
    /// The backend signalled code 101: the account must register.
    RegistrationRequired,
    /// The backend signalled code 102: the account awaits moderation.
    ModerationPending,
    /// Authentication failed for a reason other than an account state.
    Unauthorized,
}

// =============================================================================
// SessionController
// =============================================================================

/// Owner of the session's authorization state.
///
/// All state transitions go through [`SessionController::check_auth`] and
/// [`SessionController::process_auth_error`]; views read the state and decide
/// which surface to present.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: RwLock<AuthState>,
    gateway: BackendClient,
    vault: TokenVault,
}

impl SessionController {
    #[must_use]
    pub fn new(gateway: BackendClient, vault: TokenVault) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(AuthState::Uninitialized),
                gateway,
                vault,
            }),
        }
    }

    /// Current authorization state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The currently held token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner.vault.token()
    }

    /// Attempt authentication and update the state from the outcome.
    ///
    /// Returns `true` when the session is authorized afterwards. Failures
    /// never propagate: they are folded into the state so views always have
    /// something definite to present.
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> bool {
        match self.inner.gateway.authenticate(false).await {
            Ok(_) => {
                self.set_state(AuthState::Authorized);
                true
            }
            Err(e) => {
                debug!(error = %e, "authentication did not authorize");
                self.process_auth_error(&e);
                false
            }
        }
    }

    /// Map a backend error onto the session state.
    ///
    /// Account-state signals (101/102) become their dedicated states; any
    /// other error means the session is simply not authorized.
    pub fn process_auth_error(&self, error: &ApiError) {
        let state = match error {
            ApiError::RegistrationRequired => AuthState::RegistrationRequired,
            ApiError::ModerationPending => AuthState::ModerationPending,
            _ => AuthState::Unauthorized,
        };
        self.set_state(state);
    }

    /// Submit a registration profile and re-check authorization.
    ///
    /// A moderation-pending signal from the backend counts as success: the
    /// account now exists, it is merely not approved yet. The follow-up
    /// `check_auth` lands the session in the state the backend actually
    /// reports.
    ///
    /// # Errors
    ///
    /// Returns the backend error for any rejection other than
    /// moderation-pending.
    #[instrument(skip(self, profile))]
    pub async fn register(&self, profile: &RegisterProfile) -> Result<(), ApiError> {
        match self.inner.gateway.register(profile).await {
            Ok(_) | Err(ApiError::ModerationPending) => {
                // Force a fresh exchange so the new account state is observed.
                self.inner.vault.clear();
                self.check_auth().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "registration rejected");
                Err(e)
            }
        }
    }

    fn set_state(&self, state: AuthState) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }
}
