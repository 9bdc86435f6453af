//! Application state: wiring of the storefront components plus the
//! presentation decision derived from the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::BackendClient;
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::services::checkout::CheckoutController;
use crate::services::session::{AuthState, SessionController, TokenVault};
use crate::storage::{Storage, StorageError};

/// Which top-level surface the session state calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Normal browsing and checkout.
    Catalog,
    /// The registration form replaces everything else.
    RegistrationGate,
    /// A moderation-pending notice replaces everything else.
    ModerationNotice,
}

/// Shared application state.
///
/// Clone-cheap handle wiring storage, the backend client, the session, the
/// cart, and the checkout controller together. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    gateway: BackendClient,
    session: SessionController,
    cart: CartStore,
    checkout: CheckoutController,
    view_epoch: Arc<AtomicU64>,
}

impl AppState {
    /// Wire up the full component graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created.
    pub fn new(config: StorefrontConfig) -> Result<Self, StorageError> {
        let storage = Storage::open(&config.storage_dir)?;
        let vault = TokenVault::new(storage.clone());
        let gateway = BackendClient::new(&config, vault.clone());
        let session = SessionController::new(gateway.clone(), vault);
        let cart = CartStore::new(storage);
        let checkout = CheckoutController::new(gateway.clone(), session.clone(), cart.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                session,
                cart,
                checkout,
                view_epoch: Arc::new(AtomicU64::new(0)),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn gateway(&self) -> &BackendClient {
        &self.inner.gateway
    }

    #[must_use]
    pub fn session(&self) -> &SessionController {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutController {
        &self.inner.checkout
    }

    /// Which surface the current session state calls for.
    ///
    /// The account-state gates win over everything; any other state shows
    /// the catalog (browsing stays available to unauthorized sessions).
    #[must_use]
    pub fn presentation(&self) -> Presentation {
        match self.inner.session.state() {
            AuthState::RegistrationRequired => Presentation::RegistrationGate,
            AuthState::ModerationPending => Presentation::ModerationNotice,
            AuthState::Uninitialized | AuthState::Authorized | AuthState::Unauthorized => {
                Presentation::Catalog
            }
        }
    }

    /// Start a new view, invalidating tickets from earlier views.
    ///
    /// In-flight loads hold a ticket and check it before applying their
    /// result, so a stale catalog response cannot overwrite a newer view.
    #[must_use]
    pub fn enter_view(&self) -> ViewTicket {
        let issued = self.inner.view_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        ViewTicket {
            epoch: Arc::clone(&self.inner.view_epoch),
            issued,
        }
    }
}

/// Proof that a load belongs to the view that started it.
#[derive(Debug, Clone)]
pub struct ViewTicket {
    epoch: Arc<AtomicU64>,
    issued: u64,
}

impl ViewTicket {
    /// Whether no newer view has started since this ticket was issued.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.epoch.load(Ordering::Acquire) == self.issued
    }
}
