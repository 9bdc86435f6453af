//! Checkout orchestration: validation, the authorization gate, submission,
//! and the post-success reset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use kiosk_core::{Fulfillment, Order};

use crate::api::{ApiError, BackendClient};
use crate::cart::CartStore;
use crate::services::session::{AuthState, SessionController};

/// How long the success confirmation stays visible before the cart resets.
pub const DEFAULT_SUCCESS_DISPLAY: Duration = Duration::from_millis(2500);

/// Mutable checkout form state.
#[derive(Debug, Clone)]
pub struct OrderForm {
    pub comment: String,
    pub fulfillment: Fulfillment,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            comment: String::new(),
            fulfillment: Fulfillment::Pickup,
        }
    }
}

/// What a completed submission attempt means for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The order was accepted; the cart and form have been reset.
    Placed,
    /// The backend requires registration first; the cart is untouched.
    RegistrationPrompt,
    /// The account awaits moderation; the cart is untouched.
    ModerationNotice,
    /// The backend rejected the order; the cart is untouched.
    Rejected(String),
}

/// Errors that stop a submission before or instead of a backend verdict.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The form or cart failed local validation; no network call was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Authorization could not be established.
    #[error("not authorized")]
    Auth,

    /// A submission is already running.
    #[error("a submission is already in flight")]
    InFlight,
}

// =============================================================================
// CheckoutController
// =============================================================================

/// Drives the checkout flow end to end.
///
/// Holds the form state, enforces the single-submission gate, validates
/// before touching the network, and translates backend verdicts into
/// [`CheckoutOutcome`] values the presentation layer can act on directly.
#[derive(Clone)]
pub struct CheckoutController {
    inner: Arc<CheckoutInner>,
}

struct CheckoutInner {
    gateway: BackendClient,
    session: SessionController,
    cart: CartStore,
    form: RwLock<OrderForm>,
    in_flight: AtomicBool,
    success_display: Duration,
}

/// Releases the in-flight gate even when submission exits early.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutController {
    #[must_use]
    pub fn new(gateway: BackendClient, session: SessionController, cart: CartStore) -> Self {
        Self::with_success_display(gateway, session, cart, DEFAULT_SUCCESS_DISPLAY)
    }

    /// Like [`CheckoutController::new`] with an explicit success-display
    /// duration (tests pass zero to skip the visible delay).
    #[must_use]
    pub fn with_success_display(
        gateway: BackendClient,
        session: SessionController,
        cart: CartStore,
        success_display: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(CheckoutInner {
                gateway,
                session,
                cart,
                form: RwLock::new(OrderForm::default()),
                in_flight: AtomicBool::new(false),
                success_display,
            }),
        }
    }

    // =========================================================================
    // Form state
    // =========================================================================

    pub fn set_comment(&self, comment: impl Into<String>) {
        self.write_form().comment = comment.into();
    }

    pub fn set_fulfillment(&self, fulfillment: Fulfillment) {
        self.write_form().fulfillment = fulfillment;
    }

    /// Snapshot of the current form.
    #[must_use]
    pub fn form(&self) -> OrderForm {
        self.read_form().clone()
    }

    /// Whether a submission is currently running.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit the current cart as an order.
    ///
    /// Runs the full pipeline: in-flight gate, local validation,
    /// authorization gate, backend submission, and on acceptance the
    /// success display followed by cart and form reset. Account-state
    /// verdicts from the backend come back as `Ok` outcomes; only local
    /// failures are `Err`.
    ///
    /// # Errors
    ///
    /// Returns `InFlight` when another submission is running, `Validation`
    /// when the cart is empty or a delivery order lacks an address, and
    /// `Auth` when authorization cannot be established.
    #[instrument(skip(self))]
    pub async fn submit_order(&self) -> Result<CheckoutOutcome, CheckoutError> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CheckoutError::InFlight);
        }
        let _guard = InFlightGuard(&self.inner.in_flight);

        let form = self.form();
        self.validate(&form)?;

        // Authorization gate before any order traffic.
        if self.inner.session.state() != AuthState::Authorized
            && !self.inner.session.check_auth().await
        {
            return Err(CheckoutError::Auth);
        }

        let lines = self.inner.cart.lines();
        let order = Order::from_cart(&lines, &form.comment, &form.fulfillment);

        match self.inner.gateway.create_order(&order).await {
            Ok(_) => {
                debug!("order accepted");
                tokio::time::sleep(self.inner.success_display).await;
                self.inner.cart.clear();
                *self.write_form() = OrderForm::default();
                Ok(CheckoutOutcome::Placed)
            }
            Err(ApiError::RegistrationRequired) => {
                debug!("order blocked: registration required");
                Ok(CheckoutOutcome::RegistrationPrompt)
            }
            Err(ApiError::ModerationPending) => {
                debug!("order blocked: moderation pending");
                Ok(CheckoutOutcome::ModerationNotice)
            }
            Err(e) => {
                warn!(error = %e, "order rejected");
                Ok(CheckoutOutcome::Rejected(e.to_string()))
            }
        }
    }

    /// Acknowledge a [`CheckoutOutcome::RegistrationPrompt`]: flip the
    /// session into the registration-required state so the presentation
    /// layer shows the registration surface.
    pub fn confirm_registration_prompt(&self) {
        self.inner
            .session
            .process_auth_error(&ApiError::RegistrationRequired);
    }

    fn validate(&self, form: &OrderForm) -> Result<(), CheckoutError> {
        if self.inner.cart.is_empty() {
            return Err(CheckoutError::Validation("the cart is empty".to_string()));
        }
        if let Fulfillment::Delivery { address } = &form.fulfillment
            && address.trim().is_empty()
        {
            return Err(CheckoutError::Validation(
                "a delivery order needs an address".to_string(),
            ));
        }
        Ok(())
    }

    fn read_form(&self) -> std::sync::RwLockReadGuard<'_, OrderForm> {
        self.inner
            .form
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_form(&self) -> std::sync::RwLockWriteGuard<'_, OrderForm> {
        self.inner
            .form
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;
    use crate::services::session::TokenVault;
    use crate::storage::Storage;

    fn controller() -> CheckoutController {
        let dir = std::env::temp_dir().join(format!("kiosk-checkout-{}", uuid::Uuid::new_v4()));
        let storage = Storage::open(dir).unwrap();
        let config = StorefrontConfig::new(
            "https://api.example.com",
            "init-data",
            std::env::temp_dir(),
        )
        .unwrap();
        let vault = TokenVault::new(storage.clone());
        let gateway = BackendClient::new(&config, vault.clone());
        let session = SessionController::new(gateway.clone(), vault);
        let cart = CartStore::new(storage);
        CheckoutController::with_success_display(gateway, session, cart, Duration::ZERO)
    }

    #[test]
    fn test_form_defaults_to_pickup() {
        let checkout = controller();
        let form = checkout.form();
        assert!(form.comment.is_empty());
        assert_eq!(form.fulfillment, Fulfillment::Pickup);
    }

    #[test]
    fn test_form_updates() {
        let checkout = controller();
        checkout.set_comment("ring the bell");
        checkout.set_fulfillment(Fulfillment::Delivery {
            address: "Main St 1".to_string(),
        });

        let form = checkout.form();
        assert_eq!(form.comment, "ring the bell");
        assert_eq!(
            form.fulfillment,
            Fulfillment::Delivery {
                address: "Main St 1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_cart_fails_validation_without_network() {
        // The base URL is unroutable; reaching the network would error with
        // Transport, not Validation.
        let checkout = controller();
        let err = checkout.submit_order().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_delivery_address_fails_validation() {
        let checkout = controller();
        checkout.inner.cart.add(
            &kiosk_core::CatalogItem {
                product_ref: "p1".to_string(),
                parent: None,
                name: "Phone".to_string(),
                variants: vec![],
            },
            &kiosk_core::PriceVariant {
                variant_ref: "v1".to_string(),
                label: String::new(),
                unit_price: 800,
            },
        );
        checkout.set_fulfillment(Fulfillment::Delivery {
            address: "   ".to_string(),
        });

        let err = checkout.submit_order().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let flag = AtomicBool::new(true);
        {
            let _guard = InFlightGuard(&flag);
        }
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_confirm_registration_prompt_flips_session_state() {
        let checkout = controller();
        assert_eq!(checkout.inner.session.state(), AuthState::Uninitialized);

        checkout.confirm_registration_prompt();

        assert_eq!(
            checkout.inner.session.state(),
            AuthState::RegistrationRequired
        );
    }
}
