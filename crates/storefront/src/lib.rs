//! Kiosk Storefront - cart/session engine for a chat-platform mini-app shop.
//!
//! # Architecture
//!
//! - [`api`] - HTTP client for the catalog/order backend with uniform error
//!   decoding and a one-shot retry on expired tokens
//! - [`services::session`] - authorization state machine and token ownership
//! - [`cart`] - the cart store: composite-key line items, derived totals,
//!   synchronous persistence
//! - [`services::checkout`] - the place-order workflow composing the three
//!   components above
//! - [`state`] - wiring, the top-level presentation gate, and the
//!   view-relevance guard for stale fetch results
//!
//! The embedding shell renders views over this engine; views read snapshots
//! and derived values and issue mutation commands, never reaching into
//! component storage directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod services;
pub mod state;
pub mod storage;

pub use api::{ApiError, BackendClient};
pub use cart::CartStore;
pub use config::{ConfigError, StorefrontConfig};
pub use services::checkout::{CheckoutController, CheckoutError, CheckoutOutcome, OrderForm};
pub use services::session::{AuthState, SessionController, TokenVault};
pub use state::{AppState, Presentation, ViewTicket};
pub use storage::{Storage, StorageError};
