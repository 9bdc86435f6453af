//! Kiosk Core - Shared types library.
//!
//! This crate provides the domain types used across the Kiosk mini-app
//! storefront:
//! - `storefront` - the embedded storefront engine (gateway, session, cart,
//!   checkout)
//! - `integration-tests` - end-to-end tests against a mock backend
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Catalog, cart, order, and registration-profile types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
