//! Session and checkout services built on top of the backend client.

pub mod checkout;
pub mod session;
