//! Domain types for the catalog, cart, orders, and registration.

mod cart;
mod catalog;
mod email;
mod order;
mod phone;
mod profile;

pub use cart::{CartLine, DEFAULT_VARIANT_LABEL, LINE_ID_SEPARATOR, line_id};
pub use catalog::{CatalogItem, CatalogPage, Folder, ItemDetail, PriceVariant};
pub use email::{Email, EmailError};
pub use order::{DeliveryInfo, Fulfillment, FulfillmentMode, Order, OrderLine};
pub use phone::{PhoneError, PhoneNumber};
pub use profile::{ProfileError, RegisterProfile};
