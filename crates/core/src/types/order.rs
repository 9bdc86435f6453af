//! Outbound order payload.
//!
//! An order is constructed fresh from a cart snapshot at checkout time and
//! never mutated after submission. Wire field names (`nomenclature`,
//! `characteristic`, `count`) follow the backend contract.

use serde::{Deserialize, Serialize};

use super::cart::CartLine;

/// How the order is handed over to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fulfillment {
    Pickup,
    Delivery { address: String },
}

impl Fulfillment {
    /// The wire mode discriminator.
    #[must_use]
    pub const fn mode(&self) -> FulfillmentMode {
        match self {
            Self::Pickup => FulfillmentMode::Pickup,
            Self::Delivery { .. } => FulfillmentMode::Delivery,
        }
    }

    /// The delivery address, empty for pickup.
    #[must_use]
    pub fn address(&self) -> &str {
        match self {
            Self::Pickup => "",
            Self::Delivery { address } => address,
        }
    }
}

/// Wire discriminator for [`Fulfillment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentMode {
    Pickup,
    Delivery,
}

/// One order line, mirroring a cart line at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "nomenclature")]
    pub product_ref: String,
    #[serde(rename = "characteristic")]
    pub variant_ref: String,
    #[serde(rename = "count")]
    pub quantity: u32,
    #[serde(rename = "price")]
    pub unit_price: u64,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_ref: line.product_ref.clone(),
            variant_ref: line.variant_ref.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Delivery block of the order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    #[serde(rename = "type")]
    pub mode: FulfillmentMode,
    pub address: String,
}

/// The complete order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub items: Vec<OrderLine>,
    pub comment: String,
    pub delivery: DeliveryInfo,
}

impl Order {
    /// Build an order from a cart snapshot.
    ///
    /// The address is carried only for delivery orders; pickup orders send an
    /// empty address, matching the backend contract.
    #[must_use]
    pub fn from_cart(lines: &[CartLine], comment: &str, fulfillment: &Fulfillment) -> Self {
        Self {
            items: lines.iter().map(OrderLine::from).collect(),
            comment: comment.to_string(),
            delivery: DeliveryInfo {
                mode: fulfillment.mode(),
                address: fulfillment.address().to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_line() -> CartLine {
        CartLine {
            id: "p1_v1".to_string(),
            product_ref: "p1".to_string(),
            product_name: "Phone".to_string(),
            variant_ref: "v1".to_string(),
            variant_label: "Black".to_string(),
            unit_price: 800,
            quantity: 2,
        }
    }

    #[test]
    fn test_order_wire_field_names() {
        let order = Order::from_cart(&[sample_line()], "call first", &Fulfillment::Pickup);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["items"][0]["nomenclature"], "p1");
        assert_eq!(json["items"][0]["characteristic"], "v1");
        assert_eq!(json["items"][0]["count"], 2);
        assert_eq!(json["items"][0]["price"], 800);
        assert_eq!(json["comment"], "call first");
        assert_eq!(json["delivery"]["type"], "pickup");
        assert_eq!(json["delivery"]["address"], "");
    }

    #[test]
    fn test_delivery_order_carries_address() {
        let fulfillment = Fulfillment::Delivery {
            address: "1 Main St".to_string(),
        };
        let order = Order::from_cart(&[sample_line()], "", &fulfillment);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["delivery"]["type"], "delivery");
        assert_eq!(json["delivery"]["address"], "1 Main St");
    }

    #[test]
    fn test_pickup_sends_empty_address() {
        assert_eq!(Fulfillment::Pickup.address(), "");
        assert_eq!(Fulfillment::Pickup.mode(), FulfillmentMode::Pickup);
    }
}
