//! Cart line items and their composite-key identity.

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogItem, PriceVariant};

/// Separator between product and variant refs in a line id.
pub const LINE_ID_SEPARATOR: char = '_';

/// Label used when a variant has no display name of its own.
pub const DEFAULT_VARIANT_LABEL: &str = "Standard";

/// Compute the identity of a cart line from its product and variant refs.
///
/// Two additions of the same product+variant combination must merge into one
/// line, so the id is deterministic: `{product_ref}_{variant_ref}`.
#[must_use]
pub fn line_id(product_ref: &str, variant_ref: &str) -> String {
    format!("{product_ref}{LINE_ID_SEPARATOR}{variant_ref}")
}

/// One entry in the shopping cart.
///
/// A line with `quantity == 0` must never exist in a cart; the store removes
/// the line instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Composite identity, see [`line_id`].
    pub id: String,
    pub product_ref: String,
    pub product_name: String,
    /// Empty string when the product has no variant.
    pub variant_ref: String,
    pub variant_label: String,
    /// Unit price in whole currency units.
    pub unit_price: u64,
    pub quantity: u32,
}

impl CartLine {
    /// Create a fresh line (quantity 1) for a product + variant combination.
    #[must_use]
    pub fn new(item: &CatalogItem, variant: &PriceVariant) -> Self {
        Self {
            id: line_id(&item.product_ref, &variant.variant_ref),
            product_ref: item.product_ref.clone(),
            product_name: item.name.clone(),
            variant_ref: variant.variant_ref.clone(),
            variant_label: variant.display_label().to_string(),
            unit_price: variant.unit_price,
            quantity: 1,
        }
    }

    /// Line subtotal: unit price times quantity.
    #[must_use]
    pub const fn subtotal(&self) -> u64 {
        self.unit_price * self.quantity as u64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item() -> CatalogItem {
        CatalogItem {
            product_ref: "p1".to_string(),
            parent: None,
            name: "Phone".to_string(),
            variants: vec![],
        }
    }

    #[test]
    fn test_line_id_composition() {
        assert_eq!(line_id("p1", "v1"), "p1_v1");
        assert_eq!(line_id("p1", ""), "p1_");
    }

    #[test]
    fn test_new_line_captures_default_label() {
        let variant = PriceVariant {
            variant_ref: String::new(),
            label: String::new(),
            unit_price: 800,
        };
        let line = CartLine::new(&item(), &variant);
        assert_eq!(line.id, "p1_");
        assert_eq!(line.variant_label, "Standard");
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn test_subtotal() {
        let variant = PriceVariant {
            variant_ref: "v1".to_string(),
            label: "Black".to_string(),
            unit_price: 800,
        };
        let mut line = CartLine::new(&item(), &variant);
        line.quantity = 3;
        assert_eq!(line.subtotal(), 2400);
    }

    #[test]
    fn test_serde_roundtrip() {
        let variant = PriceVariant {
            variant_ref: "v1".to_string(),
            label: "Black".to_string(),
            unit_price: 800,
        };
        let line = CartLine::new(&item(), &variant);
        let json = serde_json::to_string(&line).unwrap();
        let back: CartLine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, line);
    }
}
