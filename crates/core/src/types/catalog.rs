//! Catalog types as returned by the backend.
//!
//! Field names on the wire follow the backend contract (`ref`, `name`,
//! `price`, `parent`, `nomenclature`); the Rust side uses descriptive names
//! via serde renames.

use serde::{Deserialize, Serialize};

use super::cart::DEFAULT_VARIANT_LABEL;

/// A purchasable configuration of a product.
///
/// Immutable once fetched from the catalog. A product without explicit
/// variants is represented by a single variant with an empty `variant_ref`
/// and an empty `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVariant {
    /// Variant reference; empty string means "no variant".
    #[serde(rename = "ref")]
    pub variant_ref: String,
    /// Display name of the variant; empty string means the default label.
    #[serde(rename = "name")]
    pub label: String,
    /// Unit price in whole currency units, non-negative.
    #[serde(rename = "price")]
    pub unit_price: u64,
}

impl PriceVariant {
    /// The label shown to the user, falling back to the default when empty.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            DEFAULT_VARIANT_LABEL
        } else {
            &self.label
        }
    }
}

/// A folder node in the hierarchical catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(rename = "ref")]
    pub folder_ref: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// A product entry in a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "ref")]
    pub product_ref: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub name: String,
    /// Empty when the item is unavailable for purchase.
    #[serde(default, rename = "price")]
    pub variants: Vec<PriceVariant>,
}

/// A full product detail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(rename = "ref")]
    pub product_ref: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub name: String,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "price")]
    pub variants: Vec<PriceVariant>,
}

/// One level of the catalog tree: subfolders plus the products at this level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    #[serde(rename = "parent")]
    pub folders: Vec<Folder>,
    #[serde(rename = "nomenclature")]
    pub items: Vec<CatalogItem>,
}
