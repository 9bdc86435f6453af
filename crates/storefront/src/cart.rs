//! The cart store: composite-key line items with synchronous persistence.
//!
//! Lines are keyed by product+variant identity; adding the same combination
//! twice merges into one line. A line whose quantity would drop to zero or
//! below is removed, never kept at zero. Derived totals are recomputed on
//! every read so views cannot drift from the line collection.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use kiosk_core::{CartLine, CatalogItem, PriceVariant, line_id};

use crate::storage::Storage;

/// Persistence key for the serialized line collection.
pub const CART_KEY: &str = "cart";

/// Owner of the cart line collection.
///
/// Clone-cheap shared handle; all mutation goes through these operations and
/// every mutation persists the full collection before returning. Views read
/// snapshots via [`CartStore::lines`] and the derived accessors.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    lines: RwLock<Vec<CartLine>>,
    storage: Storage,
}

impl CartStore {
    /// Create a store, rehydrating any persisted cart.
    ///
    /// Corrupt or missing persisted data falls back to an empty cart.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        let lines = storage
            .get(CART_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Self {
            inner: Arc::new(CartStoreInner {
                lines: RwLock::new(lines),
                storage,
            }),
        }
    }

    /// Add one unit of a product+variant combination.
    ///
    /// Merges into an existing line for the same identity, otherwise inserts
    /// a fresh line with quantity 1.
    pub fn add(&self, item: &CatalogItem, variant: &PriceVariant) {
        let id = line_id(&item.product_ref, &variant.variant_ref);
        let mut lines = self.write_lines();

        if let Some(line) = lines.iter_mut().find(|line| line.id == id) {
            line.quantity += 1;
        } else {
            lines.push(CartLine::new(item, variant));
        }

        self.persist(&lines);
    }

    /// Delete a line unconditionally.
    pub fn remove(&self, id: &str) {
        let mut lines = self.write_lines();
        lines.retain(|line| line.id != id);
        self.persist(&lines);
    }

    /// Apply a quantity delta; a resulting quantity of zero or below removes
    /// the line.
    pub fn update_quantity(&self, id: &str, delta: i64) {
        let mut lines = self.write_lines();

        for line in lines.iter_mut() {
            if line.id == id {
                let updated = i64::from(line.quantity) + delta;
                line.quantity = u32::try_from(updated.max(0)).unwrap_or(u32::MAX);
            }
        }
        lines.retain(|line| line.quantity > 0);

        self.persist(&lines);
    }

    /// Set a line's quantity absolutely; zero or below removes the line.
    pub fn set_quantity(&self, id: &str, count: i64) {
        let mut lines = self.write_lines();

        if count <= 0 {
            lines.retain(|line| line.id != id);
        } else if let Some(line) = lines.iter_mut().find(|line| line.id == id) {
            line.quantity = u32::try_from(count).unwrap_or(u32::MAX);
        }

        self.persist(&lines);
    }

    /// Empty the cart (used after checkout success).
    pub fn clear(&self) {
        let mut lines = self.write_lines();
        lines.clear();
        self.persist(&lines);
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.read_lines().clone()
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.read_lines().iter().map(CartLine::subtotal).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.read_lines()
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_lines().is_empty()
    }

    fn read_lines(&self) -> std::sync::RwLockReadGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lines(&self) -> std::sync::RwLockWriteGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist the full collection; best-effort, a failed write keeps the
    /// in-memory cart authoritative.
    fn persist(&self, lines: &[CartLine]) {
        match serde_json::to_string(lines) {
            Ok(serialized) => {
                if let Err(e) = self.inner.storage.put(CART_KEY, &serialized) {
                    warn!(error = %e, "failed to persist cart");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize cart"),
        }
    }
}
