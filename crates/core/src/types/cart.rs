//! Cart snapshots. The commerce backend is the only source of truth; these are
//! never cached between events.

use serde::{Deserialize, Serialize};

use super::id::CartItemId;

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart line id (what `remove` takes), not the product id.
    pub id: CartItemId,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    /// Tax-inclusive price per kilogram, formatted by the backend.
    pub unit_price: String,
    /// Tax-inclusive line total, formatted by the backend.
    pub line_total: String,
}

/// A cart's lines in backend order plus the formatted grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: String,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
