//! Catalog snapshots as the bot displays them.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::id::{FileId, ProductId};

/// Entry of the startup catalog, used to build the menu keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
}

/// Full product detail, fetched every time a product card is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Tax-inclusive price per kilogram, already formatted by the backend.
    pub price: String,
    /// Stock level in kilograms.
    pub stock_level: i64,
    /// Main image, if the product has one.
    pub main_image: Option<FileId>,
}

/// Rejected zero quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("quantity must be a positive integer")]
pub struct QuantityError;

/// Number of kilograms to add to a cart. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// Quantities offered on every product card.
    pub const OPTIONS: [u32; 3] = [1, 5, 10];

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError`] for zero.
    pub fn new(kg: u32) -> Result<Self, QuantityError> {
        NonZeroU32::new(kg).map(Self).ok_or(QuantityError)
    }

    /// Number of kilograms.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_rejects_zero() {
        assert_eq!(Quantity::new(0), Err(QuantityError));
    }

    #[test]
    fn test_quantity_options_are_valid() {
        for kg in Quantity::OPTIONS {
            assert_eq!(Quantity::new(kg).unwrap().get(), kg);
        }
    }
}
