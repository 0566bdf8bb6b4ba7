//! The startup catalog and the menu keyboard built from it.

use storebot_core::{ProductId, ProductSummary};

use super::action::Callback;
use crate::chat::{Button, Keyboard};
use crate::commerce::{Commerce, CommerceError};

/// Product name→id table, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<ProductSummary>,
    menu: Keyboard,
}

impl Catalog {
    /// Build the catalog and its menu keyboard.
    ///
    /// Products whose id can't be encoded into a button are left out of the
    /// menu with a warning.
    #[must_use]
    pub fn new(products: Vec<ProductSummary>) -> Self {
        let products: Vec<ProductSummary> = products
            .into_iter()
            .filter(|product| {
                let fits = Callback::Product(product.id.clone()).fits();
                if !fits {
                    tracing::warn!(
                        product = %product.id,
                        name = %product.name,
                        "Product id too long for a button, skipping"
                    );
                }
                fits
            })
            .collect();

        let menu = products
            .iter()
            .fold(Keyboard::default(), |keyboard, product| {
                keyboard.button(Button::new(
                    product.name.clone(),
                    Callback::Product(product.id.clone()).to_string(),
                ))
            })
            .button(Button::new("Shopping cart", Callback::Cart.to_string()));

        Self { products, menu }
    }

    /// Fetch the catalog from the commerce backend.
    ///
    /// # Errors
    ///
    /// Returns the commerce error if the product list can't be fetched.
    pub async fn load(commerce: &impl Commerce) -> Result<Self, CommerceError> {
        let products = commerce.list_products().await?;
        tracing::info!(products = products.len(), "Catalog loaded");
        Ok(Self::new(products))
    }

    /// Products in menu order.
    #[must_use]
    pub fn products(&self) -> &[ProductSummary] {
        &self.products
    }

    /// The menu keyboard: one button per product, then "Shopping cart".
    #[must_use]
    pub const fn menu(&self) -> &Keyboard {
        &self.menu
    }
}
