//! Text rendering for the screens the bot sends.
//!
//! Prices and totals are rendered exactly as the backend formatted them. The
//! bot never does arithmetic on money.

use crate::types::{Cart, CartItem, Product};

/// Caption for a product card.
///
/// ```
/// # use storebot_core::{format_product_caption, Product, ProductId};
/// let product = Product {
///     id: ProductId::new("p1"),
///     name: "Salmon".into(),
///     description: "Fresh".into(),
///     price: "$12.00".into(),
///     stock_level: 40,
///     main_image: None,
/// };
/// assert_eq!(
///     format_product_caption(&product),
///     "Salmon\n\n$12.00 per kg\n40 kg in stock\n\nFresh"
/// );
/// ```
#[must_use]
pub fn format_product_caption(product: &Product) -> String {
    format!(
        "{}\n\n{} per kg\n{} kg in stock\n\n{}",
        product.name, product.price, product.stock_level, product.description
    )
}

fn format_cart_item(item: &CartItem) -> String {
    format!(
        "{}\n{}\n{} per kg\n{} kg in cart for {}",
        item.name, item.description, item.unit_price, item.quantity, item.line_total
    )
}

/// Body of the cart view: one block per line, then the total, separated by
/// blank lines. An empty cart is just the total line.
#[must_use]
pub fn format_cart(cart: &Cart) -> String {
    cart.items
        .iter()
        .map(format_cart_item)
        .chain(std::iter::once(format!("Total: {}", cart.total)))
        .collect::<Vec<_>>()
        .join("\n\n")
}
