//! Commerce backend client.
//!
//! # Architecture
//!
//! - REST/JSON:API resources: products, files, carts, cart items, customers
//! - OAuth2 client-credentials bearer tokens, cached in the client and
//!   refreshed when expired ([`auth`])
//! - The backend is the source of truth for carts; nothing is cached here
//!   except the access token
//!
//! The [`Commerce`] trait is the seam the conversation controller depends on,
//! so conversations can be exercised against an in-memory double.

pub mod auth;
mod client;
mod types;

use std::future::Future;

pub use client::CommerceClient;

use storebot_core::{
    Cart, CartId, CartItemId, Customer, CustomerId, Email, FileId, Product, ProductId,
    ProductSummary, Quantity,
};
use thiserror::Error;

/// Errors that can occur when interacting with the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The backend answered with a non-success status.
    #[error("Remote service error: {status} - {body}")]
    RemoteService { status: u16, body: String },

    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Catalog, cart and customer operations the bot needs from the backend.
///
/// Every operation may fail with [`CommerceError`]; callers propagate it.
pub trait Commerce: Send + Sync {
    /// Full catalog as an ordered name→id table.
    fn list_products(
        &self,
    ) -> impl Future<Output = Result<Vec<ProductSummary>, CommerceError>> + Send;

    /// Product detail including formatted price and stock.
    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Product, CommerceError>> + Send;

    /// Downloadable URL for a file reference.
    fn get_file_link(
        &self,
        id: &FileId,
    ) -> impl Future<Output = Result<String, CommerceError>> + Send;

    /// Add a product to a cart. Repeated calls add repeated lines.
    fn add_to_cart(
        &self,
        cart: &CartId,
        product: &ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), CommerceError>> + Send;

    /// Remove one cart line.
    fn remove_from_cart(
        &self,
        cart: &CartId,
        item: &CartItemId,
    ) -> impl Future<Output = Result<(), CommerceError>> + Send;

    /// Current cart lines and total.
    fn get_cart_items(
        &self,
        cart: &CartId,
    ) -> impl Future<Output = Result<Cart, CommerceError>> + Send;

    /// Customers registered with the given email (possibly none).
    fn find_customer(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Vec<Customer>, CommerceError>> + Send;

    /// Register a customer and return its id.
    fn create_customer(
        &self,
        name: &str,
        email: &Email,
    ) -> impl Future<Output = Result<CustomerId, CommerceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_service_error_display() {
        let err = CommerceError::RemoteService {
            status: 404,
            body: "{\"errors\":[]}".to_string(),
        };
        assert_eq!(err.to_string(), "Remote service error: 404 - {\"errors\":[]}");
    }

    #[test]
    fn test_parse_error_display() {
        let err = CommerceError::Parse("missing data".to_string());
        assert_eq!(err.to_string(), "Parse error: missing data");
    }
}
