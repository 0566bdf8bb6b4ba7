//! Wire types for the commerce JSON API and their conversion into core types.
//!
//! Only the fields the bot renders are modelled; everything else in the
//! responses is ignored by serde.

use serde::{Deserialize, Serialize};
use storebot_core::{
    Cart, CartItem, CartItemId, Customer, CustomerId, Email, FileId, Product, ProductId,
    ProductSummary,
};

use super::CommerceError;

// =============================================================================
// Envelopes
// =============================================================================

/// `{"data": ...}` response envelope.
#[derive(Debug, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// `{"data": ...}` request envelope.
#[derive(Debug, Serialize)]
pub struct DataRequest<T> {
    pub data: T,
}

// =============================================================================
// Products & files
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductListRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub meta: ProductMeta,
    #[serde(default)]
    pub relationships: ProductRelationships,
}

#[derive(Debug, Deserialize)]
pub struct ProductMeta {
    pub display_price: DisplayPrice,
    pub stock: Stock,
}

#[derive(Debug, Deserialize)]
pub struct DisplayPrice {
    pub with_tax: Formatted,
}

#[derive(Debug, Deserialize)]
pub struct Formatted {
    pub formatted: String,
}

#[derive(Debug, Deserialize)]
pub struct Stock {
    pub level: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductRelationships {
    #[serde(default)]
    pub main_image: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<RelationshipData>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipData {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct FileRecord {
    pub link: FileLink,
}

#[derive(Debug, Deserialize)]
pub struct FileLink {
    pub href: String,
}

impl From<ProductListRecord> for ProductSummary {
    fn from(record: ProductListRecord) -> Self {
        Self {
            id: ProductId::new(record.id),
            name: record.name,
        }
    }
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: ProductId::new(record.id),
            name: record.name,
            description: record.description,
            price: record.meta.display_price.with_tax.formatted,
            stock_level: record.meta.stock.level,
            main_image: record
                .relationships
                .main_image
                .and_then(|rel| rel.data)
                .map(|data| FileId::new(data.id)),
        }
    }
}

// =============================================================================
// Carts
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CartItemsResponse {
    pub data: Vec<CartItemRecord>,
    pub meta: CartMeta,
}

#[derive(Debug, Deserialize)]
pub struct CartMeta {
    pub display_price: DisplayPrice,
}

#[derive(Debug, Deserialize)]
pub struct CartItemRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    pub meta: CartItemMeta,
}

#[derive(Debug, Deserialize)]
pub struct CartItemMeta {
    pub display_price: CartItemDisplayPrice,
}

#[derive(Debug, Deserialize)]
pub struct CartItemDisplayPrice {
    pub with_tax: CartItemPrices,
}

#[derive(Debug, Deserialize)]
pub struct CartItemPrices {
    pub unit: Formatted,
    pub value: Formatted,
}

#[derive(Debug, Serialize)]
pub struct CartItemRequest<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub quantity: u32,
}

impl From<CartItemsResponse> for Cart {
    fn from(response: CartItemsResponse) -> Self {
        Self {
            items: response
                .data
                .into_iter()
                .map(|item| CartItem {
                    id: CartItemId::new(item.id),
                    name: item.name,
                    description: item.description,
                    quantity: item.quantity,
                    unit_price: item.meta.display_price.with_tax.unit.formatted,
                    line_total: item.meta.display_price.with_tax.value.formatted,
                })
                .collect(),
            total: response.meta.display_price.with_tax.formatted,
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedRecord {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'a str,
    pub email: &'a str,
}

impl TryFrom<CustomerRecord> for Customer {
    type Error = CommerceError;

    fn try_from(record: CustomerRecord) -> Result<Self, Self::Error> {
        let email = Email::parse(&record.email).map_err(|e| {
            CommerceError::Parse(format!("customer {} has invalid email: {e}", record.id))
        })?;

        Ok(Self {
            id: CustomerId::new(record.id),
            name: record.name,
            email,
        })
    }
}

impl From<CreatedRecord> for CustomerId {
    fn from(record: CreatedRecord) -> Self {
        Self::new(record.id)
    }
}
