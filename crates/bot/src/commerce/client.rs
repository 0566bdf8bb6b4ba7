//! Commerce REST API client.
//!
//! Provides typed access to the catalog, cart and customer resources. Every
//! request carries a bearer token obtained with the client-credentials grant.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use storebot_core::{
    Cart, CartId, CartItemId, Customer, CustomerId, Email, FileId, Product, ProductId,
    ProductSummary, Quantity,
};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;
use url::Url;

use super::auth::{AccessToken, exchange_client_credentials};
use super::types::{
    CartItemRequest, CartItemsResponse, CreatedRecord, CustomerRecord, CustomerRequest,
    DataRequest, DataResponse, FileRecord, ProductListRecord, ProductRecord,
};
use super::{Commerce, CommerceError};
use crate::config::CommerceConfig;

/// Commerce API client.
///
/// Cheap to clone; all clones share one HTTP connection pool and one token.
///
/// # Authentication
///
/// The access token is cached in memory and exchanged again once it expires.
/// Callers that find it expired at the same moment queue on a refresh lock,
/// so a burst of events produces a single exchange.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    http: reqwest::Client,
    config: CommerceConfig,
    /// In-memory token cache
    token: RwLock<Option<AccessToken>>,
    /// Held while exchanging credentials
    refresh: Mutex<()>,
}

impl std::fmt::Debug for CommerceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl CommerceClient {
    /// Create a new commerce client without a token.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: CommerceConfig) -> Result<Self, CommerceError> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                http,
                config,
                token: RwLock::new(None),
                refresh: Mutex::new(()),
            }),
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Return a valid access token, exchanging credentials if needed.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::RemoteService` if the token exchange is rejected.
    pub async fn access_token(&self) -> Result<SecretString, CommerceError> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _guard = self.inner.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let token = exchange_client_credentials(&self.inner.http, &self.inner.config).await?;
        let value = token.value.clone();
        *self.inner.token.write().await = Some(token);

        tracing::info!("Commerce access token refreshed");
        Ok(value)
    }

    async fn cached_token(&self) -> Option<SecretString> {
        let now = chrono::Utc::now().timestamp();
        self.inner
            .token
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now))
            .map(|token| token.value.clone())
    }

    // =========================================================================
    // Request Execution
    // =========================================================================

    /// Build a resource URL below the configured base URL.
    fn url(&self, path: &str) -> Result<Url, CommerceError> {
        let base = self.inner.config.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send an authenticated request and fail on any non-success status.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CommerceError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token.expose_secret()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Commerce API returned an error");
            return Err(CommerceError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CommerceError> {
        response
            .json()
            .await
            .map_err(|e| CommerceError::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CommerceError> {
        let response = self.send(self.inner.http.get(url)).await?;
        Self::read_json(response).await
    }
}

impl Commerce for CommerceClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<ProductSummary>, CommerceError> {
        let response: DataResponse<Vec<ProductListRecord>> =
            self.get_json(self.url("products")?).await?;

        // Name→id table semantics: a repeated name keeps its position and
        // takes the later id.
        let mut products: Vec<ProductSummary> = Vec::with_capacity(response.data.len());
        for record in response.data {
            let summary = ProductSummary::from(record);
            match products.iter_mut().find(|p| p.name == summary.name) {
                Some(existing) => existing.id = summary.id,
                None => products.push(summary),
            }
        }

        Ok(products)
    }

    #[instrument(skip(self), fields(product = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        let response: DataResponse<ProductRecord> =
            self.get_json(self.url(&format!("products/{id}"))?).await?;
        Ok(Product::from(response.data))
    }

    #[instrument(skip(self), fields(file = %id))]
    async fn get_file_link(&self, id: &FileId) -> Result<String, CommerceError> {
        let response: DataResponse<FileRecord> =
            self.get_json(self.url(&format!("files/{id}"))?).await?;
        Ok(response.data.link.href)
    }

    #[instrument(skip(self), fields(cart = %cart, product = %product, quantity = %quantity))]
    async fn add_to_cart(
        &self,
        cart: &CartId,
        product: &ProductId,
        quantity: Quantity,
    ) -> Result<(), CommerceError> {
        let body = DataRequest {
            data: CartItemRequest {
                id: product.as_str(),
                kind: "cart_item",
                quantity: quantity.get(),
            },
        };

        let url = self.url(&format!("carts/{cart}/items"))?;
        self.send(self.inner.http.post(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(cart = %cart, item = %item))]
    async fn remove_from_cart(&self, cart: &CartId, item: &CartItemId) -> Result<(), CommerceError> {
        let url = self.url(&format!("carts/{cart}/items/{item}"))?;
        self.send(self.inner.http.delete(url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(cart = %cart))]
    async fn get_cart_items(&self, cart: &CartId) -> Result<Cart, CommerceError> {
        let response: CartItemsResponse =
            self.get_json(self.url(&format!("carts/{cart}/items"))?).await?;
        Ok(Cart::from(response))
    }

    #[instrument(skip(self, email))]
    async fn find_customer(&self, email: &Email) -> Result<Vec<Customer>, CommerceError> {
        let url = Url::parse_with_params(
            self.url("customers")?.as_str(),
            &[("filter", format!("eq(email,{email})"))],
        )?;

        let response: DataResponse<Vec<CustomerRecord>> = self.get_json(url).await?;
        response.data.into_iter().map(Customer::try_from).collect()
    }

    #[instrument(skip(self, name, email))]
    async fn create_customer(&self, name: &str, email: &Email) -> Result<CustomerId, CommerceError> {
        let body = DataRequest {
            data: CustomerRequest {
                kind: "customer",
                name,
                email: email.as_str(),
            },
        };

        let response = self
            .send(self.inner.http.post(self.url("customers")?).json(&body))
            .await?;
        let created: DataResponse<CreatedRecord> = Self::read_json(response).await?;

        tracing::info!(customer = %created.data.id, "Customer created");
        Ok(CustomerId::from(created.data))
    }
}
