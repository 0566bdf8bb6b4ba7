//! Conversation state storage.
//!
//! # Database: `storebot`
//!
//! ## Tables
//!
//! - `conversation_state` - Current screen per chat user, keyed by user id
//!
//! # Migrations
//!
//! Migrations are stored in `crates/bot/migrations/` and run via:
//! ```bash
//! cargo run -p storebot-cli -- migrate
//! ```

mod postgres;

use std::future::Future;
use std::time::Duration;

pub use postgres::PgStateStore;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use storebot_core::{ConversationState, UserId};
use thiserror::Error;

/// Errors from the state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable mapping from user identity to the current screen.
///
/// `get` returns the raw stored tag; interpreting it is the controller's job,
/// so a tag the controller doesn't know surfaces as a routing error.
pub trait StateStore: Send + Sync {
    /// The stored tag for a user, or `None` if the user never pressed `/start`.
    fn get(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Overwrite the user's state.
    fn set(
        &self,
        user: UserId,
        state: ConversationState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
