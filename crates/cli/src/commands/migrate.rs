//! Database migration command.
//!
//! # Environment Variables
//!
//! - `STOREBOT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations live in `crates/bot/migrations/` and are embedded at build time.

use storebot::config::{ConfigError, database_url_from_env};
use storebot::store::create_pool;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to storebot database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running storebot migrations...");
    sqlx::migrate!("../bot/migrations").run(&pool).await?;

    tracing::info!("Storebot migrations complete!");
    Ok(())
}
