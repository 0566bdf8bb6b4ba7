//! storebot - Telegram storefront bot.
//!
//! # Architecture
//!
//! - [`controller`]: per-user conversation state machine
//! - [`commerce`]: REST client for the commerce backend (catalog, carts, customers)
//! - [`store`]: durable conversation state in `PostgreSQL`
//! - [`chat`]: transport contract and the teloxide adapter
//!
//! Nothing here is global: the catalog, the access token and the database
//! pool are owned by the components that use them and injected at startup.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod chat;
pub mod commerce;
pub mod config;
pub mod controller;
pub mod error;
pub mod store;

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat::telegram::{self, TelegramTransport};
use commerce::CommerceClient;
use config::BotConfig;
use controller::{Catalog, Controller};
use error::BotError;
use store::{PgStateStore, StoreError};

/// Initialize Sentry error tracking and return guard that must be kept alive.
#[must_use]
pub fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Defaults to `storebot=info` when
/// `RUST_LOG` is unset.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storebot=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Wire up every component and long-poll Telegram until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the database is unreachable, the commerce client
/// can't be built, or the catalog can't be loaded.
pub async fn run(config: BotConfig) -> Result<(), BotError> {
    let pool = store::create_pool(&config.database_url)
        .await
        .map_err(StoreError::from)?;
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p storebot-cli -- migrate

    let commerce = CommerceClient::new(config.commerce.clone())?;
    let catalog = Catalog::load(&commerce).await?;

    let bot = teloxide::Bot::new(config.bot_token());
    let controller = Arc::new(Controller::new(
        commerce,
        TelegramTransport::new(bot.clone()),
        PgStateStore::new(pool),
        catalog,
    ));

    telegram::run(bot, controller).await;
    Ok(())
}
