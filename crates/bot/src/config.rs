//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TELEGRAM_BOT_TOKEN` - Telegram Bot API token (falls back to `BOT_TOKEN`)
//! - `COMMERCE_BASE_URL` - Commerce API base URL (e.g., <https://api.moltin.com/v2>)
//! - `COMMERCE_AUTH_URL` - OAuth2 token endpoint for the client-credentials grant
//! - `COMMERCE_CLIENT_ID` - OAuth2 client ID
//! - `COMMERCE_CLIENT_SECRET` - OAuth2 client secret
//! - `STOREBOT_DATABASE_URL` - `PostgreSQL` connection string for conversation
//!   state (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bot application configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram transport configuration
    pub telegram: TelegramConfig,
    /// Commerce API configuration
    pub commerce: CommerceConfig,
    /// `PostgreSQL` connection URL for conversation state (contains password)
    pub database_url: SecretString,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Telegram Bot API configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`
    pub bot_token: SecretString,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

/// Commerce API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CommerceConfig {
    /// Base URL all resource paths are appended to
    pub base_url: Url,
    /// OAuth2 token endpoint
    pub auth_url: Url,
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the client secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`BotConfig::from_env`].
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            telegram: TelegramConfig::from_lookup(lookup)?,
            commerce: CommerceConfig::from_lookup(lookup)?,
            database_url: get_database_url(lookup)?,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the Telegram bot token.
    #[must_use]
    pub fn bot_token(&self) -> &str {
        self.telegram.bot_token.expose_secret()
    }
}

impl TelegramConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = non_empty(lookup, "TELEGRAM_BOT_TOKEN")
            .or_else(|| non_empty(lookup, "BOT_TOKEN"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()))?;
        Ok(Self { bot_token })
    }
}

impl CommerceConfig {
    /// Load only the commerce settings (used by operator tooling).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a commerce variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let client_secret = get_required(lookup, "COMMERCE_CLIENT_SECRET")?;
        validate_secret_strength(&client_secret, "COMMERCE_CLIENT_SECRET")?;

        Ok(Self {
            base_url: get_url(lookup, "COMMERCE_BASE_URL")?,
            auth_url: get_url(lookup, "COMMERCE_AUTH_URL")?,
            client_id: get_required(lookup, "COMMERCE_CLIENT_ID")?,
            client_secret: SecretString::from(client_secret),
        })
    }
}

/// Load only the database URL (used by operator tooling).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither `STOREBOT_DATABASE_URL`
/// nor `DATABASE_URL` is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url(&env_lookup)
}

// =============================================================================
// Helper Functions
// =============================================================================

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get a required variable, treating an empty value as missing.
fn get_required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    non_empty(lookup, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// A variable that is set to something other than whitespace.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Get a required absolute http(s) URL.
fn get_url(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Url, ConfigError> {
    let value = get_required(lookup, key)?;
    let url = Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    non_empty(lookup, "STOREBOT_DATABASE_URL")
        .or_else(|| non_empty(lookup, "DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar("STOREBOT_DATABASE_URL".to_string()))
}

/// Reject secrets that are obviously copied from a template.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
