//! Commerce API authentication.
//!
//! Client-credentials exchange for bearer tokens. The exchange is idempotent:
//! asking twice just yields two valid tokens.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::CommerceError;
use crate::config::CommerceConfig;

/// Bearer token obtained from the client-credentials grant.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Token sent as `Authorization: Bearer ...`.
    pub value: SecretString,
    /// Unix timestamp when the token expires.
    pub expires_at: i64,
}

/// Response from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Absolute expiry as a Unix timestamp.
    expires: i64,
}

impl AccessToken {
    /// Whether the token is still valid at `now` (Unix seconds).
    #[must_use]
    pub const fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// Exchange the configured client credentials for a new access token.
///
/// # Errors
///
/// Returns `CommerceError::RemoteService` if the token endpoint rejects the
/// credentials, `CommerceError::Http` on network failures.
#[instrument(skip(client, config), fields(client_id = %config.client_id))]
pub async fn exchange_client_credentials(
    client: &reqwest::Client,
    config: &CommerceConfig,
) -> Result<AccessToken, CommerceError> {
    let response = client
        .post(config.auth_url.clone())
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.expose_secret()),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CommerceError::RemoteService {
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| CommerceError::Parse(format!("token response: {e}")))?;

    tracing::debug!(expires_at = token.expires, "Obtained commerce access token");

    Ok(AccessToken {
        value: SecretString::from(token.access_token),
        expires_at: token.expires,
    })
}
