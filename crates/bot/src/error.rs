//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, BotError>`. The dispatcher's error hook calls
//! [`report`], which logs the error with its triggering event and captures it
//! to Sentry.

use thiserror::Error;

use crate::chat::{Event, TransportError};
use crate::commerce::CommerceError;
use crate::controller::RoutingError;
use crate::store::StoreError;

/// Bot-level error type.
#[derive(Debug, Error)]
pub enum BotError {
    /// Commerce backend call failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Event doesn't fit the conversation.
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// State store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Chat transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Log and capture an error raised while handling `event`.
pub fn report(error: &BotError, event: &Event) {
    let event_id = sentry::with_scope(
        |scope| {
            scope.set_user(Some(sentry::User {
                id: Some(event.user.to_string()),
                ..Default::default()
            }));
            scope.set_tag("event", event.kind.to_string());
        },
        || sentry::capture_error(error),
    );

    tracing::error!(
        error = %error,
        user = %event.user,
        chat = %event.chat,
        event = %event.kind,
        sentry_event_id = %event_id,
        "Event handling failed"
    );
}
