//! Chat transport contract.
//!
//! The controller only sees [`Event`]s coming in and issues three commands
//! back through [`ChatTransport`]: send text, send photo, delete message.
//! The Telegram implementation lives in [`telegram`].

pub mod telegram;

use std::fmt;
use std::future::Future;

use storebot_core::{ChatId, MessageId, UserId};
use thiserror::Error;

/// Errors from the chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The chat API rejected or failed a request.
    #[error("Chat request failed: {0}")]
    Request(String),

    /// A payload could not be converted for the chat API.
    #[error("Invalid chat payload: {0}")]
    InvalidPayload(String),
}

/// A labeled button carrying opaque callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    /// Create a button.
    #[must_use]
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Inline keyboard: rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Append a row.
    #[must_use]
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Append a row holding a single button.
    #[must_use]
    pub fn button(self, button: Button) -> Self {
        self.row(vec![button])
    }

    /// All buttons in reading order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Button labels in reading order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.buttons().map(|b| b.label.as_str()).collect()
    }

    /// Find a button by label.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<&Button> {
        self.buttons().find(|b| b.label == label)
    }
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A `/command`, stored without the leading slash or bot suffix.
    Command(String),
    /// An inline button press with its callback data.
    Button(String),
    /// Free text.
    Text(String),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(name) => write!(f, "command /{name}"),
            Self::Button(data) => write!(f, "button {data:?}"),
            Self::Text(_) => f.write_str("text message"),
        }
    }
}

/// An inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub user: UserId,
    pub chat: ChatId,
    /// The message that carried the event (the pressed keyboard's message for
    /// buttons, the user's own message for text). Replaced screens delete it.
    pub message: Option<MessageId>,
    /// Sender's first name from their chat profile.
    pub sender_name: String,
    pub kind: EventKind,
}

/// Commands the controller issues back to the chat.
pub trait ChatTransport: Send + Sync {
    /// Send a text message.
    fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = Result<MessageId, TransportError>> + Send;

    /// Send a photo by URL with a caption.
    fn send_photo(
        &self,
        chat: ChatId,
        photo_url: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = Result<MessageId, TransportError>> + Send;

    /// Delete a message.
    fn delete_message(
        &self,
        chat: ChatId,
        message: MessageId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
