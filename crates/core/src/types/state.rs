//! Conversation state persisted per user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The screen a user is currently looking at.
///
/// Persisted as a text tag. A tag naming no state fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Catalog keyboard.
    Menu,
    /// A single product card with quantity buttons.
    Product,
    /// Cart contents with remove/checkout buttons.
    Cart,
    /// Waiting for the user to type an email address.
    Checkout,
}

/// A stored tag that does not name any [`ConversationState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown conversation state tag: {0:?}")]
pub struct UnknownStateTag(pub String);

impl ConversationState {
    /// All states, in screen order.
    pub const ALL: [Self; 4] = [Self::Menu, Self::Product, Self::Cart, Self::Checkout];

    /// The persisted tag for this state.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Product => "product",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for ConversationState {
    type Err = UnknownStateTag;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_tag() == tag)
            .ok_or_else(|| UnknownStateTag(tag.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_parse_back() {
        for state in ConversationState::ALL {
            assert_eq!(state.as_tag().parse::<ConversationState>().unwrap(), state);
        }
    }

    #[test]
    fn test_unknown_tag() {
        let err = "101".parse::<ConversationState>().unwrap_err();
        assert_eq!(err, UnknownStateTag("101".to_owned()));
        assert_eq!(err.to_string(), "unknown conversation state tag: \"101\"");
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!("MENU".parse::<ConversationState>().is_err());
    }

    #[test]
    fn test_serde_matches_tag() {
        let json = serde_json::to_string(&ConversationState::Checkout).unwrap();
        assert_eq!(json, "\"checkout\"");
    }
}
