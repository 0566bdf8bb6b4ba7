//! Decoding of inbound events into controller actions.
//!
//! Button callback data is a short ASCII string:
//!
//! | Data | Button |
//! |---|---|
//! | `menu` | Menu |
//! | `cart` | Shopping cart |
//! | `checkout` | Checkout |
//! | `product:<id>` | product in the menu |
//! | `add:<id>:<qty>` | quantity option on a product card |
//! | `remove:<item id>` | Remove line from the cart |

use std::fmt;
use std::str::FromStr;

use storebot_core::{CartItemId, ProductId, Quantity};

use super::RoutingError;
use crate::chat::EventKind;

/// Telegram's limit on callback data.
pub const MAX_CALLBACK_DATA: usize = 64;

/// Payload of an inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Menu,
    Cart,
    Checkout,
    Product(ProductId),
    Add(ProductId, Quantity),
    Remove(CartItemId),
}

impl Callback {
    /// Whether the encoded form fits in a Telegram button.
    #[must_use]
    pub fn fits(&self) -> bool {
        self.to_string().len() <= MAX_CALLBACK_DATA
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => f.write_str("menu"),
            Self::Cart => f.write_str("cart"),
            Self::Checkout => f.write_str("checkout"),
            Self::Product(id) => write!(f, "product:{id}"),
            Self::Add(id, quantity) => write!(f, "add:{id}:{quantity}"),
            Self::Remove(item) => write!(f, "remove:{item}"),
        }
    }
}

impl FromStr for Callback {
    type Err = RoutingError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let malformed = || RoutingError::MalformedAction(data.to_string());

        match data {
            "menu" => return Ok(Self::Menu),
            "cart" => return Ok(Self::Cart),
            "checkout" => return Ok(Self::Checkout),
            _ => {}
        }

        let (verb, rest) = data.split_once(':').ok_or_else(malformed)?;
        if rest.is_empty() {
            return Err(malformed());
        }

        match verb {
            "product" => Ok(Self::Product(ProductId::new(rest))),
            "remove" => Ok(Self::Remove(CartItemId::new(rest))),
            "add" => {
                let (id, quantity) = rest.rsplit_once(':').ok_or_else(malformed)?;
                if id.is_empty() {
                    return Err(malformed());
                }
                let quantity = quantity
                    .parse::<u32>()
                    .ok()
                    .and_then(|q| Quantity::new(q).ok())
                    .ok_or_else(malformed)?;
                Ok(Self::Add(ProductId::new(id), quantity))
            }
            _ => Err(malformed()),
        }
    }
}

/// What the controller is asked to do for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `/start`
    Start,
    /// Any other command.
    Command(String),
    /// Inline button press.
    Button(Callback),
    /// Free text.
    Text(String),
}

impl Action {
    /// Decode an inbound event.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::MalformedAction` for button data that isn't one
    /// of the known encodings.
    pub fn from_event(kind: &EventKind) -> Result<Self, RoutingError> {
        Ok(match kind {
            EventKind::Command(name) if name == "start" => Self::Start,
            EventKind::Command(name) => Self::Command(name.clone()),
            EventKind::Button(data) => Self::Button(data.parse()?),
            EventKind::Text(text) => Self::Text(text.clone()),
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("/start"),
            Self::Command(name) => write!(f, "/{name}"),
            Self::Button(callback) => write!(f, "button {callback}"),
            Self::Text(_) => f.write_str("text"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_parse_fixed_buttons() {
        assert_eq!("menu".parse::<Callback>().unwrap(), Callback::Menu);
        assert_eq!("cart".parse::<Callback>().unwrap(), Callback::Cart);
        assert_eq!("checkout".parse::<Callback>().unwrap(), Callback::Checkout);
    }

    #[test]
    fn test_parse_add_keeps_colons_in_id() {
        let parsed: Callback = "add:ns:p-1:5".parse().unwrap();
        assert_eq!(parsed, Callback::Add(ProductId::new("ns:p-1"), qty(5)));
    }

    #[test]
    fn test_encoding_matches_parser() {
        let id = ProductId::new("0b8a5c1e-3c4d-4e5f-8a9b-0c1d2e3f4a5b");
        for callback in [
            Callback::Product(id.clone()),
            Callback::Add(id, qty(10)),
            Callback::Remove(CartItemId::new("line-7")),
        ] {
            let data = callback.to_string();
            assert!(callback.fits(), "{data} exceeds the callback limit");
            assert_eq!(data.parse::<Callback>().unwrap(), callback);
        }
    }

    #[test]
    fn test_malformed_data() {
        for data in ["", "product:", "add:p-1", "add:p-1:0", "add:p-1:x", "add::5", "buy:p-1", "Menu"] {
            assert!(
                matches!(data.parse::<Callback>(), Err(RoutingError::MalformedAction(d)) if d == data),
                "{data:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_action_from_event() {
        assert_eq!(
            Action::from_event(&EventKind::Command("start".into())).unwrap(),
            Action::Start
        );
        assert_eq!(
            Action::from_event(&EventKind::Command("help".into())).unwrap(),
            Action::Command("help".into())
        );
        assert_eq!(
            Action::from_event(&EventKind::Button("cart".into())).unwrap(),
            Action::Button(Callback::Cart)
        );
        assert!(Action::from_event(&EventKind::Button("nope".into())).is_err());
    }

    #[test]
    fn test_oversized_id_does_not_fit() {
        let callback = Callback::Product(ProductId::new("x".repeat(64)));
        assert!(!callback.fits());
    }
}
