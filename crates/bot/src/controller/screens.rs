//! Screen builders. Pure: they take fetched data and return a [`Transition`].

use storebot_core::{Cart, ConversationState, Product, Quantity, format_cart, format_product_caption};

use super::action::Callback;
use super::catalog::Catalog;
use crate::chat::{Button, Keyboard};

pub const MENU_PROMPT: &str = "Please choose:";
pub const EMAIL_PROMPT: &str = "Please enter your email:";
pub const INVALID_EMAIL_PROMPT: &str = "That doesn't look like an email address. Please enter your email:";
pub const THANK_YOU: &str = "Thank you!";

/// A message the controller sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text {
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        url: String,
        caption: String,
        keyboard: Option<Keyboard>,
    },
}

impl Outgoing {
    fn text(text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        Self::Text {
            text: text.into(),
            keyboard,
        }
    }
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State persisted after the messages are sent.
    pub next: ConversationState,
    /// Delete the message that carried the event before sending.
    pub replace_prior: bool,
    pub messages: Vec<Outgoing>,
}

/// The menu screen.
#[must_use]
pub fn menu(catalog: &Catalog) -> Transition {
    Transition {
        next: ConversationState::Menu,
        replace_prior: true,
        messages: vec![Outgoing::text(MENU_PROMPT, Some(catalog.menu().clone()))],
    }
}

fn product_keyboard(product: &Product) -> Keyboard {
    let quantities = Quantity::OPTIONS
        .into_iter()
        .filter_map(|kg| Quantity::new(kg).ok())
        .map(|quantity| {
            Button::new(
                format!("{quantity} kg"),
                Callback::Add(product.id.clone(), quantity).to_string(),
            )
        })
        .collect();

    Keyboard::default()
        .row(quantities)
        .button(Button::new("Menu", Callback::Menu.to_string()))
        .button(Button::new("Shopping cart", Callback::Cart.to_string()))
}

/// The product card. Shown as a photo when the product has an image link,
/// otherwise as text with the same caption and keyboard.
#[must_use]
pub fn product_card(product: &Product, image_url: Option<String>) -> Transition {
    let caption = format_product_caption(product);
    let keyboard = Some(product_keyboard(product));

    let message = match image_url {
        Some(url) => Outgoing::Photo {
            url,
            caption,
            keyboard,
        },
        None => Outgoing::text(caption, keyboard),
    };

    Transition {
        next: ConversationState::Product,
        replace_prior: true,
        messages: vec![message],
    }
}

/// The cart view. Every path into the cart screen renders through here.
#[must_use]
pub fn cart_view(cart: &Cart) -> Transition {
    let keyboard = cart
        .items
        .iter()
        .fold(Keyboard::default(), |keyboard, item| {
            keyboard.button(Button::new(
                format!("Remove {}", item.name),
                Callback::Remove(item.id.clone()).to_string(),
            ))
        })
        .button(Button::new("Menu", Callback::Menu.to_string()))
        .button(Button::new("Checkout", Callback::Checkout.to_string()));

    Transition {
        next: ConversationState::Cart,
        replace_prior: true,
        messages: vec![Outgoing::text(format_cart(cart), Some(keyboard))],
    }
}

/// Ask for the email address.
#[must_use]
pub fn checkout_prompt() -> Transition {
    Transition {
        next: ConversationState::Checkout,
        replace_prior: true,
        messages: vec![Outgoing::text(EMAIL_PROMPT, None)],
    }
}

/// Ask again after an unusable address. Keeps the user's message.
#[must_use]
pub fn invalid_email() -> Transition {
    Transition {
        next: ConversationState::Checkout,
        replace_prior: false,
        messages: vec![Outgoing::text(INVALID_EMAIL_PROMPT, None)],
    }
}

/// Thank the customer and return to the menu.
#[must_use]
pub fn checkout_complete(catalog: &Catalog) -> Transition {
    let mut transition = menu(catalog);
    transition
        .messages
        .insert(0, Outgoing::text(THANK_YOU, None));
    transition
}

#[cfg(test)]
mod tests {
    use storebot_core::{CartItem, CartItemId, FileId, ProductId, ProductSummary};

    use super::*;

    fn apple() -> Product {
        Product {
            id: ProductId::new("p-1"),
            name: "Apple".to_string(),
            description: "Crisp".to_string(),
            price: "$2.00".to_string(),
            stock_level: 120,
            main_image: Some(FileId::new("f-1")),
        }
    }

    fn keyboard(message: &Outgoing) -> &Keyboard {
        match message {
            Outgoing::Text { keyboard, .. } | Outgoing::Photo { keyboard, .. } => {
                keyboard.as_ref().expect("screen has a keyboard")
            }
        }
    }

    #[test]
    fn test_product_card_layout() {
        let transition = product_card(&apple(), Some("https://cdn.example.com/a.png".into()));

        assert_eq!(transition.next, ConversationState::Product);
        assert!(transition.replace_prior);
        let [message] = transition.messages.as_slice() else {
            panic!("expected one message");
        };
        assert!(matches!(message, Outgoing::Photo { url, .. } if url.ends_with("a.png")));

        let keyboard = keyboard(message);
        assert_eq!(keyboard.rows[0].len(), 3);
        assert_eq!(
            keyboard.labels(),
            vec!["1 kg", "5 kg", "10 kg", "Menu", "Shopping cart"]
        );
        assert_eq!(
            keyboard.find("5 kg").map(|b| b.data.as_str()),
            Some("add:p-1:5")
        );
    }

    #[test]
    fn test_product_card_without_image_is_text() {
        let transition = product_card(&apple(), None);
        assert!(matches!(
            &transition.messages[0],
            Outgoing::Text { text, keyboard: Some(_) } if text.starts_with("Apple\n\n$2.00 per kg")
        ));
    }

    #[test]
    fn test_cart_view_buttons() {
        let cart = Cart {
            items: vec![CartItem {
                id: CartItemId::new("line-1"),
                name: "Apple".to_string(),
                description: "Crisp".to_string(),
                quantity: 5,
                unit_price: "$2.00".to_string(),
                line_total: "$10.00".to_string(),
            }],
            total: "$10.00".to_string(),
        };

        let transition = cart_view(&cart);
        assert_eq!(transition.next, ConversationState::Cart);
        let keyboard = keyboard(&transition.messages[0]);
        assert_eq!(keyboard.labels(), vec!["Remove Apple", "Menu", "Checkout"]);
        assert_eq!(
            keyboard.find("Remove Apple").map(|b| b.data.as_str()),
            Some("remove:line-1")
        );
    }

    #[test]
    fn test_empty_cart_view() {
        let cart = Cart {
            items: Vec::new(),
            total: "$0.00".to_string(),
        };
        let transition = cart_view(&cart);
        assert!(matches!(
            &transition.messages[0],
            Outgoing::Text { text, .. } if text == "Total: $0.00"
        ));
        assert_eq!(keyboard(&transition.messages[0]).labels(), vec!["Menu", "Checkout"]);
    }

    #[test]
    fn test_checkout_complete_thanks_then_menu() {
        let catalog = Catalog::new(vec![ProductSummary {
            id: ProductId::new("p-1"),
            name: "Apple".to_string(),
        }]);
        let transition = checkout_complete(&catalog);

        assert_eq!(transition.next, ConversationState::Menu);
        assert_eq!(transition.messages.len(), 2);
        assert!(matches!(&transition.messages[0], Outgoing::Text { text, keyboard: None } if text == THANK_YOU));
        assert!(matches!(&transition.messages[1], Outgoing::Text { text, .. } if text == MENU_PROMPT));
    }

    #[test]
    fn test_invalid_email_keeps_message() {
        let transition = invalid_email();
        assert_eq!(transition.next, ConversationState::Checkout);
        assert!(!transition.replace_prior);
    }
}
