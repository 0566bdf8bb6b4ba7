//! Conversation controller.
//!
//! One event is handled to completion: read the user's state, dispatch on
//! `(state, action)`, delete the replaced screen, send the new one, persist
//! the next state. Failures abort the event before the state is written,
//! except a replaced screen that can't be deleted, which is only logged.

pub mod action;
mod catalog;
pub mod screens;

use storebot_core::{CartId, ConversationState, Email, ProductId};
use thiserror::Error;
use tracing::instrument;

pub use action::{Action, Callback};
pub use catalog::Catalog;
pub use screens::{Outgoing, Transition};

use crate::chat::{ChatTransport, Event};
use crate::commerce::Commerce;
use crate::error::BotError;
use crate::store::StateStore;

/// Events that don't map onto the conversation.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The user never sent `/start`.
    #[error("No conversation state for this user")]
    NoState,

    /// The store holds a tag that isn't a conversation state.
    #[error("Unknown conversation state tag: {0:?}")]
    UnknownState(String),

    /// A valid action arrived in a state that doesn't accept it.
    #[error("No handler for {event} in state {state}")]
    Unhandled {
        state: ConversationState,
        event: String,
    },

    /// Button data that isn't one of ours.
    #[error("Malformed button data: {0:?}")]
    MalformedAction(String),
}

/// Drives the conversation for every user.
#[derive(Debug)]
pub struct Controller<C, T, S> {
    commerce: C,
    transport: T,
    store: S,
    catalog: Catalog,
}

impl<C, T, S> Controller<C, T, S>
where
    C: Commerce,
    T: ChatTransport,
    S: StateStore,
{
    pub const fn new(commerce: C, transport: T, store: S, catalog: Catalog) -> Self {
        Self {
            commerce,
            transport,
            store,
            catalog,
        }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub const fn commerce(&self) -> &C {
        &self.commerce
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Handle one inbound event.
    ///
    /// # Errors
    ///
    /// Returns a routing error for events the conversation doesn't accept,
    /// or the first backend, transport or store failure. The user's state is
    /// left untouched on error.
    #[instrument(skip(self, event), fields(user = %event.user, event = %event.kind))]
    pub async fn handle(&self, event: &Event) -> Result<(), BotError> {
        let action = Action::from_event(&event.kind)?;

        let transition = if action == Action::Start {
            screens::menu(&self.catalog)
        } else {
            let state = self.current_state(event).await?;
            self.dispatch(state, action, event).await?
        };

        self.apply(event, transition).await
    }

    async fn current_state(&self, event: &Event) -> Result<ConversationState, BotError> {
        let tag = self
            .store
            .get(event.user)
            .await?
            .ok_or(RoutingError::NoState)?;

        tag.parse::<ConversationState>()
            .map_err(|e| RoutingError::UnknownState(e.0).into())
    }

    async fn dispatch(
        &self,
        state: ConversationState,
        action: Action,
        event: &Event,
    ) -> Result<Transition, BotError> {
        use Action::{Button, Text};
        use ConversationState::{Cart, Checkout, Menu, Product};

        let cart = CartId::from(event.user);

        match (state, action) {
            (Menu, Button(Callback::Product(product))) => self.product_card(&product).await,
            (Product, Button(Callback::Add(product, quantity))) => {
                self.commerce.add_to_cart(&cart, &product, quantity).await?;
                tracing::info!(product = %product, quantity = %quantity, "Added to cart");
                self.product_card(&product).await
            }

            (Menu | Product, Button(Callback::Cart)) => self.cart_view(&cart).await,
            (Cart, Button(Callback::Remove(item))) => {
                self.commerce.remove_from_cart(&cart, &item).await?;
                tracing::info!(item = %item, "Removed from cart");
                self.cart_view(&cart).await
            }

            (Product | Cart, Button(Callback::Menu)) => Ok(screens::menu(&self.catalog)),
            (Cart, Button(Callback::Checkout)) => Ok(screens::checkout_prompt()),
            (Checkout, Text(text)) => self.checkout(&text, &event.sender_name).await,

            (state, action) => Err(RoutingError::Unhandled {
                state,
                event: action.to_string(),
            }
            .into()),
        }
    }

    async fn product_card(&self, id: &ProductId) -> Result<Transition, BotError> {
        let product = self.commerce.get_product(id).await?;
        let image_url = match &product.main_image {
            Some(file) => Some(self.commerce.get_file_link(file).await?),
            None => None,
        };
        Ok(screens::product_card(&product, image_url))
    }

    async fn cart_view(&self, cart: &CartId) -> Result<Transition, BotError> {
        let cart = self.commerce.get_cart_items(cart).await?;
        Ok(screens::cart_view(&cart))
    }

    async fn checkout(&self, text: &str, name: &str) -> Result<Transition, BotError> {
        let Ok(email) = Email::parse(text) else {
            tracing::debug!("Checkout text is not an email address");
            return Ok(screens::invalid_email());
        };

        if self.commerce.find_customer(&email).await?.is_empty() {
            let customer = self.commerce.create_customer(name, &email).await?;
            tracing::info!(customer = %customer, "Registered customer at checkout");
        } else {
            tracing::info!("Customer already registered");
        }

        Ok(screens::checkout_complete(&self.catalog))
    }

    async fn apply(&self, event: &Event, transition: Transition) -> Result<(), BotError> {
        if transition.replace_prior
            && let Some(message) = event.message
        {
            if let Err(error) = self.transport.delete_message(event.chat, message).await {
                tracing::warn!(error = %error, message = %message, "Could not delete prior screen");
            }
        }

        for message in &transition.messages {
            match message {
                Outgoing::Text { text, keyboard } => {
                    self.transport
                        .send_text(event.chat, text, keyboard.as_ref())
                        .await?;
                }
                Outgoing::Photo {
                    url,
                    caption,
                    keyboard,
                } => {
                    self.transport
                        .send_photo(event.chat, url, caption, keyboard.as_ref())
                        .await?;
                }
            }
        }

        self.store.set(event.user, transition.next).await?;
        Ok(())
    }
}
