//! Core types for storebot.
//!
//! This module provides type-safe wrappers for the domain concepts the bot
//! passes between the chat transport, the conversation controller and the
//! commerce backend.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod email;
pub mod id;
pub mod state;

pub use cart::{Cart, CartItem};
pub use catalog::{Product, ProductSummary, Quantity, QuantityError};
pub use customer::Customer;
pub use email::{Email, EmailError};
pub use id::*;
pub use state::{ConversationState, UnknownStateTag};
