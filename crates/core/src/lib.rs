//! Storebot Core - Shared types library.
//!
//! This crate provides the types shared by the storebot components:
//! - `storebot` - The chat storefront bot (library and binary)
//! - `storebot-cli` - Operator tools for migrations and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything the bot shows a user is rendered here so
//! it can be tested without a chat client or a commerce backend.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, emails, catalog/cart/customer snapshots and the
//!   conversation state
//! - [`format`] - Text rendering for product cards and cart views

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod types;

pub use format::{format_cart, format_product_caption};
pub use types::*;
