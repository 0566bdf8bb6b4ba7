//! Customer records created at checkout.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::CustomerId;

/// A customer as returned by the commerce backend's lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
}
