//! Marketplace orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::User;

/// Product fields embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product id.
    pub id: u64,
    /// Listing title.
    pub title: String,
    /// Unit price, sent by the backend as a decimal string.
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Image URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order id.
    pub id: u64,
    /// Buyer.
    pub buyer: User,
    /// Ordered product.
    pub product: ProductSummary,
    /// ISO-8601 order time.
    #[serde(default)]
    pub ordered_at: Option<String>,
}
