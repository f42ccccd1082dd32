//! Marketplace product models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A produce listing published by a farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Profile id of the farmer who owns the listing
    pub farmer_id: Uuid,
    pub name: String,
    pub description: String,
    /// Unit price in INR
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Value of the remaining stock at the listed price
    pub fn stock_value(&self) -> Decimal {
        self.price * Decimal::from(self.quantity.max(0))
    }
}
