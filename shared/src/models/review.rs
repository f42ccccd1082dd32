//! Product review and recorded market price models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A consumer's rating of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub consumer_id: Uuid,
    /// 1 (poor) to 5 (excellent)
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recorded wholesale market price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPrice {
    pub id: Uuid,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub recorded_date: NaiveDate,
}

/// Average rating, or None when there are no ratings
pub fn average_rating<I: IntoIterator<Item = i32>>(ratings: I) -> Option<f64> {
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0u32), |(sum, count), r| (sum + i64::from(r), count + 1));
    if count == 0 {
        return None;
    }
    Some(sum as f64 / f64::from(count))
}
