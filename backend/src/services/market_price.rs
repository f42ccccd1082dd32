//! Recorded market price lookups

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use shared::MarketPrice;

/// Market price service
#[derive(Clone)]
pub struct MarketPriceService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct MarketPriceRow {
    id: Uuid,
    product_name: String,
    category: String,
    price: Decimal,
    recorded_date: NaiveDate,
}

impl From<MarketPriceRow> for MarketPrice {
    fn from(row: MarketPriceRow) -> Self {
        MarketPrice {
            id: row.id,
            product_name: row.product_name,
            category: row.category,
            price: row.price,
            recorded_date: row.recorded_date,
        }
    }
}

/// Query for recorded prices; both filters are optional
#[derive(Debug, Default, Deserialize)]
pub struct MarketPriceQuery {
    pub product_name: Option<String>,
    pub category: Option<String>,
}

impl MarketPriceService {
    /// Create a new MarketPriceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Recorded prices, oldest first
    pub async fn historical_prices(&self, query: &MarketPriceQuery) -> AppResult<Vec<MarketPrice>> {
        let rows = sqlx::query_as::<_, MarketPriceRow>(
            r#"
            SELECT id, product_name, category, price, recorded_date
            FROM market_prices
            WHERE ($1::text IS NULL OR product_name = $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY recorded_date ASC
            "#,
        )
        .bind(&query.product_name)
        .bind(&query.category)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(MarketPrice::from).collect())
    }

    /// Distinct categories with recorded prices
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM market_prices ORDER BY category",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Distinct product names, optionally within one category
    pub async fn products_by_category(&self, category: Option<&str>) -> AppResult<Vec<String>> {
        let products = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT product_name
            FROM market_prices
            WHERE ($1::text IS NULL OR category = $1)
            ORDER BY product_name
            "#,
        )
        .bind(category)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }
}
