//! Market price handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::market_price::MarketPriceQuery;
use crate::services::MarketPriceService;
use crate::AppState;
use shared::MarketPrice;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// Recorded market prices, oldest first
pub async fn list_market_prices(
    State(state): State<AppState>,
    Query(query): Query<MarketPriceQuery>,
) -> AppResult<Json<Vec<MarketPrice>>> {
    let service = MarketPriceService::new(state.db.clone());
    let prices = service.historical_prices(&query).await?;
    Ok(Json(prices))
}

/// Categories with recorded prices
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let service = MarketPriceService::new(state.db.clone());
    let categories = service.categories().await?;
    Ok(Json(categories))
}

/// Product names with recorded prices
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<Vec<String>>> {
    let service = MarketPriceService::new(state.db.clone());
    let products = service.products_by_category(query.category.as_deref()).await?;
    Ok(Json(products))
}
