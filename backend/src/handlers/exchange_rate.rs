//! Exchange rate handler

use axum::{extract::State, Json};

use crate::external::ExchangeRate;
use crate::AppState;

/// Current USD to INR rate
pub async fn get_exchange_rate(State(state): State<AppState>) -> Json<ExchangeRate> {
    Json(state.exchange_rate.current_rate().await)
}
