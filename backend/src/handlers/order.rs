//! Order handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{CreateOrderInput, FarmerOrderItem, OrderWithItems};
use crate::services::OrderService;
use crate::AppState;

/// Place an order
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderWithItems>)> {
    user.require_consumer()?;

    let service = OrderService::new(state.db.clone());
    let order = service.create_order(user.profile_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The signed-in consumer's orders
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    user.require_consumer()?;

    let service = OrderService::new(state.db.clone());
    let orders = service.my_orders(user.profile_id).await?;
    Ok(Json(orders))
}

/// Order lines for the signed-in farmer's products
pub async fn farmer_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<FarmerOrderItem>>> {
    user.require_farmer()?;

    let service = OrderService::new(state.db.clone());
    let items = service.orders_for_farmer(user.profile_id).await?;
    Ok(Json(items))
}
