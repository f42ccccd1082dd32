//! Review handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::review::{AddReviewInput, ProductReviews};
use crate::services::ReviewService;
use crate::AppState;
use shared::Review;

/// Reviews of a product
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductReviews>> {
    let service = ReviewService::new(state.db.clone());
    let reviews = service.product_reviews(product_id).await?;
    Ok(Json(reviews))
}

/// Review a product
pub async fn add_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<AddReviewInput>,
) -> AppResult<(StatusCode, Json<Review>)> {
    user.require_consumer()?;

    let service = ReviewService::new(state.db.clone());
    let review = service.add_review(user.profile_id, product_id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
