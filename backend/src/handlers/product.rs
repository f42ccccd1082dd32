//! Product handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{
    CreateProductInput, FarmerDashboard, ProductDetail, ProductFilter, ProductListing,
    UpdateProductInput,
};
use crate::services::ProductService;
use crate::AppState;
use shared::{PaginatedResponse, Pagination, Product};

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// List marketplace products
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<PaginatedResponse<ProductListing>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = ProductFilter {
        category: query.category,
        search: query.search,
    };

    let service = ProductService::new(state.db.clone());
    let products = service.list(&filter, &pagination).await?;
    Ok(Json(products))
}

/// Get a product with its farmer's contact details
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductDetail>> {
    let service = ProductService::new(state.db.clone());
    let product = service.get_detail(product_id).await?;
    Ok(Json(product))
}

/// List the signed-in farmer's products
pub async fn my_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    user.require_farmer()?;

    let service = ProductService::new(state.db.clone());
    let products = service.list_by_farmer(user.profile_id).await?;
    Ok(Json(products))
}

/// Inventory totals for the signed-in farmer
pub async fn farmer_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<FarmerDashboard>> {
    user.require_farmer()?;

    let service = ProductService::new(state.db.clone());
    let dashboard = service.dashboard(user.profile_id).await?;
    Ok(Json(dashboard))
}

/// List a new product
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    user.require_farmer()?;

    let service = ProductService::new(state.db.clone());
    let product = service.create(user.profile_id, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update one of the farmer's products
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    user.require_farmer()?;

    let service = ProductService::new(state.db.clone());
    let product = service.update(user.profile_id, product_id, input).await?;
    Ok(Json(product))
}

/// Delete one of the farmer's products
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_farmer()?;

    let service = ProductService::new(state.db.clone());
    service.delete(user.profile_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
