//! Route definitions for the Farm Marketplace

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, optional_auth_middleware},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - own profile
        .nest("/profile", profile_routes(state.clone()))
        // Public listing, farmer management, consumer reviews
        .nest("/products", product_routes(state.clone()))
        // Protected routes - orders
        .nest("/orders", order_routes(state.clone()))
        // Public routes - recorded market prices
        .nest("/market-prices", market_price_routes())
        // Public routes - forecasts (farmers see yields)
        .nest("/predictions", prediction_routes(state))
        .route("/exchange-rate", get(handlers::get_exchange_rate))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Profile routes (protected)
fn profile_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product routes
fn product_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(handlers::list_products))
        .route("/:product_id", get(handlers::get_product))
        .route("/:product_id/reviews", get(handlers::list_reviews));

    let protected = Router::new()
        .route("/", post(handlers::create_product))
        .route("/mine", get(handlers::my_products))
        .route("/dashboard", get(handlers::farmer_dashboard))
        .route(
            "/:product_id",
            put(handlers::update_product).delete(handlers::delete_product),
        )
        .route("/:product_id/reviews", post(handlers::add_review))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Order routes (protected)
fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_order))
        .route("/mine", get(handlers::my_orders))
        .route("/farmer", get(handlers::farmer_orders))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Market price routes (public)
fn market_price_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::market_price::list_market_prices))
        .route("/categories", get(handlers::market_price::list_categories))
        .route("/products", get(handlers::market_price::list_products))
}

/// Prediction routes (public, with optional authentication)
fn prediction_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/crops", get(handlers::prediction::list_crops))
        .route("/crops/:crop_id", get(handlers::prediction::get_crop))
        .route("/crops/:crop_id/price", get(handlers::prediction::predict_price))
        .route("/crops/:crop_id/forecast", get(handlers::prediction::forecast))
        .route("/crops/:crop_id/export", get(handlers::prediction::export_forecast))
        .route_layer(middleware::from_fn_with_state(
            state,
            optional_auth_middleware,
        ))
}
