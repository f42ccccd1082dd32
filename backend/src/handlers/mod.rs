//! HTTP request handlers

pub mod auth;
pub mod exchange_rate;
pub mod health;
pub mod market_price;
pub mod order;
pub mod prediction;
pub mod product;
pub mod profile;
pub mod review;

pub use auth::{login, refresh, register};
pub use exchange_rate::get_exchange_rate;
pub use health::health_check;
pub use order::{create_order, farmer_orders, my_orders};
pub use product::{
    create_product, delete_product, farmer_dashboard, get_product, list_products, my_products,
    update_product,
};
pub use profile::{get_profile, update_profile};
pub use review::{add_review, list_reviews};
