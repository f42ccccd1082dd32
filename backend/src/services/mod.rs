//! Business logic services for the Farm Marketplace

pub mod auth;
pub mod market_price;
pub mod order;
pub mod prediction;
pub mod product;
pub mod profile;
pub mod review;

pub use auth::AuthService;
pub use market_price::MarketPriceService;
pub use order::OrderService;
pub use prediction::PredictionService;
pub use product::ProductService;
pub use profile::ProfileService;
pub use review::ReviewService;
