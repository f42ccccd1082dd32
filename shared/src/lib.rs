//! Shared types and models for the Farm Marketplace
//!
//! This crate contains the domain models, the crop price forecaster and the
//! validation rules shared between the backend and the browser (via WASM).

pub mod catalog;
pub mod currency;
pub mod forecast;
pub mod models;
pub mod types;
pub mod validation;

pub use catalog::*;
pub use currency::*;
pub use forecast::*;
pub use models::*;
pub use types::*;
pub use validation::*;
