//! Domain models for the Farm Marketplace

mod crop;
mod order;
mod product;
mod review;
mod user;

pub use crop::*;
pub use order::*;
pub use product::*;
pub use review::*;
pub use user::*;
