//! HTTP request handlers.

pub mod health;
pub mod promo;

pub use health::{health_check, readiness_check};
pub use promo::{redeem_promo, validate_promo};
