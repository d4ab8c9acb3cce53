//! # RTNY Core
//!
//! Promo-code validation and pricing for the RTNY ticketing platform.
//!
//! Everything that is not a business rule lives behind the [`store::CatalogStore`]
//! trait: promo-code records, event prices and the usage counter are owned by an
//! external catalog. This crate only reads a snapshot of them, decides whether a
//! code applies, and prices the order.
//!
//! ## Validation Order
//!
//! ```text
//! normalize code ─► active code? ─► started? ─► expired? ─► usage limit?
//!                                                                │
//!     priced result ◄─ discount ◄─ event price? ◄─ tier? ◄─ event scope?
//! ```
//!
//! Each step short-circuits with a [`promo::Rejection`]. Rejections are values,
//! not errors: only catalog failures surface as [`error::PromoError`].
//!
//! ## Example
//!
//! ```ignore
//! use rtny_core::environment::SystemClock;
//! use rtny_core::promo::{PromoValidator, ValidationRequest};
//! use rtny_core::types::{EventId, TicketQuantity};
//!
//! let validator = PromoValidator::new(store, SystemClock);
//! let request = ValidationRequest::new("save10", event_id, TicketQuantity::new(2)?);
//!
//! match validator.validate(&request).await? {
//!     ValidationResult::Valid(priced) => println!("pay {}", priced.final_price),
//!     ValidationResult::Rejected(reason) => println!("{reason}"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod environment;
pub mod error;
pub mod promo;
pub mod store;
pub mod types;

pub use environment::{Clock, SystemClock};
pub use error::{PromoError, Result};
pub use promo::{PricedPromo, PromoValidator, Rejection, ValidationRequest, ValidationResult};
pub use store::{CatalogStore, RedemptionOutcome};
pub use types::{
    Discount, EventId, MembershipTier, Money, Percent, PromoCode, PromoCodeId, TicketQuantity,
};
