//! HTTP service for RTNY promo-code validation.
//!
//! Thin Axum shell over [`rtny_core::PromoValidator`]:
//!
//! 1. **Decode** the JSON body into a `ValidationRequest` (422 on bad input)
//! 2. **Validate** or **redeem** through the validator
//! 3. **Render** the outcome as `{ valid, error | prices + promo_code }`
//!
//! Store failures become a generic `500 Server error`; details only reach the
//! logs.
//!
//! # Example
//!
//! ```ignore
//! use rtny_core::SystemClock;
//! use rtny_postgres::PostgresCatalogStore;
//! use rtny_web::{build_router, AppState};
//!
//! let store = PostgresCatalogStore::connect(&url, 10).await?;
//! let app = build_router(AppState::from_parts(store, SystemClock));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use middleware::{CorrelationId, CorrelationIdLayer, CORRELATION_ID_HEADER};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
