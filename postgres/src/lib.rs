//! `PostgreSQL` catalog store for the RTNY promo engine.
//!
//! This crate provides a PostgreSQL-backed implementation of the
//! `CatalogStore` trait from `rtny-core`. It uses sqlx with runtime-checked
//! queries and supports:
//!
//! - Active promo-code lookup by normalized code
//! - Event ticket-price lookup
//! - Atomic conditional usage increments (the authoritative usage-limit check)
//! - Connection pooling and embedded migrations
//!
//! # Example
//!
//! ```ignore
//! use rtny_postgres::PostgresCatalogStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresCatalogStore::connect("postgres://localhost/rtny", 10).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
pub mod store;

pub use store::PostgresCatalogStore;
