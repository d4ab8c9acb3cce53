//! PostgreSQL catalog store implementation.
//!
//! Reads promo codes and event prices from the catalog tables and performs the
//! conditional usage increment used at order finalization.
//!
//! # Concurrency
//!
//! `record_redemption` is a single `UPDATE ... WHERE current_uses + $2 <=
//! max_uses`. Row-level locking inside `PostgreSQL` serializes concurrent
//! increments on the same code, so the ceiling holds without an explicit
//! transaction. When the update matches no row, a follow-up read only decides
//! which outcome to report; it never writes.

use crate::rows::{cents, counter, PromoCodeRow, PROMO_CODE_COLUMNS};
use rtny_core::error::{PromoError, Result};
use rtny_core::store::{CatalogStore, RedemptionOutcome};
use rtny_core::types::{normalize_code, EventId, Money, PromoCode, TicketQuantity};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// PostgreSQL catalog store.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct PostgresCatalogStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Create a store over an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with a pool of at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Store` if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| PromoError::Store(format!("Failed to connect: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Store` if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PromoError::Store(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Classify a conditional increment that matched no row.
    async fn unmatched_redemption(&self, code: &str) -> Result<RedemptionOutcome> {
        let active: Option<(bool,)> = sqlx::query_as("SELECT active FROM promo_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PromoError::Store(format!("Failed to get promo code: {e}")))?;

        Ok(match active {
            Some((true,)) => RedemptionOutcome::LimitReached,
            Some((false,)) | None => RedemptionOutcome::Inactive,
        })
    }
}

impl CatalogStore for PostgresCatalogStore {
    async fn fetch_active_promo_code(&self, code: &str) -> Result<Option<PromoCode>> {
        let query = format!(
            "SELECT {PROMO_CODE_COLUMNS} FROM promo_codes WHERE code = $1 AND active = TRUE"
        );

        let row: Option<PromoCodeRow> = sqlx::query_as(&query)
            .bind(normalize_code(code))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PromoError::Store(format!("Failed to get promo code: {e}")))?;

        row.map(PromoCode::try_from).transpose()
    }

    async fn fetch_event_price(&self, event_id: EventId) -> Result<Option<Money>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT ROUND(ticket_price * 100)::BIGINT FROM events WHERE id = $1",
        )
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PromoError::Store(format!("Failed to get event price: {e}")))?;

        row.map(|(price,)| cents("ticket_price", price)).transpose()
    }

    async fn record_redemption(
        &self,
        code: &str,
        quantity: TicketQuantity,
    ) -> Result<RedemptionOutcome> {
        let quantity = i32::try_from(quantity.get())
            .map_err(|_| PromoError::InvalidQuantity(i64::from(quantity.get())))?;

        let normalized = normalize_code(code);

        // Compare in BIGINT so a counter near i32::MAX cannot overflow.
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE promo_codes
             SET current_uses = current_uses + $2, updated_at = NOW()
             WHERE code = $1 AND active = TRUE
               AND current_uses::BIGINT + $2::BIGINT <= max_uses::BIGINT
             RETURNING current_uses",
        )
        .bind(&normalized)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PromoError::Store(format!("Failed to record redemption: {e}")))?;

        let outcome = match row {
            Some((current_uses,)) => RedemptionOutcome::Recorded {
                current_uses: counter("current_uses", current_uses)?,
            },
            None => self.unmatched_redemption(&normalized).await?,
        };

        let label = match outcome {
            RedemptionOutcome::Recorded { .. } => "recorded",
            RedemptionOutcome::LimitReached => {
                tracing::debug!(code = %code, quantity, "Usage increment would exceed max_uses");
                "limit_reached"
            }
            RedemptionOutcome::Inactive => {
                tracing::debug!(code = %code, quantity, "Usage increment on missing or inactive code");
                "inactive"
            }
        };
        metrics::counter!("rtny_promo_redemption_writes_total", "outcome" => label).increment(1);

        Ok(outcome)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| PromoError::Store(format!("Ping failed: {e}")))?;
        Ok(())
    }
}
