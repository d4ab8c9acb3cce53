//! Catalog store trait.

use crate::error::Result;
use crate::types::{EventId, Money, PromoCode, TicketQuantity};

/// Outcome of an attempt to record a redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedemptionOutcome {
    /// Usage was incremented; carries the new `current_uses`.
    Recorded {
        /// Counter value after the increment
        current_uses: u32,
    },
    /// The increment would have pushed the code past `max_uses`. Nothing was
    /// written.
    LimitReached,
    /// The code no longer exists or was deactivated after it was read.
    /// Nothing was written.
    Inactive,
}

/// Catalog store.
///
/// This trait abstracts over the external catalog holding promo codes and
/// events (`PostgreSQL` in production, in-memory in tests).
///
/// # Implementation Notes
///
/// - Lookups are snapshots: `current_uses` may be stale by the time the caller
///   acts on it.
/// - `record_redemption` is the only write and must be a single atomic
///   conditional increment. It is the authoritative usage-limit check.
pub trait CatalogStore: Send + Sync {
    /// Fetch an active promo code by its normalized (uppercased) code.
    ///
    /// # Returns
    ///
    /// `None` if no active code matches.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Store` if the catalog is unreachable or the
    /// record cannot be decoded.
    fn fetch_active_promo_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<PromoCode>>> + Send;

    /// Fetch the per-ticket price of an event.
    ///
    /// # Returns
    ///
    /// `None` if the event does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Store` if the catalog is unreachable.
    fn fetch_event_price(
        &self,
        event_id: EventId,
    ) -> impl std::future::Future<Output = Result<Option<Money>>> + Send;

    /// Atomically add `quantity` to the code's usage counter, only if the
    /// result stays within `max_uses` and the code is still active.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Store` if the catalog is unreachable.
    fn record_redemption(
        &self,
        code: &str,
        quantity: TicketQuantity,
    ) -> impl std::future::Future<Output = Result<RedemptionOutcome>> + Send;

    /// Connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Store` if the catalog cannot be reached.
    fn ping(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<S: CatalogStore> CatalogStore for std::sync::Arc<S> {
    fn fetch_active_promo_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<PromoCode>>> + Send {
        (**self).fetch_active_promo_code(code)
    }

    fn fetch_event_price(
        &self,
        event_id: EventId,
    ) -> impl std::future::Future<Output = Result<Option<Money>>> + Send {
        (**self).fetch_event_price(event_id)
    }

    fn record_redemption(
        &self,
        code: &str,
        quantity: TicketQuantity,
    ) -> impl std::future::Future<Output = Result<RedemptionOutcome>> + Send {
        (**self).record_redemption(code, quantity)
    }

    fn ping(&self) -> impl std::future::Future<Output = Result<()>> + Send {
        (**self).ping()
    }
}
