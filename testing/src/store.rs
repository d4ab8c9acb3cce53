//! In-memory catalog store.
//!
//! Provides a fast, deterministic [`CatalogStore`] for tests:
//! - promo codes keyed by uppercased code
//! - event prices keyed by [`EventId`]
//! - a switch that makes every call fail, for infrastructure-error paths
//! - lookup counters to assert which reads happened

use rtny_core::error::{PromoError, Result};
use rtny_core::store::{CatalogStore, RedemptionOutcome};
use rtny_core::types::{normalize_code, EventId, Money, PromoCode, TicketQuantity};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory catalog store for fast, deterministic testing.
///
/// Cloning shares the underlying data, so a test can keep a handle while the
/// validator owns another.
///
/// # Example
///
/// ```
/// use rtny_core::store::CatalogStore;
/// use rtny_core::types::{EventId, Money};
/// use rtny_testing::{fixtures, InMemoryCatalogStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let event_id = EventId::new();
/// let store = InMemoryCatalogStore::new()
///     .with_event(event_id, Money::from_cents(2_500))
///     .with_promo_code(fixtures::fixed_code("SAVE5", 500));
///
/// assert!(store.fetch_active_promo_code("SAVE5").await?.is_some());
/// assert_eq!(store.fetch_event_price(event_id).await?, Some(Money::from_cents(2_500)));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalogStore {
    promo_codes: Arc<Mutex<HashMap<String, PromoCode>>>,
    events: Arc<Mutex<HashMap<EventId, Money>>>,
    unavailable: Arc<AtomicBool>,
    promo_lookups: Arc<AtomicUsize>,
    event_lookups: Arc<AtomicUsize>,
}

impl InMemoryCatalogStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a promo code (builder style)
    #[must_use]
    pub fn with_promo_code(self, promo: PromoCode) -> Self {
        self.insert_promo_code(promo);
        self
    }

    /// Add an event price (builder style)
    #[must_use]
    pub fn with_event(self, event_id: EventId, ticket_price: Money) -> Self {
        self.insert_event(event_id, ticket_price);
        self
    }

    /// Insert or replace a promo code, keyed by its uppercased code.
    pub fn insert_promo_code(&self, promo: PromoCode) {
        if let Ok(mut codes) = self.promo_codes.lock() {
            codes.insert(normalize_code(&promo.code), promo);
        }
    }

    /// Insert or replace an event price.
    pub fn insert_event(&self, event_id: EventId, ticket_price: Money) {
        if let Ok(mut events) = self.events.lock() {
            events.insert(event_id, ticket_price);
        }
    }

    /// Current stored record for `code`, active or not.
    #[must_use]
    pub fn promo_code(&self, code: &str) -> Option<PromoCode> {
        self.promo_codes
            .lock()
            .ok()
            .and_then(|codes| codes.get(&normalize_code(code)).cloned())
    }

    /// Make every subsequent call fail with `PromoError::Store`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of promo-code lookups served so far.
    #[must_use]
    pub fn promo_lookups(&self) -> usize {
        self.promo_lookups.load(Ordering::SeqCst)
    }

    /// Number of event-price lookups served so far.
    #[must_use]
    pub fn event_lookups(&self) -> usize {
        self.event_lookups.load(Ordering::SeqCst)
    }

    fn check_available(unavailable: &AtomicBool) -> Result<()> {
        if unavailable.load(Ordering::SeqCst) {
            return Err(PromoError::Store("catalog unavailable".to_string()));
        }
        Ok(())
    }
}

fn lock_failed() -> PromoError {
    PromoError::Store("Mutex lock failed".to_string())
}

impl CatalogStore for InMemoryCatalogStore {
    fn fetch_active_promo_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<PromoCode>>> + Send {
        let promo_codes = Arc::clone(&self.promo_codes);
        let unavailable = Arc::clone(&self.unavailable);
        let lookups = Arc::clone(&self.promo_lookups);
        let code = normalize_code(code);

        async move {
            Self::check_available(&unavailable)?;
            lookups.fetch_add(1, Ordering::SeqCst);

            Ok(promo_codes
                .lock()
                .map_err(|_| lock_failed())?
                .get(&code)
                .filter(|promo| promo.active)
                .cloned())
        }
    }

    fn fetch_event_price(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<Option<Money>>> + Send {
        let events = Arc::clone(&self.events);
        let unavailable = Arc::clone(&self.unavailable);
        let lookups = Arc::clone(&self.event_lookups);

        async move {
            Self::check_available(&unavailable)?;
            lookups.fetch_add(1, Ordering::SeqCst);

            Ok(events
                .lock()
                .map_err(|_| lock_failed())?
                .get(&event_id)
                .copied())
        }
    }

    fn record_redemption(
        &self,
        code: &str,
        quantity: TicketQuantity,
    ) -> impl Future<Output = Result<RedemptionOutcome>> + Send {
        let promo_codes = Arc::clone(&self.promo_codes);
        let unavailable = Arc::clone(&self.unavailable);
        let code = normalize_code(code);

        async move {
            Self::check_available(&unavailable)?;

            // Check and increment under one lock, like the conditional UPDATE.
            let mut codes = promo_codes.lock().map_err(|_| lock_failed())?;
            let Some(promo) = codes.get_mut(&code).filter(|promo| promo.active) else {
                return Ok(RedemptionOutcome::Inactive);
            };
            if !promo.has_capacity_for(quantity) {
                return Ok(RedemptionOutcome::LimitReached);
            }
            promo.current_uses += quantity.get();

            Ok(RedemptionOutcome::Recorded {
                current_uses: promo.current_uses,
            })
        }
    }

    fn ping(&self) -> impl Future<Output = Result<()>> + Send {
        let unavailable = Arc::clone(&self.unavailable);
        async move { Self::check_available(&unavailable) }
    }
}
