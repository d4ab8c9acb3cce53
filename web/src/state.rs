//! Application state shared by the promo handlers.

use rtny_core::{CatalogStore, Clock, PromoValidator, SystemClock};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Generic over the catalog store and clock so tests can run the real router
/// against an in-memory catalog and a fixed time. Cloning is an `Arc` bump.
pub struct AppState<S, C = SystemClock> {
    /// Promo-code validator over the catalog
    pub validator: Arc<PromoValidator<S, C>>,
}

impl<S, C> AppState<S, C> {
    /// Create a new application state.
    #[must_use]
    pub fn new(validator: PromoValidator<S, C>) -> Self {
        Self {
            validator: Arc::new(validator),
        }
    }
}

impl<S: CatalogStore, C: Clock> AppState<S, C> {
    /// Convenience constructor from a store and clock.
    #[must_use]
    pub fn from_parts(store: S, clock: C) -> Self {
        Self::new(PromoValidator::new(store, clock))
    }
}

// Manual impl: `derive(Clone)` would demand `S: Clone` and `C: Clone`.
impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
        }
    }
}
