//! # RTNY Testing
//!
//! Testing utilities for the promo engine.
//!
//! This crate provides:
//! - `FixedClock`: deterministic time
//! - `InMemoryCatalogStore`: catalog store backed by a `HashMap`
//! - `fixtures`: ready-made promo codes
//!
//! ## Example
//!
//! ```ignore
//! use rtny_core::promo::{PromoValidator, ValidationRequest};
//! use rtny_testing::{fixtures, test_clock, InMemoryCatalogStore};
//!
//! #[tokio::test]
//! async fn test_checkout_discount() {
//!     let event_id = EventId::new();
//!     let store = InMemoryCatalogStore::new()
//!         .with_event(event_id, Money::from_cents(4_000))
//!         .with_promo_code(fixtures::percentage_code("SPRING25", 25.0));
//!
//!     let validator = PromoValidator::new(store, test_clock());
//!     let result = validator
//!         .validate(&ValidationRequest::new("spring25", event_id, TicketQuantity::new(1)?))
//!         .await?;
//!     assert!(result.is_valid());
//! }
//! ```

use chrono::{DateTime, Utc};
use rtny_core::environment::Clock;

pub mod store;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use rtny_testing::mocks::FixedClock;
    /// use rtny_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Ready-made promo codes.
///
/// Every fixture is active, unlimited in scope, has 100 uses and no dates.
/// Adjust fields on the returned value for the scenario under test.
pub mod fixtures {
    use super::mocks::test_clock;
    use rtny_core::environment::Clock;
    use rtny_core::types::{Discount, Money, Percent, PromoCode, PromoCodeId};

    /// A fixed-amount code worth `cents`.
    #[must_use]
    pub fn fixed_code(code: &str, cents: u64) -> PromoCode {
        base(code, Discount::Fixed { amount: Money::from_cents(cents) })
    }

    /// A percentage code worth `percent` (e.g. `25.0`).
    #[must_use]
    pub fn percentage_code(code: &str, percent: f64) -> PromoCode {
        base(
            code,
            Discount::Percentage { percent: Percent::from_percentage(percent) },
        )
    }

    fn base(code: &str, discount: Discount) -> PromoCode {
        let now = test_clock().now();
        PromoCode {
            id: PromoCodeId::new(),
            code: code.to_uppercase(),
            name: format!("{code} promotion"),
            description: None,
            active: true,
            discount,
            max_discount_amount: None,
            max_uses: 100,
            current_uses: 0,
            starts_at: None,
            expires_at: None,
            applies_to_all_events: true,
            specific_event_ids: Vec::new(),
            tier_restrictions: Vec::new(),
            campaign_name: None,
            campaign_source: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Install a `tracing` subscriber for test output.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use store::InMemoryCatalogStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_fixtures_are_uppercased() {
        assert_eq!(fixtures::fixed_code("save10", 1_000).code, "SAVE10");
    }
}
