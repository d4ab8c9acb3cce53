//! Promo validator tests against the in-memory catalog.
//!
//! Covers the checkout rules end to end: lookup, eligibility order, pricing,
//! and redemption under concurrency.
//!
//! Run with: `cargo test -p rtny-core --test validator_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use chrono::Duration;
use rtny_core::environment::Clock;
use rtny_core::error::PromoError;
use rtny_core::promo::{PromoValidator, Rejection, ValidationRequest, ValidationResult};
use rtny_core::store::{CatalogStore, RedemptionOutcome};
use rtny_core::types::{EventId, MembershipTier, Money, PromoCode, TicketQuantity};
use rtny_testing::{fixtures, init_test_tracing, test_clock, FixedClock, InMemoryCatalogStore};
use std::future::Future;
use std::sync::Arc;

fn qty(n: i64) -> TicketQuantity {
    TicketQuantity::new(n).expect("positive quantity")
}

fn validator(store: &InMemoryCatalogStore) -> PromoValidator<InMemoryCatalogStore, FixedClock> {
    init_test_tracing();
    PromoValidator::new(store.clone(), test_clock())
}

fn priced(result: ValidationResult) -> (Money, Money, Money) {
    match result {
        ValidationResult::Valid(p) => (p.original_price, p.discount_amount, p.final_price),
        ValidationResult::Rejected(reason) => panic!("expected valid result, got {reason}"),
    }
}

#[tokio::test]
async fn test_code_matching_is_case_insensitive() {
    let event_id = EventId::new();
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(2_000))
        .with_promo_code(fixtures::fixed_code("SAVE10", 1_000));
    let validator = validator(&store);

    let lower = validator
        .validate(&ValidationRequest::new("save10", event_id, qty(2)))
        .await
        .unwrap();
    let upper = validator
        .validate(&ValidationRequest::new("SAVE10", event_id, qty(2)))
        .await
        .unwrap();

    assert_eq!(lower, upper);
    assert_eq!(
        priced(lower),
        (Money::from_cents(4_000), Money::from_cents(1_000), Money::from_cents(3_000))
    );
}

#[tokio::test]
async fn test_unknown_and_empty_codes_are_invalid() {
    let store = InMemoryCatalogStore::new();
    let validator = validator(&store);

    for code in ["NOPE", "", "   "] {
        let result = validator
            .validate(&ValidationRequest::new(code, EventId::new(), qty(1)))
            .await
            .unwrap();
        assert_eq!(result, ValidationResult::Rejected(Rejection::InvalidCode));
    }
    // Blank codes never reach the catalog
    assert_eq!(store.promo_lookups(), 1);
}

#[tokio::test]
async fn test_inactive_code_is_invalid_regardless_of_other_fields() {
    let event_id = EventId::new();
    let mut promo = fixtures::percentage_code("GONE", 50.0);
    promo.active = false;
    promo.expires_at = Some(test_clock().now() - Duration::days(30));
    promo.current_uses = promo.max_uses;
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(promo);

    let result = validator(&store)
        .validate(&ValidationRequest::new("gone", event_id, qty(1)))
        .await
        .unwrap();

    assert_eq!(result.rejection(), Some(Rejection::InvalidCode));
    assert_eq!(result.rejection().map(|r| r.message()), Some("Invalid promo code"));
}

#[tokio::test]
async fn test_expired_code_rejected_even_when_everything_else_passes() {
    let event_id = EventId::new();
    let mut promo = fixtures::fixed_code("LATE", 500);
    promo.expires_at = Some(test_clock().now() - Duration::seconds(1));
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(promo);

    let result = validator(&store)
        .validate(&ValidationRequest::new("LATE", event_id, qty(1)))
        .await
        .unwrap();

    assert_eq!(result, ValidationResult::Rejected(Rejection::Expired));
    assert_eq!(store.event_lookups(), 0);
}

#[tokio::test]
async fn test_code_not_started_yet() {
    let event_id = EventId::new();
    let mut promo = fixtures::fixed_code("SOON", 500);
    promo.starts_at = Some(test_clock().now() + Duration::days(1));
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(promo);

    let result = validator(&store)
        .validate(&ValidationRequest::new("SOON", event_id, qty(1)))
        .await
        .unwrap();

    assert_eq!(result.rejection(), Some(Rejection::NotYetActive));
}

#[tokio::test]
async fn test_usage_limit_uses_requested_quantity() {
    let event_id = EventId::new();
    let mut promo = fixtures::fixed_code("TEN", 100);
    promo.max_uses = 10;
    promo.current_uses = 8;
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(promo);
    let validator = validator(&store);

    let three = validator
        .validate(&ValidationRequest::new("TEN", event_id, qty(3)))
        .await
        .unwrap();
    let two = validator
        .validate(&ValidationRequest::new("TEN", event_id, qty(2)))
        .await
        .unwrap();

    assert_eq!(three.rejection(), Some(Rejection::UsageLimitExceeded));
    assert!(two.is_valid());
}

#[tokio::test]
async fn test_event_restricted_code() {
    let e1 = EventId::new();
    let e2 = EventId::new();
    let mut promo = fixtures::fixed_code("E1ONLY", 100);
    promo.applies_to_all_events = false;
    promo.specific_event_ids = vec![e1];
    let store = InMemoryCatalogStore::new()
        .with_event(e1, Money::from_cents(1_000))
        .with_event(e2, Money::from_cents(1_000))
        .with_promo_code(promo);
    let validator = validator(&store);

    let other = validator
        .validate(&ValidationRequest::new("E1ONLY", e2, qty(1)))
        .await
        .unwrap();
    let listed = validator
        .validate(&ValidationRequest::new("E1ONLY", e1, qty(1)))
        .await
        .unwrap();

    assert_eq!(other.rejection(), Some(Rejection::NotValidForEvent));
    assert_eq!(
        other.rejection().map(|r| r.to_string()),
        Some("Promo code not valid for this event".to_string())
    );
    assert!(listed.is_valid());
}

#[tokio::test]
async fn test_tier_restricted_code() {
    let event_id = EventId::new();
    let mut promo = fixtures::percentage_code("CREW", 100.0);
    promo.tier_restrictions = vec![MembershipTier::Team];
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(3_000))
        .with_promo_code(promo);
    let validator = validator(&store);

    let request = ValidationRequest::new("crew", event_id, qty(1));
    let basic = validator
        .validate(&request.clone().with_tier(MembershipTier::Basic))
        .await
        .unwrap();
    let team = validator
        .validate(&request.clone().with_tier(MembershipTier::Team))
        .await
        .unwrap();

    assert_eq!(basic.rejection(), Some(Rejection::NotValidForTier));
    assert_eq!(
        priced(team),
        (Money::from_cents(3_000), Money::from_cents(3_000), Money::ZERO)
    );
}

#[tokio::test]
async fn test_tier_restrictions_ignored_when_no_tier_given() {
    let event_id = EventId::new();
    let mut promo = fixtures::fixed_code("SAVE10", 1_000);
    promo.tier_restrictions = vec![MembershipTier::Basic];
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(2_000))
        .with_promo_code(promo);

    let result = validator(&store)
        .validate(&ValidationRequest::new("save10", event_id, qty(2)))
        .await
        .unwrap();

    assert_eq!(
        priced(result),
        (Money::from_cents(4_000), Money::from_cents(1_000), Money::from_cents(3_000))
    );
}

#[tokio::test]
async fn test_max_discount_amount_does_not_cap_percentage() {
    let event_id = EventId::new();
    let mut promo = fixtures::percentage_code("QUARTER", 25.0);
    promo.max_discount_amount = Some(Money::from_cents(100));
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(4_000))
        .with_promo_code(promo);

    let result = validator(&store)
        .validate(&ValidationRequest::new("quarter", event_id, qty(1)))
        .await
        .unwrap();

    assert_eq!(
        priced(result),
        (Money::from_cents(4_000), Money::from_cents(1_000), Money::from_cents(3_000))
    );
}

#[tokio::test]
async fn test_fixed_discount_larger_than_total_is_clamped() {
    let event_id = EventId::new();
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(fixtures::fixed_code("BIG50", 5_000));

    let result = validator(&store)
        .validate(&ValidationRequest::new("BIG50", event_id, qty(2)))
        .await
        .unwrap();

    assert_eq!(
        priced(result),
        (Money::from_cents(2_000), Money::from_cents(2_000), Money::ZERO)
    );
}

#[tokio::test]
async fn test_percentage_discount() {
    let event_id = EventId::new();
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(4_000))
        .with_promo_code(fixtures::percentage_code("QUARTER", 25.0));

    let result = validator(&store)
        .validate(&ValidationRequest::new("quarter", event_id, qty(1)))
        .await
        .unwrap();

    assert_eq!(
        priced(result),
        (Money::from_cents(4_000), Money::from_cents(1_000), Money::from_cents(3_000))
    );
}

#[tokio::test]
async fn test_unknown_event_after_code_checks() {
    let store = InMemoryCatalogStore::new().with_promo_code(fixtures::fixed_code("SAVE10", 1_000));

    let result = validator(&store)
        .validate(&ValidationRequest::new("SAVE10", EventId::new(), qty(1)))
        .await
        .unwrap();

    assert_eq!(result.rejection(), Some(Rejection::EventNotFound));
    assert_eq!(store.event_lookups(), 1);
}

#[tokio::test]
async fn test_store_failure_is_an_error_not_a_rejection() {
    let store = InMemoryCatalogStore::new().with_promo_code(fixtures::fixed_code("SAVE10", 1_000));
    store.set_unavailable(true);

    let result = validator(&store)
        .validate(&ValidationRequest::new("SAVE10", EventId::new(), qty(1)))
        .await;

    assert!(matches!(result, Err(PromoError::Store(_))));
}

#[tokio::test]
async fn test_validation_does_not_consume_uses() {
    let event_id = EventId::new();
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(fixtures::fixed_code("SAVE10", 1_000));
    let validator = validator(&store);

    for _ in 0..5 {
        validator
            .validate(&ValidationRequest::new("SAVE10", event_id, qty(4)))
            .await
            .unwrap();
    }

    assert_eq!(store.promo_code("SAVE10").unwrap().current_uses, 0);
}

#[tokio::test]
async fn test_redeem_records_usage() {
    let event_id = EventId::new();
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(fixtures::fixed_code("SAVE10", 1_000));

    let result = validator(&store)
        .redeem(&ValidationRequest::new("save10", event_id, qty(3)))
        .await
        .unwrap();

    match result {
        ValidationResult::Valid(p) => assert_eq!(p.promo_code.current_uses, 3),
        ValidationResult::Rejected(reason) => panic!("unexpected rejection: {reason}"),
    }
    assert_eq!(store.promo_code("SAVE10").unwrap().current_uses, 3);
}

#[tokio::test]
async fn test_concurrent_redemptions_never_exceed_max_uses() {
    let event_id = EventId::new();
    let mut promo = fixtures::fixed_code("RUSH", 500);
    promo.max_uses = 10;
    let store = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(promo);
    let validator = Arc::new(validator(&store));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let validator = Arc::clone(&validator);
            tokio::spawn(async move {
                validator
                    .redeem(&ValidationRequest::new("RUSH", event_id, qty(3)))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_valid() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 3);
    assert_eq!(store.promo_code("RUSH").unwrap().current_uses, 9);
}

/// Serves reads from an older snapshot while writes hit the live catalog,
/// like a code deactivated between validation and redemption.
struct StaleReads {
    snapshot: InMemoryCatalogStore,
    live: InMemoryCatalogStore,
}

impl CatalogStore for StaleReads {
    fn fetch_active_promo_code(
        &self,
        code: &str,
    ) -> impl Future<Output = rtny_core::Result<Option<PromoCode>>> + Send {
        self.snapshot.fetch_active_promo_code(code)
    }

    fn fetch_event_price(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = rtny_core::Result<Option<Money>>> + Send {
        self.snapshot.fetch_event_price(event_id)
    }

    fn record_redemption(
        &self,
        code: &str,
        quantity: TicketQuantity,
    ) -> impl Future<Output = rtny_core::Result<RedemptionOutcome>> + Send {
        self.live.record_redemption(code, quantity)
    }

    fn ping(&self) -> impl Future<Output = rtny_core::Result<()>> + Send {
        self.live.ping()
    }
}

#[tokio::test]
async fn test_redeem_of_code_deactivated_after_validation_is_invalid() {
    init_test_tracing();
    let event_id = EventId::new();
    let snapshot = InMemoryCatalogStore::new()
        .with_event(event_id, Money::from_cents(1_000))
        .with_promo_code(fixtures::fixed_code("FLASH", 500));
    let mut withdrawn = fixtures::fixed_code("FLASH", 500);
    withdrawn.active = false;
    let live = InMemoryCatalogStore::new().with_promo_code(withdrawn);

    let validator = PromoValidator::new(
        StaleReads { snapshot, live: live.clone() },
        test_clock(),
    );
    let result = validator
        .redeem(&ValidationRequest::new("flash", event_id, qty(1)))
        .await
        .unwrap();

    assert_eq!(result.rejection(), Some(Rejection::InvalidCode));
    assert_eq!(live.promo_code("FLASH").unwrap().current_uses, 0);
}
