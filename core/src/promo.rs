//! Promo-code validation and pricing.
//!
//! [`PromoValidator::validate`] answers "may this code be applied to this order,
//! and what does the order cost afterwards?" It reads two records from the
//! catalog and never writes. [`PromoValidator::redeem`] runs the same checks and
//! then asks the catalog to record the usage atomically.
//!
//! # Checks
//!
//! In order, each short-circuiting:
//!
//! 1. Code exists and is active
//! 2. Start date reached
//! 3. Not expired
//! 4. `current_uses + quantity <= max_uses`
//! 5. Event is in scope
//! 6. Buyer's tier is allowed
//! 7. Event exists
//!
//! The usage check here is advisory. Two concurrent requests can both pass it;
//! only the catalog's conditional increment in `redeem` enforces the ceiling.

use crate::environment::Clock;
use crate::error::{PromoError, Result};
use crate::store::{CatalogStore, RedemptionOutcome};
use crate::types::{
    normalize_code, Discount, EventId, MembershipTier, Money, PromoCode, TicketQuantity,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Request / Result
// ============================================================================

/// Input to a validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Raw code as typed by the buyer
    pub code: String,
    /// Event the tickets are for
    pub event_id: EventId,
    /// Number of tickets
    pub quantity: TicketQuantity,
    /// Buyer's membership tier, if known
    pub tier: Option<MembershipTier>,
}

impl ValidationRequest {
    /// Create a request without tier information.
    #[must_use]
    pub fn new(code: impl Into<String>, event_id: EventId, quantity: TicketQuantity) -> Self {
        Self {
            code: code.into(),
            event_id,
            quantity,
            tier: None,
        }
    }

    /// Attach the buyer's membership tier.
    #[must_use]
    pub const fn with_tier(mut self, tier: MembershipTier) -> Self {
        self.tier = Some(tier);
        self
    }
}

/// Why a code was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// No active code with that name
    InvalidCode,
    /// `starts_at` is in the future
    NotYetActive,
    /// `expires_at` is in the past
    Expired,
    /// Not enough uses left for the requested quantity
    UsageLimitExceeded,
    /// Code is restricted to other events
    NotValidForEvent,
    /// Code is restricted to other membership tiers
    NotValidForTier,
    /// Event does not exist
    EventNotFound,
}

impl Rejection {
    /// Message shown to the buyer.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidCode => "Invalid promo code",
            Self::NotYetActive => "Promo code is not yet active",
            Self::Expired => "Promo code has expired",
            Self::UsageLimitExceeded => "Promo code usage limit exceeded",
            Self::NotValidForEvent => "Promo code not valid for this event",
            Self::NotValidForTier => "Promo code not valid for your membership tier",
            Self::EventNotFound => "Event not found",
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::InvalidCode => "invalid_code",
            Self::NotYetActive => "not_yet_active",
            Self::Expired => "expired",
            Self::UsageLimitExceeded => "usage_limit_exceeded",
            Self::NotValidForEvent => "not_valid_for_event",
            Self::NotValidForTier => "not_valid_for_tier",
            Self::EventNotFound => "event_not_found",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Order totals after applying a discount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Pricing {
    /// `ticket_price * quantity`
    pub original_price: Money,
    /// Never more than `original_price`
    pub discount_amount: Money,
    /// `original_price - discount_amount`
    pub final_price: Money,
}

/// A code that applies, with the priced order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricedPromo {
    /// The resolved record
    pub promo_code: PromoCode,
    /// `ticket_price * quantity`
    pub original_price: Money,
    /// Amount taken off
    pub discount_amount: Money,
    /// What the buyer pays
    pub final_price: Money,
}

/// Outcome of a validation.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationResult {
    /// Code applies
    Valid(PricedPromo),
    /// Code does not apply
    Rejected(Rejection),
}

impl ValidationResult {
    /// Whether the code applies
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The rejection, if any
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Valid(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// Metric/log label for the outcome
    #[must_use]
    pub const fn outcome_label(&self) -> &'static str {
        match self {
            Self::Valid(_) => "valid",
            Self::Rejected(reason) => reason.label(),
        }
    }
}

// ============================================================================
// Pure rules
// ============================================================================

/// Run the record-level checks (start, expiry, usage, event, tier) against a
/// fetched code.
///
/// # Errors
///
/// Returns the first failing [`Rejection`].
pub fn check_eligibility(
    promo: &PromoCode,
    request: &ValidationRequest,
    now: DateTime<Utc>,
) -> std::result::Result<(), Rejection> {
    if !promo.active {
        return Err(Rejection::InvalidCode);
    }
    if promo.starts_at.is_some_and(|starts_at| now < starts_at) {
        return Err(Rejection::NotYetActive);
    }
    if promo.expires_at.is_some_and(|expires_at| now > expires_at) {
        return Err(Rejection::Expired);
    }
    if !promo.has_capacity_for(request.quantity) {
        return Err(Rejection::UsageLimitExceeded);
    }
    if !promo.applies_to_event(request.event_id) {
        return Err(Rejection::NotValidForEvent);
    }
    if !promo.allows_tier(request.tier) {
        return Err(Rejection::NotValidForTier);
    }
    Ok(())
}

/// Price an order of `quantity` tickets at `ticket_price` under `discount`.
///
/// Fixed discounts are capped at the order total. Percentage discounts are
/// rounded half up to the cent; the record's `max_discount_amount` is display
/// data and does not cap them.
///
/// # Errors
///
/// Returns `PromoError::PriceOverflow` if the order total does not fit.
pub fn price_order(
    discount: Discount,
    ticket_price: Money,
    quantity: TicketQuantity,
) -> Result<Pricing> {
    let original_price = ticket_price
        .checked_multiply(quantity.get())
        .ok_or(PromoError::PriceOverflow)?;

    let discount_amount = match discount {
        Discount::Fixed { amount } => amount,
        Discount::Percentage { percent } => percent.of(original_price),
    }
    .min(original_price);

    Ok(Pricing {
        original_price,
        discount_amount,
        final_price: original_price.saturating_sub(discount_amount),
    })
}

// ============================================================================
// Validator
// ============================================================================

/// Validates promo codes against a catalog.
///
/// Stateless apart from its injected store and clock; share it behind an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct PromoValidator<S, C> {
    store: S,
    clock: C,
}

impl<S, C> PromoValidator<S, C>
where
    S: CatalogStore,
    C: Clock,
{
    /// Create a validator.
    #[must_use]
    pub const fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// The underlying catalog store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Decide whether the request's code applies and price the order.
    ///
    /// Reads the catalog, never writes.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Store` if the catalog fails, or
    /// `PromoError::PriceOverflow` for absurd totals. Business-rule failures
    /// are `Ok(ValidationResult::Rejected(..))`.
    #[tracing::instrument(
        skip(self, request),
        fields(event_id = %request.event_id, quantity = %request.quantity)
    )]
    pub async fn validate(&self, request: &ValidationRequest) -> Result<ValidationResult> {
        let code = normalize_code(&request.code);
        if code.is_empty() {
            return Ok(reject(&code, Rejection::InvalidCode));
        }

        let Some(promo) = self.store.fetch_active_promo_code(&code).await? else {
            return Ok(reject(&code, Rejection::InvalidCode));
        };

        if let Err(reason) = check_eligibility(&promo, request, self.clock.now()) {
            return Ok(reject(&code, reason));
        }

        let Some(ticket_price) = self.store.fetch_event_price(request.event_id).await? else {
            return Ok(reject(&code, Rejection::EventNotFound));
        };

        let pricing = price_order(promo.discount, ticket_price, request.quantity)?;

        tracing::debug!(
            code = %code,
            original_price = %pricing.original_price,
            discount_amount = %pricing.discount_amount,
            final_price = %pricing.final_price,
            "Promo code applied"
        );

        Ok(ValidationResult::Valid(PricedPromo {
            promo_code: promo,
            original_price: pricing.original_price,
            discount_amount: pricing.discount_amount,
            final_price: pricing.final_price,
        }))
    }

    /// Validate, then record the usage in the catalog.
    ///
    /// Call this inside order finalization. The catalog's conditional
    /// increment is authoritative: if a concurrent redemption used up the
    /// remaining allowance, the result is `UsageLimitExceeded` even though
    /// validation passed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate`], plus store failures during the write.
    #[tracing::instrument(
        skip(self, request),
        fields(event_id = %request.event_id, quantity = %request.quantity)
    )]
    pub async fn redeem(&self, request: &ValidationRequest) -> Result<ValidationResult> {
        let mut priced = match self.validate(request).await? {
            ValidationResult::Valid(priced) => priced,
            rejected @ ValidationResult::Rejected(_) => return Ok(rejected),
        };

        match self
            .store
            .record_redemption(&priced.promo_code.code, request.quantity)
            .await?
        {
            RedemptionOutcome::Recorded { current_uses } => {
                tracing::info!(
                    code = %priced.promo_code.code,
                    current_uses,
                    max_uses = priced.promo_code.max_uses,
                    "Promo code redeemed"
                );
                priced.promo_code.current_uses = current_uses;
                Ok(ValidationResult::Valid(priced))
            }
            RedemptionOutcome::LimitReached => Ok(reject(
                &priced.promo_code.code,
                Rejection::UsageLimitExceeded,
            )),
            RedemptionOutcome::Inactive => {
                Ok(reject(&priced.promo_code.code, Rejection::InvalidCode))
            }
        }
    }
}

fn reject(code: &str, reason: Rejection) -> ValidationResult {
    tracing::debug!(code = %code, reason = reason.label(), "Promo code rejected");
    ValidationResult::Rejected(reason)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Percent, PromoCodeId};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn qty(n: i64) -> TicketQuantity {
        TicketQuantity::new(n).unwrap()
    }

    fn promo() -> PromoCode {
        PromoCode {
            id: PromoCodeId::new(),
            code: "SAVE10".to_string(),
            name: "Save ten".to_string(),
            description: None,
            active: true,
            discount: Discount::Fixed { amount: Money::from_cents(1_000) },
            max_discount_amount: None,
            max_uses: 10,
            current_uses: 0,
            starts_at: None,
            expires_at: None,
            applies_to_all_events: true,
            specific_event_ids: Vec::new(),
            tier_restrictions: Vec::new(),
            campaign_name: None,
            campaign_source: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_eligibility_order_expired_before_usage() {
        let mut code = promo();
        code.expires_at = Some(now() - Duration::days(1));
        code.current_uses = 10;
        let request = ValidationRequest::new("save10", EventId::new(), qty(1));

        assert_eq!(check_eligibility(&code, &request, now()), Err(Rejection::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let mut code = promo();
        code.expires_at = Some(now());
        let request = ValidationRequest::new("SAVE10", EventId::new(), qty(1));

        assert_eq!(check_eligibility(&code, &request, now()), Ok(()));
    }

    #[test]
    fn test_not_yet_active() {
        let mut code = promo();
        code.starts_at = Some(now() + Duration::hours(1));
        let request = ValidationRequest::new("SAVE10", EventId::new(), qty(1));

        assert_eq!(check_eligibility(&code, &request, now()), Err(Rejection::NotYetActive));
    }

    #[test]
    fn test_usage_counts_requested_quantity() {
        let mut code = promo();
        code.current_uses = 8;
        let event_id = EventId::new();

        let three = ValidationRequest::new("SAVE10", event_id, qty(3));
        let two = ValidationRequest::new("SAVE10", event_id, qty(2));

        assert_eq!(
            check_eligibility(&code, &three, now()),
            Err(Rejection::UsageLimitExceeded)
        );
        assert_eq!(check_eligibility(&code, &two, now()), Ok(()));
    }

    #[test]
    fn test_usage_overflow_is_exceeded() {
        let mut code = promo();
        code.current_uses = u32::MAX;
        code.max_uses = u32::MAX;
        let request = ValidationRequest::new("SAVE10", EventId::new(), qty(1));

        assert_eq!(
            check_eligibility(&code, &request, now()),
            Err(Rejection::UsageLimitExceeded)
        );
    }

    #[test]
    fn test_event_scope() {
        let e1 = EventId::new();
        let e2 = EventId::new();
        let mut code = promo();
        code.applies_to_all_events = false;
        code.specific_event_ids = vec![e1];

        assert_eq!(
            check_eligibility(&code, &ValidationRequest::new("X", e2, qty(1)), now()),
            Err(Rejection::NotValidForEvent)
        );
        assert_eq!(
            check_eligibility(&code, &ValidationRequest::new("X", e1, qty(1)), now()),
            Ok(())
        );
    }

    #[test]
    fn test_tier_restrictions() {
        let mut code = promo();
        code.tier_restrictions = vec![MembershipTier::Promoter, MembershipTier::Team];
        let event_id = EventId::new();

        let anonymous = ValidationRequest::new("X", event_id, qty(1));
        let basic = anonymous.clone().with_tier(MembershipTier::Basic);
        let promoter = anonymous.clone().with_tier(MembershipTier::Promoter);

        // Without a tier the restriction is not evaluated
        assert_eq!(check_eligibility(&code, &anonymous, now()), Ok(()));
        assert_eq!(check_eligibility(&code, &basic, now()), Err(Rejection::NotValidForTier));
        assert_eq!(check_eligibility(&code, &promoter, now()), Ok(()));
    }

    #[test]
    fn test_fixed_discount_clamped_to_total() {
        let pricing = price_order(
            Discount::Fixed { amount: Money::from_cents(5_000) },
            Money::from_cents(1_000),
            qty(2),
        );

        assert_eq!(
            pricing,
            Ok(Pricing {
                original_price: Money::from_cents(2_000),
                discount_amount: Money::from_cents(2_000),
                final_price: Money::ZERO,
            })
        );
    }

    #[test]
    fn test_percentage_discount() {
        let pricing = price_order(
            Discount::Percentage { percent: Percent::from_percentage(25.0) },
            Money::from_cents(4_000),
            qty(1),
        );

        assert_eq!(
            pricing,
            Ok(Pricing {
                original_price: Money::from_cents(4_000),
                discount_amount: Money::from_cents(1_000),
                final_price: Money::from_cents(3_000),
            })
        );
    }

    #[test]
    fn test_percentage_discount_is_not_capped() {
        let pricing = price_order(
            Discount::Percentage { percent: Percent::from_percentage(50.0) },
            Money::from_cents(4_000),
            qty(2),
        );

        assert_eq!(pricing.map(|p| p.discount_amount), Ok(Money::from_cents(4_000)));
    }

    #[test]
    fn test_price_overflow() {
        let pricing = price_order(
            Discount::Fixed { amount: Money::ZERO },
            Money::from_cents(u64::MAX),
            qty(2),
        );

        assert_eq!(pricing, Err(PromoError::PriceOverflow));
    }

    #[test]
    fn test_result_accessors() {
        let rejected = ValidationResult::Rejected(Rejection::Expired);
        assert!(!rejected.is_valid());
        assert_eq!(rejected.rejection(), Some(Rejection::Expired));
        assert_eq!(rejected.outcome_label(), "expired");
        assert_eq!(Rejection::Expired.to_string(), "Promo code has expired");
    }
}
