//! Domain types for promo-code evaluation.
//!
//! Value objects for identifiers, money, percentages and ticket quantities,
//! plus the promo-code record as read from the catalog.

use crate::error::{PromoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Unique identifier for a promo-code record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromoCodeId(Uuid);

impl PromoCodeId {
    /// Creates a new random `PromoCodeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PromoCodeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PromoCodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PromoCodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Subtracts, stopping at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// The smaller of two amounts
    #[must_use]
    pub const fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }

    /// Amount in currency units, for JSON surfaces that expect decimals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // cents well below 2^53 in practice
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Percent (basis points, clamped to 0..=100%)
// ============================================================================

/// A percentage in basis points (1/100 of a percent), always within `0..=100%`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Percent(u32);

impl Percent {
    const MAX_BASIS_POINTS: u32 = 10_000;

    /// Create from basis points, clamping into `0..=10_000`.
    #[must_use]
    pub fn from_basis_points(bps: i64) -> Self {
        let clamped = bps.clamp(0, i64::from(Self::MAX_BASIS_POINTS));
        Self(u32::try_from(clamped).unwrap_or(Self::MAX_BASIS_POINTS))
    }

    /// Create from a percentage value such as `12.5`, clamping into `0..=100`.
    ///
    /// `NaN` becomes zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // clamped before the cast
    pub fn from_percentage(value: f64) -> Self {
        if value.is_nan() {
            return Self(0);
        }
        let bps = (value * 100.0).round().clamp(0.0, f64::from(Self::MAX_BASIS_POINTS));
        Self(bps as u32)
    }

    /// Basis points
    #[must_use]
    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// Percentage value, e.g. `25.0`
    #[must_use]
    pub fn as_percentage(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// This percentage of `amount`, rounded half up to the cent.
    ///
    /// Never exceeds `amount`.
    #[must_use]
    pub fn of(&self, amount: Money) -> Money {
        let scaled = u128::from(amount.cents()) * u128::from(self.0);
        let cents = (scaled + u128::from(Self::MAX_BASIS_POINTS / 2)) / u128::from(Self::MAX_BASIS_POINTS);
        Money::from_cents(u64::try_from(cents).unwrap_or(amount.cents())).min(amount)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

// ============================================================================
// Discount
// ============================================================================

/// How a promo code reduces the order total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discount_type", rename_all = "snake_case")]
pub enum Discount {
    /// Absolute amount off the whole order
    Fixed {
        /// Amount off
        amount: Money,
    },
    /// Share of the order total
    Percentage {
        /// Share off
        percent: Percent,
    },
}

impl Discount {
    /// Build from the catalog's `(discount_type, discount_value)` pair, where the
    /// value is expressed in hundredths (cents for fixed, basis points for
    /// percentage).
    ///
    /// Negative values become zero; percentages above 100 are clamped.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::UnknownDiscountType` for anything other than
    /// `fixed` or `percentage`.
    pub fn from_parts(discount_type: &str, value_hundredths: i64) -> Result<Self> {
        match discount_type {
            "fixed" => Ok(Self::Fixed {
                amount: Money::from_cents(u64::try_from(value_hundredths).unwrap_or(0)),
            }),
            "percentage" => Ok(Self::Percentage {
                percent: Percent::from_basis_points(value_hundredths),
            }),
            other => Err(PromoError::UnknownDiscountType(other.to_string())),
        }
    }

    /// Catalog name of the discount type
    #[must_use]
    pub const fn discount_type(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Percentage { .. } => "percentage",
        }
    }

    /// Catalog value: currency units for fixed, percentage points for percentage.
    #[must_use]
    pub fn discount_value(&self) -> f64 {
        match self {
            Self::Fixed { amount } => amount.as_decimal(),
            Self::Percentage { percent } => percent.as_percentage(),
        }
    }
}

// ============================================================================
// Ticket Quantity
// ============================================================================

/// Number of tickets in an order. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TicketQuantity(u32);

impl TicketQuantity {
    /// Validate a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns `PromoError::InvalidQuantity` for zero, negative, or values
    /// beyond `u32::MAX`.
    pub fn new(quantity: i64) -> Result<Self> {
        match u32::try_from(quantity) {
            Ok(q) if q > 0 => Ok(Self(q)),
            _ => Err(PromoError::InvalidQuantity(quantity)),
        }
    }

    /// The quantity
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TicketQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Membership Tier
// ============================================================================

/// Membership level of the buyer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    /// Default tier
    Basic,
    /// Event promoter
    Promoter,
    /// Bottle service staff
    BottleGirl,
    /// Internal team
    Team,
}

impl MembershipTier {
    /// Catalog representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Promoter => "promoter",
            Self::BottleGirl => "bottle_girl",
            Self::Team => "team",
        }
    }
}

impl FromStr for MembershipTier {
    type Err = PromoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "promoter" => Ok(Self::Promoter),
            "bottle_girl" => Ok(Self::BottleGirl),
            "team" => Ok(Self::Team),
            _ => Err(PromoError::UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Promo Code
// ============================================================================

/// Normalize a user-supplied code for lookup.
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A promo-code record as stored in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Record ID
    pub id: PromoCodeId,
    /// Uppercased, unique code
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Inactive codes never validate
    pub active: bool,
    /// Discount rule
    #[serde(flatten)]
    pub discount: Discount,
    /// Advertised discount ceiling; shown to buyers, not applied in pricing
    pub max_discount_amount: Option<Money>,
    /// Total redemptions allowed, in tickets
    pub max_uses: u32,
    /// Tickets already redeemed
    pub current_uses: u32,
    /// Code is not usable before this instant
    pub starts_at: Option<DateTime<Utc>>,
    /// Code is not usable after this instant
    pub expires_at: Option<DateTime<Utc>>,
    /// When false, only `specific_event_ids` qualify
    pub applies_to_all_events: bool,
    /// Events the code is limited to
    pub specific_event_ids: Vec<EventId>,
    /// Tiers allowed to use the code (empty = everyone)
    pub tier_restrictions: Vec<MembershipTier>,
    /// Marketing campaign name
    pub campaign_name: Option<String>,
    /// Marketing campaign source
    pub campaign_source: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl PromoCode {
    /// Whether redeeming `quantity` more tickets stays within `max_uses`.
    #[must_use]
    pub fn has_capacity_for(&self, quantity: TicketQuantity) -> bool {
        self.current_uses
            .checked_add(quantity.get())
            .is_some_and(|total| total <= self.max_uses)
    }

    /// Whether the code may be used for `event_id`
    #[must_use]
    pub fn applies_to_event(&self, event_id: EventId) -> bool {
        self.applies_to_all_events || self.specific_event_ids.contains(&event_id)
    }

    /// Whether a buyer with `tier` may use the code.
    ///
    /// Restrictions are only enforced when the caller supplies a tier; a
    /// request without one is judged on code, event and quantity alone.
    #[must_use]
    pub fn allows_tier(&self, tier: Option<MembershipTier>) -> bool {
        tier.is_none_or(|t| {
            self.tier_restrictions.is_empty() || self.tier_restrictions.contains(&t)
        })
    }
}
