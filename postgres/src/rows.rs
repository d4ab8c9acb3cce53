//! Row types and their conversion into domain records.
//!
//! Money and percentages are selected pre-scaled to hundredths
//! (`ROUND(x * 100)::BIGINT`) so no decimal type crosses the wire.

use chrono::{DateTime, Utc};
use rtny_core::error::{PromoError, Result};
use rtny_core::types::{Discount, EventId, MembershipTier, Money, PromoCode, PromoCodeId};
use uuid::Uuid;

/// Columns selected for a promo code, in the order of [`PromoCodeRow`].
pub(crate) const PROMO_CODE_COLUMNS: &str = "
    id, code, name, description, active, discount_type,
    ROUND(discount_value * 100)::BIGINT AS discount_value_hundredths,
    ROUND(max_discount_amount * 100)::BIGINT AS max_discount_cents,
    max_uses, current_uses, starts_at, expires_at,
    applies_to_all_events, specific_event_ids, tier_restrictions,
    campaign_name, campaign_source, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PromoCodeRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub discount_type: String,
    pub discount_value_hundredths: i64,
    pub max_discount_cents: Option<i64>,
    pub max_uses: i32,
    pub current_uses: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub applies_to_all_events: bool,
    pub specific_event_ids: Option<Vec<Uuid>>,
    pub tier_restrictions: Option<Vec<String>>,
    pub campaign_name: Option<String>,
    pub campaign_source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Non-negative counter column to `u32`.
pub(crate) fn counter(column: &str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| PromoError::Store(format!("Negative {column} in promo_codes: {value}")))
}

/// Non-negative cents column to `Money`.
pub(crate) fn cents(column: &str, value: i64) -> Result<Money> {
    u64::try_from(value)
        .map(Money::from_cents)
        .map_err(|_| PromoError::Store(format!("Negative {column}: {value}")))
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = PromoError;

    fn try_from(row: PromoCodeRow) -> Result<Self> {
        let discount = Discount::from_parts(&row.discount_type, row.discount_value_hundredths)
            .map_err(|e| PromoError::Store(format!("Promo code {}: {e}", row.code)))?;

        let tier_restrictions = row
            .tier_restrictions
            .unwrap_or_default()
            .iter()
            .map(|tier| tier.parse::<MembershipTier>())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| PromoError::Store(format!("Promo code {}: {e}", row.code)))?;

        Ok(Self {
            id: PromoCodeId::from_uuid(row.id),
            max_discount_amount: row
                .max_discount_cents
                .map(|value| cents("max_discount_amount", value))
                .transpose()?,
            max_uses: counter("max_uses", row.max_uses)?,
            current_uses: counter("current_uses", row.current_uses)?,
            specific_event_ids: row
                .specific_event_ids
                .unwrap_or_default()
                .into_iter()
                .map(EventId::from_uuid)
                .collect(),
            code: row.code,
            name: row.name,
            description: row.description,
            active: row.active,
            discount,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
            applies_to_all_events: row.applies_to_all_events,
            tier_restrictions,
            campaign_name: row.campaign_name,
            campaign_source: row.campaign_source,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
