//! Promo-code validation and redemption endpoints.
//!
//! Both endpoints take the same body and answer with the same shape. A code
//! that does not apply is a normal `200` response with `valid: false` and a
//! buyer-facing `error` message; only malformed input (422) and
//! infrastructure failures (500) use error statuses.

use crate::error::AppError;
use crate::WebResult;
use crate::metrics::{self, Operation};
use crate::middleware::CorrelationId;
use crate::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Utc};
use rtny_core::{
    CatalogStore, Clock, EventId, MembershipTier, PricedPromo, PromoCode, TicketQuantity,
    ValidationRequest, ValidationResult,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for `/promo/validate` and `/promo/redeem`.
#[derive(Debug, Clone, Deserialize)]
pub struct PromoRequest {
    /// Code as typed by the buyer
    pub code: String,
    /// Event the tickets are for
    pub event_id: String,
    /// Number of tickets in the order
    pub ticket_quantity: i64,
    /// Buyer's membership tier, if signed in
    #[serde(default)]
    pub tier: Option<String>,
}

impl PromoRequest {
    /// Parse into a domain request.
    fn into_validation_request(self) -> Result<ValidationRequest, AppError> {
        let event_id = Uuid::parse_str(self.event_id.trim())
            .map(EventId::from_uuid)
            .map_err(|_| AppError::validation(format!("Invalid event id: {}", self.event_id)))?;
        let quantity = TicketQuantity::new(self.ticket_quantity)?;

        let request = ValidationRequest::new(self.code, event_id, quantity);
        Ok(match self.tier.as_deref().map(str::trim) {
            None | Some("") => request,
            Some(tier) => request.with_tier(tier.parse::<MembershipTier>()?),
        })
    }
}

/// Promo code as shown to the buyer.
///
/// Amounts are in currency units; `discount_value` is in percentage points
/// for percentage codes.
#[derive(Debug, Clone, Serialize)]
pub struct PromoCodeView {
    /// Code identifier
    pub id: Uuid,
    /// Normalized code
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `fixed` or `percentage`
    pub discount_type: &'static str,
    /// Discount amount or percentage
    pub discount_value: f64,
    /// Advertised discount ceiling (informational)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount_amount: Option<f64>,
    /// Total uses allowed
    pub max_uses: u32,
    /// Uses recorded so far
    pub current_uses: u32,
    /// Start of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// End of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the code applies to every event
    pub applies_to_all_events: bool,
    /// Events the code is restricted to
    pub specific_event_ids: Vec<Uuid>,
    /// Tiers the code is restricted to
    pub tier_restrictions: Vec<MembershipTier>,
    /// Marketing campaign
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    /// Marketing channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_source: Option<String>,
}

impl From<PromoCode> for PromoCodeView {
    fn from(promo: PromoCode) -> Self {
        Self {
            id: *promo.id.as_uuid(),
            discount_type: promo.discount.discount_type(),
            discount_value: promo.discount.discount_value(),
            max_discount_amount: promo.max_discount_amount.map(|m| m.as_decimal()),
            specific_event_ids: promo
                .specific_event_ids
                .iter()
                .map(|id| *id.as_uuid())
                .collect(),
            code: promo.code,
            name: promo.name,
            description: promo.description,
            max_uses: promo.max_uses,
            current_uses: promo.current_uses,
            starts_at: promo.starts_at,
            expires_at: promo.expires_at,
            applies_to_all_events: promo.applies_to_all_events,
            tier_restrictions: promo.tier_restrictions,
            campaign_name: promo.campaign_name,
            campaign_source: promo.campaign_source,
        }
    }
}

/// Response body for both promo endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PromoResponse {
    /// Whether the code applies
    pub valid: bool,
    /// Why the code does not apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Amount taken off the order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,
    /// Order total before the discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    /// Order total after the discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_price: Option<f64>,
    /// The applied code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<PromoCodeView>,
}

impl From<ValidationResult> for PromoResponse {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid(PricedPromo {
                promo_code,
                original_price,
                discount_amount,
                final_price,
            }) => Self {
                valid: true,
                error: None,
                discount_amount: Some(discount_amount.as_decimal()),
                original_price: Some(original_price.as_decimal()),
                final_price: Some(final_price.as_decimal()),
                promo_code: Some(promo_code.into()),
            },
            ValidationResult::Rejected(reason) => Self {
                valid: false,
                error: Some(reason.message().to_string()),
                discount_amount: None,
                original_price: None,
                final_price: None,
                promo_code: None,
            },
        }
    }
}

/// Check whether a code applies and price the order.
///
/// ```text
/// POST /api/v1/promo/validate
/// {"code":"summer25","event_id":"...","ticket_quantity":2}
/// ```
///
/// # Errors
///
/// 422 for malformed input, 500 when the catalog is unreachable.
pub async fn validate_promo<S, C>(
    State(state): State<AppState<S, C>>,
    correlation_id: CorrelationId,
    payload: Result<Json<PromoRequest>, JsonRejection>,
) -> WebResult<Json<PromoResponse>>
where
    S: CatalogStore + 'static,
    C: Clock + 'static,
{
    handle(Operation::Validate, &state, correlation_id, payload).await
}

/// Validate and record usage of a code at order finalization.
///
/// A `valid: true` response means the usage was recorded. When concurrent
/// orders exhaust the code first, the response is `valid: false` with the
/// usage-limit message.
///
/// # Errors
///
/// 422 for malformed input, 500 when the catalog is unreachable.
pub async fn redeem_promo<S, C>(
    State(state): State<AppState<S, C>>,
    correlation_id: CorrelationId,
    payload: Result<Json<PromoRequest>, JsonRejection>,
) -> WebResult<Json<PromoResponse>>
where
    S: CatalogStore + 'static,
    C: Clock + 'static,
{
    handle(Operation::Redeem, &state, correlation_id, payload).await
}

async fn handle<S, C>(
    operation: Operation,
    state: &AppState<S, C>,
    correlation_id: CorrelationId,
    payload: Result<Json<PromoRequest>, JsonRejection>,
) -> Result<Json<PromoResponse>, AppError>
where
    S: CatalogStore,
    C: Clock,
{
    let result = async {
        let Json(body) = payload?;
        let request = body.into_validation_request()?;
        let result = match operation {
            Operation::Validate => state.validator.validate(&request).await?,
            Operation::Redeem => state.validator.redeem(&request).await?,
        };
        Ok::<_, AppError>(result)
    }
    .await;

    match result {
        Ok(result) => {
            metrics::record_outcome(operation, result.outcome_label());
            tracing::debug!(
                %correlation_id,
                operation = operation.as_str(),
                outcome = result.outcome_label(),
                "Promo request handled"
            );
            Ok(Json(result.into()))
        }
        Err(err) => {
            metrics::record_error(operation);
            tracing::debug!(%correlation_id, operation = operation.as_str(), error = %err, "Promo request failed");
            Err(err)
        }
    }
}
