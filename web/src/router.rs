//! Router configuration for the promo service.

use crate::handlers::{health_check, readiness_check, redeem_promo, validate_promo};
use crate::middleware::CorrelationIdLayer;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use rtny_core::{CatalogStore, Clock};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `GET /health` and `GET /ready`
/// - `POST /api/v1/promo/validate`
/// - `POST /api/v1/promo/redeem`
///
/// Every route gets a correlation id and an HTTP trace span.
pub fn build_router<S, C>(state: AppState<S, C>) -> Router
where
    S: CatalogStore + 'static,
    C: Clock + 'static,
{
    let api_routes = Router::new()
        .route("/promo/validate", post(validate_promo::<S, C>))
        .route("/promo/redeem", post(redeem_promo::<S, C>));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<S, C>))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorrelationIdLayer)
        .with_state(state)
}
