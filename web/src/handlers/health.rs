//! Health check endpoints.
//!
//! Used by load balancers and orchestrators to decide whether the service is
//! alive and whether it should receive traffic.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use rtny_core::{CatalogStore, Clock};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Liveness endpoint.
///
/// Returns 200 OK while the process is running. Does not touch the catalog.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Catalog store connectivity
    pub database: bool,
}

/// Readiness endpoint.
///
/// Pings the catalog store; 503 Service Unavailable when it is unreachable.
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"ready":true,"database":true}
/// ```
pub async fn readiness_check<S, C>(
    State(state): State<AppState<S, C>>,
) -> (StatusCode, Json<ReadinessResponse>)
where
    S: CatalogStore + 'static,
    C: Clock + 'static,
{
    let database = match state.validator.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Catalog store not ready");
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready: database,
            database,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtny_core::SystemClock;
    use rtny_testing::InMemoryCatalogStore;

    #[tokio::test]
    async fn test_health_check() {
        let (status, Json(body)) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_readiness_follows_store() {
        let store = InMemoryCatalogStore::default();
        let state = AppState::from_parts(store.clone(), SystemClock);

        let (status, Json(body)) = readiness_check(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.ready);

        store.set_unavailable(true);
        let (status, Json(body)) = readiness_check(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.database);
    }
}
