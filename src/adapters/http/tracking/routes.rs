//! Axum router configuration for tracking endpoints.

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use super::super::middleware::{auth_middleware, AuthState};
use super::handlers::{health, update_location, update_status, TrackingAppState};

/// Create the tracking API router, meant to be nested under `/api`.
///
/// # Routes
///
/// - `GET /health` - liveness and session count (public)
/// - `PUT /buses/:bus_id/location` - publish a GPS report (admin, driver)
/// - `PUT /buses/:bus_id/status` - publish a status change (admin, driver)
pub fn tracking_router(verifier: AuthState) -> Router<TrackingAppState> {
    let publish = Router::new()
        .route("/buses/:bus_id/location", put(update_location))
        .route("/buses/:bus_id/status", put(update_status))
        .route_layer(middleware::from_fn_with_state(verifier, auth_middleware));

    Router::new().route("/health", get(health)).merge(publish)
}
