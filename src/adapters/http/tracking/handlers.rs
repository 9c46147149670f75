//! HTTP handlers for health and REST publishing.
//!
//! The publish endpoints go through the same `BroadcastRouter` as the
//! WebSocket `update:*` events, so WebSocket subscribers see REST updates.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::tracking::ConnectionLifecycle;
use crate::domain::foundation::{ErrorCode, Timestamp};
use crate::domain::tracking::TrackingError;

use super::super::middleware::RequireAuth;
use super::dto::{
    ApiResponse, DeliveryResponse, ErrorResponse, HealthResponse, UpdateLocationRequest,
    UpdateStatusRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct TrackingAppState {
    pub lifecycle: Arc<ConnectionLifecycle>,
}

impl TrackingAppState {
    pub fn new(lifecycle: Arc<ConnectionLifecycle>) -> Self {
        Self { lifecycle }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/health
pub async fn health(State(state): State<TrackingAppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp: Timestamp::now().to_rfc3339(),
        sessions: state.lifecycle.registry().session_count().await,
    })
}

/// PUT /api/buses/:bus_id/location
pub async fn update_location(
    State(state): State<TrackingAppState>,
    RequireAuth(user): RequireAuth,
    Path(bus_id): Path<String>,
    body: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackingApiError> {
    let Json(request) = body?;

    let report = state
        .lifecycle
        .router()
        .publish_location(&user, request.into_command(bus_id))
        .await?;

    Ok(Json(ApiResponse::ok(DeliveryResponse::from(report))))
}

/// PUT /api/buses/:bus_id/status
pub async fn update_status(
    State(state): State<TrackingAppState>,
    RequireAuth(user): RequireAuth,
    Path(bus_id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackingApiError> {
    let Json(request) = body?;

    let report = state
        .lifecycle
        .router()
        .publish_status(&user, request.into_command(bus_id))
        .await?;

    Ok(Json(ApiResponse::ok(DeliveryResponse::from(report))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Mapping
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum TrackingApiError {
    Tracking(TrackingError),
    MalformedBody(String),
}

impl From<TrackingError> for TrackingApiError {
    fn from(err: TrackingError) -> Self {
        Self::Tracking(err)
    }
}

impl From<JsonRejection> for TrackingApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for TrackingApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            TrackingApiError::MalformedBody(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::ValidationFailed, reason),
            ),
            TrackingApiError::Tracking(err) => {
                let status = match &err {
                    TrackingError::Forbidden(_) => StatusCode::FORBIDDEN,
                    TrackingError::Validation(_) => StatusCode::BAD_REQUEST,
                    TrackingError::BusNotFound(_) => StatusCode::NOT_FOUND,
                    TrackingError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                    TrackingError::SessionGone(_) => StatusCode::GONE,
                };
                (status, ErrorResponse::new(err.code(), err.client_message()))
            }
        };
        (status, Json(body)).into_response()
    }
}
