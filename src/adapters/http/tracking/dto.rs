//! HTTP DTOs for the bus tracking endpoints.

use serde::{Deserialize, Serialize};

use crate::application::tracking::{DeliveryReport, PublishLocation, PublishStatus};
use crate::domain::foundation::{BusId, ErrorCode};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `PUT /api/buses/:bus_id/location`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub coordinates: Vec<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
}

impl UpdateLocationRequest {
    pub fn into_command(self, bus_id: String) -> PublishLocation {
        PublishLocation {
            bus_id,
            coordinates: self.coordinates,
            speed: self.speed,
            heading: self.heading,
        }
    }
}

/// Body of `PUT /api/buses/:bus_id/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

impl UpdateStatusRequest {
    pub fn into_command(self, bus_id: String) -> PublishStatus {
        PublishStatus {
            bus_id,
            status: self.status,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// `{"success": true, "data": ...}` envelope for successful calls.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub bus_id: BusId,
    pub recipients: usize,
}

impl From<DeliveryReport> for DeliveryResponse {
    fn from(report: DeliveryReport) -> Self {
        Self {
            bus_id: report.bus_id,
            recipients: report.recipients,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub sessions: usize,
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: code.to_string(),
            message: message.into(),
        }
    }
}
