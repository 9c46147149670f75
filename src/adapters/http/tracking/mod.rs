//! HTTP adapter for health and REST publishing.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ApiResponse, DeliveryResponse, ErrorResponse, HealthResponse, UpdateLocationRequest,
    UpdateStatusRequest,
};
pub use handlers::{TrackingApiError, TrackingAppState};
pub use routes::tracking_router;
