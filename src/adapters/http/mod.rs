//! HTTP adapters - REST API and middleware.

pub mod middleware;
pub mod tracking;

pub use tracking::{tracking_router, TrackingAppState};
