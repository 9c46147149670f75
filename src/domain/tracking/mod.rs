//! Tracking module - topics, publish policy, and the events fanned out to
//! live sessions.

mod authorization;
mod errors;
mod events;
mod topic;

pub use authorization::{UpdateAuthorizer, UpdateKind};
pub use errors::TrackingError;
pub use events::{BusLocationBroadcast, BusStatusBroadcast, TrackingEvent};
pub use topic::Topic;
