//! Events delivered to a session's outbox.
//!
//! These are transport-neutral; the WebSocket adapter turns them into
//! wire messages.

use crate::domain::fleet::{BusCurrentState, BusStatus, Coordinates};
use crate::domain::foundation::{BusId, ErrorCode, Role, SessionId, SubjectId, Timestamp};

/// Payload of a `bus:location` broadcast or subscribe-time snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BusLocationBroadcast {
    pub bus_id: BusId,
    pub coordinates: Coordinates,
    pub status: BusStatus,
    pub speed: f64,
    pub heading: f64,
    pub timestamp: Timestamp,
}

impl From<&BusCurrentState> for BusLocationBroadcast {
    fn from(state: &BusCurrentState) -> Self {
        Self {
            bus_id: state.bus_id.clone(),
            coordinates: state.coordinates,
            status: state.status,
            speed: state.speed,
            heading: state.heading,
            timestamp: state.last_updated,
        }
    }
}

/// Payload of a `bus:status` broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct BusStatusBroadcast {
    pub bus_id: BusId,
    pub status: BusStatus,
    pub timestamp: Timestamp,
}

impl From<&BusCurrentState> for BusStatusBroadcast {
    fn from(state: &BusCurrentState) -> Self {
        Self {
            bus_id: state.bus_id.clone(),
            status: state.status,
            timestamp: state.last_updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    /// First event on every connection, once the session is registered.
    Connected {
        session_id: SessionId,
        subject_id: SubjectId,
        role: Role,
        timestamp: Timestamp,
    },
    BusLocation(BusLocationBroadcast),
    BusStatus(BusStatusBroadcast),
    /// A rejection, sent only to the session that caused it.
    Error { code: ErrorCode, message: String },
    Pong { timestamp: Timestamp },
}

impl TrackingEvent {
    /// Name of the wire event this maps to, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            TrackingEvent::Connected { .. } => "connected",
            TrackingEvent::BusLocation(_) => "bus:location",
            TrackingEvent::BusStatus(_) => "bus:status",
            TrackingEvent::Error { .. } => "error",
            TrackingEvent::Pong { .. } => "pong",
        }
    }

    /// The bus a broadcast describes and the state time it carries.
    pub fn bus_stamp(&self) -> Option<(&BusId, Timestamp)> {
        match self {
            TrackingEvent::BusLocation(b) => Some((&b.bus_id, b.timestamp)),
            TrackingEvent::BusStatus(b) => Some((&b.bus_id, b.timestamp)),
            _ => None,
        }
    }
}
