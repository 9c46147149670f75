//! WebSocket message types for real-time bus tracking.
//!
//! Every frame is a JSON text frame tagged by event name:
//!
//! ```text
//! {"event": "subscribe:bus", "data": "B1"}
//! {"event": "bus:location", "data": {"busId": "B1", "location": {...}, ...}}
//! ```
//!
//! - Client → Server: subscriptions, publishes, pings
//! - Server → Client: greeting, bus broadcasts, errors, pongs

use serde::{Deserialize, Serialize};

use crate::application::tracking::{ClientCommand, PublishLocation, PublishStatus};
use crate::domain::fleet::{BusStatus, Coordinates};
use crate::domain::foundation::{BusId, Role};
use crate::domain::tracking::{BusLocationBroadcast, BusStatusBroadcast, TrackingEvent};

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// Session registered.
    #[serde(rename = "connected")]
    Connected(ConnectedMessage),

    /// Location fan-out or subscribe-time snapshot.
    #[serde(rename = "bus:location")]
    BusLocation(BusLocationMessage),

    #[serde(rename = "bus:status")]
    BusStatus(BusStatusMessage),

    /// Rejection of the client's last request.
    #[serde(rename = "error")]
    Error(ErrorMessage),

    #[serde(rename = "pong")]
    Pong(PongMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub session_id: String,
    pub subject_id: String,
    pub role: Role,
    pub timestamp: String,
}

/// GeoJSON point, the shape map clients already consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: Coordinates,
}

impl From<Coordinates> for GeoPoint {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            kind: "Point",
            coordinates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusLocationMessage {
    pub bus_id: BusId,
    pub location: GeoPoint,
    pub status: BusStatus,
    pub speed: f64,
    pub heading: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusStatusMessage {
    pub bus_id: BusId,
    pub status: BusStatus,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl From<BusLocationBroadcast> for BusLocationMessage {
    fn from(b: BusLocationBroadcast) -> Self {
        Self {
            bus_id: b.bus_id,
            location: b.coordinates.into(),
            status: b.status,
            speed: b.speed,
            heading: b.heading,
            timestamp: b.timestamp.to_rfc3339(),
        }
    }
}

impl From<BusStatusBroadcast> for BusStatusMessage {
    fn from(b: BusStatusBroadcast) -> Self {
        Self {
            bus_id: b.bus_id,
            status: b.status,
            timestamp: b.timestamp.to_rfc3339(),
        }
    }
}

impl From<TrackingEvent> for ServerMessage {
    fn from(event: TrackingEvent) -> Self {
        match event {
            TrackingEvent::Connected {
                session_id,
                subject_id,
                role,
                timestamp,
            } => ServerMessage::Connected(ConnectedMessage {
                session_id: session_id.to_string(),
                subject_id: subject_id.to_string(),
                role,
                timestamp: timestamp.to_rfc3339(),
            }),
            TrackingEvent::BusLocation(b) => ServerMessage::BusLocation(b.into()),
            TrackingEvent::BusStatus(b) => ServerMessage::BusStatus(b.into()),
            TrackingEvent::Error { code, message } => ServerMessage::Error(ErrorMessage {
                code: code.to_string(),
                message,
            }),
            TrackingEvent::Pong { timestamp } => ServerMessage::Pong(PongMessage {
                timestamp: timestamp.to_rfc3339(),
            }),
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "subscribe:bus")]
    SubscribeBus(String),

    #[serde(rename = "unsubscribe:bus")]
    UnsubscribeBus(String),

    #[serde(rename = "subscribe:all-buses")]
    SubscribeAllBuses,

    #[serde(rename = "unsubscribe:all-buses")]
    UnsubscribeAllBuses,

    #[serde(rename = "update:location")]
    UpdateLocation(PublishLocation),

    #[serde(rename = "update:status")]
    UpdateStatus(PublishStatus),

    /// Application-level heartbeat.
    #[serde(rename = "ping")]
    Ping,
}

impl ClientMessage {
    pub fn into_command(self) -> ClientCommand {
        match self {
            ClientMessage::SubscribeBus(id) => ClientCommand::SubscribeBus(id),
            ClientMessage::UnsubscribeBus(id) => ClientCommand::UnsubscribeBus(id),
            ClientMessage::SubscribeAllBuses => ClientCommand::SubscribeAllBuses,
            ClientMessage::UnsubscribeAllBuses => ClientCommand::UnsubscribeAllBuses,
            ClientMessage::UpdateLocation(p) => ClientCommand::UpdateLocation(p),
            ClientMessage::UpdateStatus(p) => ClientCommand::UpdateStatus(p),
            ClientMessage::Ping => ClientCommand::Ping,
        }
    }
}
