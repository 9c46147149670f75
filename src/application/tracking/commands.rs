//! Requests a connected client can make.
//!
//! Field values arrive unvalidated; the router and lifecycle manager turn
//! them into domain types and reject what does not parse.

use serde::Deserialize;

/// Raw `update:location` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishLocation {
    pub bus_id: String,
    pub coordinates: Vec<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
}

/// Raw `update:status` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatus {
    pub bus_id: String,
    pub status: String,
}

/// One decoded client request, independent of transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    SubscribeBus(String),
    UnsubscribeBus(String),
    SubscribeAllBuses,
    UnsubscribeAllBuses,
    UpdateLocation(PublishLocation),
    UpdateStatus(PublishStatus),
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_payload_accepts_missing_speed_and_heading() {
        let cmd: PublishLocation =
            serde_json::from_str(r#"{"busId":"B1","coordinates":[-73.9,40.7]}"#).unwrap();
        assert_eq!(cmd.bus_id, "B1");
        assert_eq!(cmd.speed, None);
        assert_eq!(cmd.heading, None);
    }

    #[test]
    fn location_payload_rejects_non_numeric_coordinates() {
        let result = serde_json::from_str::<PublishLocation>(
            r#"{"busId":"B1","coordinates":["a","b"]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn status_payload_keeps_status_raw() {
        let cmd: PublishStatus =
            serde_json::from_str(r#"{"busId":"B2","status":"warp-speed"}"#).unwrap();
        assert_eq!(cmd.status, "warp-speed");
    }
}
