//! WebSocket adapter for live bus tracking.
//!
//! ```text
//!  client ──frames──▶ handler ──ClientCommand──▶ ConnectionLifecycle
//!                                                  │
//!                                                  ├─▶ BroadcastRouter ─▶ FleetStateStore
//!                                                  ▼
//!  client ◀──frames── handler ◀──TrackingEvent── SessionRegistry (per-session outbox)
//! ```
//!
//! # Components
//!
//! - [`messages`] - wire protocol types
//! - [`handler`] - axum upgrade handler and per-connection loop

pub mod handler;
pub mod messages;

pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::{ClientMessage, ServerMessage};
