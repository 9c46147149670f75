//! Application layer - orchestration between the domain and ports.
//!
//! `tracking` owns the live-session state and drives every publish and
//! subscribe operation; transports in `adapters` only decode and encode.

pub mod tracking;

pub use tracking::{
    BroadcastRouter, ClientCommand, Connection, ConnectionLifecycle, DeliveryReport,
    PublishLocation, PublishStatus, Session, SessionRegistry,
};
