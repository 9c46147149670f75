//! Bus Tracker - real-time school bus location relay
//!
//! Authenticated clients keep a WebSocket open, subscribe to one bus or to
//! the whole fleet, and receive every accepted location or status update
//! as soon as it is written to the fleet store. Drivers and admins publish
//! over the same socket or through the REST endpoints.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
