//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `auth` - JWT and mock identity verifiers
//! - `fleet` - In-memory and PostgreSQL fleet stores
//! - `http` - REST endpoints and auth middleware
//! - `websocket` - Live tracking transport

pub mod auth;
pub mod fleet;
pub mod http;
pub mod websocket;
