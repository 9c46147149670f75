//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the tracking core and the outside world. Adapters implement these ports.
//!
//! - `IdentityVerifier` - Validates bearer credentials at connect time
//! - `FleetStateStore` - Current bus state and location history

mod fleet_state_store;
mod identity_verifier;

pub use fleet_state_store::{FleetStateStore, FleetStoreError};
pub use identity_verifier::IdentityVerifier;
