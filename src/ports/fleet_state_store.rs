//! FleetStateStore port - current bus state and location history.
//!
//! The store is the authority on whether a bus exists. The broadcast path
//! reads through it on every update rather than caching bus records.
//!
//! ## Write semantics
//!
//! - `set_current` is last-write-wins at bus granularity; concurrent writers
//!   for the same bus race and the later arrival wins.
//! - `append_history` is best-effort from the caller's point of view: a
//!   failure there does not undo the current-state write.
//! - Retention of history (time window, per-bus cap) is the store's concern.

use async_trait::async_trait;

use crate::domain::fleet::{BusCurrentState, CurrentStateWrite, LocationRecord};
use crate::domain::foundation::BusId;

/// Errors raised by fleet store adapters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FleetStoreError {
    /// The backing database rejected or failed the operation.
    #[error("Database error: {0}")]
    Database(String),

    /// The backing database could not be reached.
    #[error("Fleet store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait FleetStateStore: Send + Sync {
    /// Latest state of an active bus, or `None` if the bus does not exist.
    async fn get_current(&self, bus_id: &BusId)
        -> Result<Option<BusCurrentState>, FleetStoreError>;

    /// Apply `write` to the bus's current state.
    ///
    /// Returns the state as persisted, or `None` if the bus no longer exists.
    async fn set_current(
        &self,
        bus_id: &BusId,
        write: CurrentStateWrite,
    ) -> Result<Option<BusCurrentState>, FleetStoreError>;

    /// Append one record to the bus's location history.
    async fn append_history(
        &self,
        bus_id: &BusId,
        record: LocationRecord,
    ) -> Result<(), FleetStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_cause() {
        let err = FleetStoreError::Database("unique violation".to_string());
        assert_eq!(err.to_string(), "Database error: unique violation");
    }

    #[test]
    fn fleet_state_store_is_object_safe() {
        fn _assert_trait_object(_: &dyn FleetStateStore) {}
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<std::sync::Arc<dyn FleetStateStore>>();
    }
}
