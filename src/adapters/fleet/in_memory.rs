//! In-memory FleetStateStore for tests and single-node runs without a database.
//!
//! History is pruned on every append: records older than the retention
//! window are dropped, then the oldest entries beyond the per-bus cap.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::fleet::{BusCurrentState, CurrentStateWrite, LocationRecord};
use crate::domain::foundation::{BusId, Timestamp};
use crate::ports::{FleetStateStore, FleetStoreError};

const DEFAULT_RETENTION_SECS: u64 = 86_400;
const DEFAULT_MAX_PER_BUS: usize = 1_000;

#[derive(Default)]
struct Fleet {
    current: HashMap<BusId, BusCurrentState>,
    history: HashMap<BusId, VecDeque<LocationRecord>>,
}

pub struct InMemoryFleetStore {
    fleet: RwLock<Fleet>,
    retention_secs: u64,
    max_per_bus: usize,
}

impl InMemoryFleetStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION_SECS, DEFAULT_MAX_PER_BUS)
    }

    pub fn with_retention(retention_secs: u64, max_per_bus: usize) -> Self {
        Self {
            fleet: RwLock::new(Fleet::default()),
            retention_secs,
            max_per_bus,
        }
    }

    /// Register a bus so updates for it are accepted.
    ///
    /// Re-inserting an existing bus leaves its state untouched.
    pub async fn insert_bus(&self, bus_id: BusId) {
        let mut fleet = self.fleet.write().await;
        fleet
            .current
            .entry(bus_id.clone())
            .or_insert_with(|| BusCurrentState::new(bus_id));
    }

    /// Decommission a bus. Its history goes with it.
    pub async fn remove_bus(&self, bus_id: &BusId) -> bool {
        let mut fleet = self.fleet.write().await;
        fleet.history.remove(bus_id);
        fleet.current.remove(bus_id).is_some()
    }

    pub async fn history_len(&self, bus_id: &BusId) -> usize {
        self.fleet
            .read()
            .await
            .history
            .get(bus_id)
            .map_or(0, VecDeque::len)
    }

    /// History for one bus, oldest first.
    pub async fn history(&self, bus_id: &BusId) -> Vec<LocationRecord> {
        self.fleet
            .read()
            .await
            .history
            .get(bus_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn prune(&self, records: &mut VecDeque<LocationRecord>, now: &Timestamp) {
        let cutoff = now.minus_secs(self.retention_secs);
        while records
            .front()
            .is_some_and(|r| r.recorded_at.is_before(&cutoff))
        {
            records.pop_front();
        }
        while records.len() > self.max_per_bus {
            records.pop_front();
        }
    }
}

impl Default for InMemoryFleetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FleetStateStore for InMemoryFleetStore {
    async fn get_current(
        &self,
        bus_id: &BusId,
    ) -> Result<Option<BusCurrentState>, FleetStoreError> {
        Ok(self.fleet.read().await.current.get(bus_id).cloned())
    }

    async fn set_current(
        &self,
        bus_id: &BusId,
        write: CurrentStateWrite,
    ) -> Result<Option<BusCurrentState>, FleetStoreError> {
        let mut fleet = self.fleet.write().await;
        let Some(entry) = fleet.current.get_mut(bus_id) else {
            return Ok(None);
        };
        *entry = entry.clone().apply(&write);
        Ok(Some(entry.clone()))
    }

    async fn append_history(
        &self,
        bus_id: &BusId,
        record: LocationRecord,
    ) -> Result<(), FleetStoreError> {
        let now = record.recorded_at;
        let mut fleet = self.fleet.write().await;
        let records = fleet.history.entry(bus_id.clone()).or_default();
        records.push_back(record);
        self.prune(records, &now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fleet::{BusStatus, Coordinates};

    fn bus(id: &str) -> BusId {
        BusId::new(id).unwrap()
    }

    fn record(bus_id: &str, at: Timestamp) -> LocationRecord {
        LocationRecord {
            bus_id: bus(bus_id),
            coordinates: Coordinates::new(1.0, 2.0).unwrap(),
            speed: 10.0,
            heading: 45.0,
            recorded_at: at,
        }
    }

    #[tokio::test]
    async fn unknown_bus_has_no_state() {
        let store = InMemoryFleetStore::new();
        assert!(store.get_current(&bus("B1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inserted_bus_starts_inactive() {
        let store = InMemoryFleetStore::new();
        store.insert_bus(bus("B1")).await;

        let state = store.get_current(&bus("B1")).await.unwrap().unwrap();

        assert_eq!(state.status, BusStatus::Inactive);
    }

    #[tokio::test]
    async fn set_current_on_missing_bus_returns_none() {
        let store = InMemoryFleetStore::new();
        let write = CurrentStateWrite::status(BusStatus::Stopped, Timestamp::now());

        assert!(store.set_current(&bus("B1"), write).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_current_persists_and_returns_new_state() {
        let store = InMemoryFleetStore::new();
        store.insert_bus(bus("B1")).await;
        let write = CurrentStateWrite::status(BusStatus::Maintenance, Timestamp::now());

        let returned = store.set_current(&bus("B1"), write).await.unwrap().unwrap();
        let stored = store.get_current(&bus("B1")).await.unwrap().unwrap();

        assert_eq!(returned, stored);
        assert_eq!(stored.status, BusStatus::Maintenance);
    }

    #[tokio::test]
    async fn history_is_capped_per_bus() {
        let store = InMemoryFleetStore::with_retention(86_400, 3);
        for _ in 0..5 {
            store
                .append_history(&bus("B1"), record("B1", Timestamp::now()))
                .await
                .unwrap();
        }

        assert_eq!(store.history_len(&bus("B1")).await, 3);
        assert_eq!(store.history_len(&bus("B2")).await, 0);
    }

    #[tokio::test]
    async fn history_older_than_retention_is_dropped() {
        let store = InMemoryFleetStore::with_retention(60, 100);
        let now = Timestamp::now();
        store
            .append_history(&bus("B1"), record("B1", now.minus_secs(120)))
            .await
            .unwrap();
        store
            .append_history(&bus("B1"), record("B1", now))
            .await
            .unwrap();

        let history = store.history(&bus("B1")).await;

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].recorded_at, now);
    }

    #[tokio::test]
    async fn remove_bus_drops_state_and_history() {
        let store = InMemoryFleetStore::new();
        store.insert_bus(bus("B1")).await;
        store
            .append_history(&bus("B1"), record("B1", Timestamp::now()))
            .await
            .unwrap();

        assert!(store.remove_bus(&bus("B1")).await);
        assert!(store.get_current(&bus("B1")).await.unwrap().is_none());
        assert_eq!(store.history_len(&bus("B1")).await, 0);
        assert!(!store.remove_bus(&bus("B1")).await);
    }

    #[tokio::test]
    async fn huge_retention_keeps_history_without_panicking() {
        for retention in [10_000_000_000_000_000, u64::MAX] {
            let store = InMemoryFleetStore::with_retention(retention, 1000);
            store
                .append_history(&bus("B1"), record("B1", Timestamp::now()))
                .await
                .unwrap();

            assert_eq!(store.history_len(&bus("B1")).await, 1);
        }
    }
}
