//! Persisted per-bus tracking state and history records.

use crate::domain::foundation::{BusId, Timestamp};

use super::{BusStatus, Coordinates, LocationUpdate};

/// Latest known state of a bus. Last write wins; no per-field versioning.
#[derive(Debug, Clone, PartialEq)]
pub struct BusCurrentState {
    pub bus_id: BusId,
    pub coordinates: Coordinates,
    pub speed: f64,
    pub heading: f64,
    pub status: BusStatus,
    pub last_updated: Timestamp,
}

impl BusCurrentState {
    /// A freshly registered bus: parked at the origin, inactive.
    pub fn new(bus_id: BusId) -> Self {
        Self {
            bus_id,
            coordinates: Coordinates::default(),
            speed: 0.0,
            heading: 0.0,
            status: BusStatus::default(),
            last_updated: Timestamp::now(),
        }
    }

    /// Returns the state after applying `write`.
    pub fn apply(mut self, write: &CurrentStateWrite) -> Self {
        match write {
            CurrentStateWrite::Location {
                coordinates,
                speed,
                heading,
                status,
                at,
            } => {
                self.coordinates = *coordinates;
                self.speed = *speed;
                self.heading = *heading;
                self.status = *status;
                self.last_updated = *at;
            }
            CurrentStateWrite::Status { status, at } => {
                self.status = *status;
                self.last_updated = *at;
            }
        }
        self
    }
}

/// The fields a single update writes to the current-state record.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentStateWrite {
    Location {
        coordinates: Coordinates,
        speed: f64,
        heading: f64,
        status: BusStatus,
        at: Timestamp,
    },
    Status {
        status: BusStatus,
        at: Timestamp,
    },
}

impl CurrentStateWrite {
    /// Location writes always move the bus to `en-route`.
    pub fn location(update: &LocationUpdate, at: Timestamp) -> Self {
        Self::Location {
            coordinates: update.coordinates,
            speed: update.speed,
            heading: update.heading,
            status: BusStatus::EnRoute,
            at,
        }
    }

    pub fn status(status: BusStatus, at: Timestamp) -> Self {
        Self::Status { status, at }
    }
}

/// One entry in a bus's location history.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub bus_id: BusId,
    pub coordinates: Coordinates,
    pub speed: f64,
    pub heading: f64,
    pub recorded_at: Timestamp,
}

impl LocationRecord {
    pub fn from_update(update: &LocationUpdate, recorded_at: Timestamp) -> Self {
        Self {
            bus_id: update.bus_id.clone(),
            coordinates: update.coordinates,
            speed: update.speed,
            heading: update.heading,
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AuthenticatedUser, Role, SubjectId};

    fn update() -> LocationUpdate {
        LocationUpdate::new(
            "B1",
            &[-73.9857, 40.7484],
            Some(30.0),
            Some(90.0),
            AuthenticatedUser::new(SubjectId::new("d").unwrap(), Role::Driver),
        )
        .unwrap()
    }

    #[test]
    fn location_write_sets_en_route_and_position() {
        let at = Timestamp::now();
        let state = BusCurrentState::new(BusId::new("B1").unwrap())
            .apply(&CurrentStateWrite::location(&update(), at));

        assert_eq!(state.status, BusStatus::EnRoute);
        assert_eq!(state.coordinates.to_array(), [-73.9857, 40.7484]);
        assert_eq!(state.speed, 30.0);
        assert_eq!(state.heading, 90.0);
        assert_eq!(state.last_updated, at);
    }

    #[test]
    fn status_write_keeps_position() {
        let at = Timestamp::now();
        let moved = BusCurrentState::new(BusId::new("B1").unwrap())
            .apply(&CurrentStateWrite::location(&update(), at));
        let stopped = moved
            .clone()
            .apply(&CurrentStateWrite::status(BusStatus::Stopped, at));

        assert_eq!(stopped.status, BusStatus::Stopped);
        assert_eq!(stopped.coordinates, moved.coordinates);
        assert_eq!(stopped.speed, moved.speed);
    }

    #[test]
    fn record_copies_normalized_fields() {
        let at = Timestamp::now();
        let record = LocationRecord::from_update(&update(), at);
        assert_eq!(record.bus_id.as_str(), "B1");
        assert_eq!(record.recorded_at, at);
        assert_eq!(record.heading, 90.0);
    }
}
