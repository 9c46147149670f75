//! PostgreSQL implementation of FleetStateStore.
//!
//! Current state lives on the `buses` row; history goes to `bus_locations`.
//! Retention is enforced by `prune_history`, which the server runs on a
//! fixed interval rather than on every append.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::fleet::{
    BusCurrentState, BusStatus, Coordinates, CurrentStateWrite, LocationRecord,
};
use crate::domain::foundation::{BusId, Timestamp};
use crate::ports::{FleetStateStore, FleetStoreError};

type BusRow = (String, f64, f64, f64, f64, String, DateTime<Utc>);

pub struct PostgresFleetStore {
    pool: PgPool,
}

impl PostgresFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete history older than `retention_secs`, then trim each bus to
    /// its newest `max_per_bus` records. Returns the number of rows removed.
    pub async fn prune_history(
        &self,
        retention_secs: u64,
        max_per_bus: usize,
    ) -> Result<u64, FleetStoreError> {
        let cutoff = Timestamp::now().minus_secs(retention_secs);

        let expired = sqlx::query("DELETE FROM bus_locations WHERE recorded_at < $1")
            .bind(*cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        let overflow = sqlx::query(
            r#"
            DELETE FROM bus_locations
            WHERE id IN (
                SELECT id FROM (
                    SELECT id, ROW_NUMBER() OVER (
                        PARTITION BY bus_id ORDER BY recorded_at DESC
                    ) AS rank
                    FROM bus_locations
                ) ranked
                WHERE ranked.rank > $1
            )
            "#,
        )
        .bind(max_per_bus as i64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        Ok(expired + overflow)
    }
}

fn map_sqlx_error(e: sqlx::Error) -> FleetStoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            FleetStoreError::Unavailable(e.to_string())
        }
        other => FleetStoreError::Database(other.to_string()),
    }
}

fn row_to_state(row: BusRow) -> Result<BusCurrentState, FleetStoreError> {
    let (id, longitude, latitude, speed, heading, status, last_updated) = row;

    let bus_id = BusId::new(id).map_err(|e| FleetStoreError::Database(e.to_string()))?;
    let coordinates = Coordinates::new(longitude, latitude)
        .map_err(|e| FleetStoreError::Database(e.to_string()))?;
    let status: BusStatus = status
        .parse()
        .map_err(|_| FleetStoreError::Database(format!("Invalid status value: {}", status)))?;

    Ok(BusCurrentState {
        bus_id,
        coordinates,
        speed,
        heading,
        status,
        last_updated: Timestamp::from_datetime(last_updated),
    })
}

#[async_trait]
impl FleetStateStore for PostgresFleetStore {
    async fn get_current(
        &self,
        bus_id: &BusId,
    ) -> Result<Option<BusCurrentState>, FleetStoreError> {
        let row: Option<BusRow> = sqlx::query_as(
            r#"
            SELECT id, longitude, latitude, speed, heading, status, last_updated
            FROM buses
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(bus_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(row_to_state).transpose()
    }

    async fn set_current(
        &self,
        bus_id: &BusId,
        write: CurrentStateWrite,
    ) -> Result<Option<BusCurrentState>, FleetStoreError> {
        let query = match &write {
            CurrentStateWrite::Location {
                coordinates,
                speed,
                heading,
                status,
                at,
            } => sqlx::query_as(
                r#"
                UPDATE buses
                SET longitude = $2, latitude = $3, speed = $4, heading = $5,
                    status = $6, last_updated = $7
                WHERE id = $1 AND is_active
                RETURNING id, longitude, latitude, speed, heading, status, last_updated
                "#,
            )
            .bind(bus_id.as_str())
            .bind(coordinates.longitude())
            .bind(coordinates.latitude())
            .bind(*speed)
            .bind(*heading)
            .bind(status.as_str())
            .bind(*at.as_datetime()),
            CurrentStateWrite::Status { status, at } => sqlx::query_as(
                r#"
                UPDATE buses
                SET status = $2, last_updated = $3
                WHERE id = $1 AND is_active
                RETURNING id, longitude, latitude, speed, heading, status, last_updated
                "#,
            )
            .bind(bus_id.as_str())
            .bind(status.as_str())
            .bind(*at.as_datetime()),
        };

        let row: Option<BusRow> = query
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(row_to_state).transpose()
    }

    async fn append_history(
        &self,
        bus_id: &BusId,
        record: LocationRecord,
    ) -> Result<(), FleetStoreError> {
        sqlx::query(
            r#"
            INSERT INTO bus_locations (bus_id, longitude, latitude, speed, heading, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(bus_id.as_str())
        .bind(record.coordinates.longitude())
        .bind(record.coordinates.latitude())
        .bind(record.speed)
        .bind(record.heading)
        .bind(*record.recorded_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> BusRow {
        (
            "B1".to_string(),
            -73.9857,
            40.7484,
            30.0,
            90.0,
            status.to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn row_maps_to_state() {
        let state = row_to_state(row("en-route")).unwrap();

        assert_eq!(state.bus_id.as_str(), "B1");
        assert_eq!(state.status, BusStatus::EnRoute);
        assert_eq!(state.coordinates.to_array(), [-73.9857, 40.7484]);
    }

    #[test]
    fn unknown_status_in_row_is_database_error() {
        assert!(matches!(
            row_to_state(row("flying")),
            Err(FleetStoreError::Database(_))
        ));
    }

    #[test]
    fn pool_timeout_maps_to_unavailable() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            FleetStoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            FleetStoreError::Database(_)
        ));
    }
}
