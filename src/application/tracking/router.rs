//! BroadcastRouter - validated write-through and fan-out of bus updates.
//!
//! Every accepted update follows the same order:
//!
//! ```text
//! authorize → validate/normalize → resolve bus → write current state
//!           → append history (best-effort) → fan out to bus:<id> ∪ all-buses
//! ```
//!
//! Nothing is delivered unless the current-state write succeeded, so every
//! broadcast matches persisted state.

use std::sync::Arc;

use crate::domain::fleet::{
    BusCurrentState, CurrentStateWrite, LocationRecord, LocationUpdate, StatusUpdate,
};
use crate::domain::foundation::{AuthenticatedUser, BusId, Timestamp};
use crate::domain::tracking::{Topic, TrackingError, TrackingEvent, UpdateAuthorizer, UpdateKind};
use crate::ports::FleetStateStore;

use super::commands::{PublishLocation, PublishStatus};
use super::registry::SessionRegistry;

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub bus_id: BusId,
    /// Sessions the broadcast was queued for.
    pub recipients: usize,
}

pub struct BroadcastRouter {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn FleetStateStore>,
    authorizer: UpdateAuthorizer,
}

impl BroadcastRouter {
    pub fn new(registry: Arc<SessionRegistry>, store: Arc<dyn FleetStateStore>) -> Self {
        Self {
            registry,
            store,
            authorizer: UpdateAuthorizer::new(),
        }
    }

    /// Publish a GPS report and fan it out as `bus:location`.
    pub async fn publish_location(
        &self,
        publisher: &AuthenticatedUser,
        cmd: PublishLocation,
    ) -> Result<DeliveryReport, TrackingError> {
        self.authorizer
            .ensure_can_publish(publisher, UpdateKind::Location)?;

        let update = LocationUpdate::new(
            &cmd.bus_id,
            &cmd.coordinates,
            cmd.speed,
            cmd.heading,
            publisher.clone(),
        )?;
        let bus_id = update.bus_id.clone();

        self.resolve(&bus_id, UpdateKind::Location).await?;

        let now = Timestamp::now();
        let state = self
            .write_current(
                &bus_id,
                CurrentStateWrite::location(&update, now),
                UpdateKind::Location,
            )
            .await?;

        if let Err(e) = self
            .store
            .append_history(&bus_id, LocationRecord::from_update(&update, now))
            .await
        {
            tracing::warn!(
                bus_id = %bus_id,
                error = %e,
                "History append failed, broadcasting anyway"
            );
        }

        let recipients = self
            .registry
            .fan_out(
                &Topic::audience_of(&bus_id),
                TrackingEvent::BusLocation((&state).into()),
            )
            .await;

        tracing::debug!(
            bus_id = %bus_id,
            publisher = %update.publisher.id,
            speed = state.speed,
            heading = state.heading,
            recipients,
            "Location broadcast"
        );

        Ok(DeliveryReport { bus_id, recipients })
    }

    /// Publish a status change and fan it out as `bus:status`.
    ///
    /// Status-only changes are not recorded in history.
    pub async fn publish_status(
        &self,
        publisher: &AuthenticatedUser,
        cmd: PublishStatus,
    ) -> Result<DeliveryReport, TrackingError> {
        self.authorizer
            .ensure_can_publish(publisher, UpdateKind::Status)?;

        let update = StatusUpdate::new(&cmd.bus_id, &cmd.status, publisher.clone())?;
        let bus_id = update.bus_id.clone();

        self.resolve(&bus_id, UpdateKind::Status).await?;

        let state = self
            .write_current(
                &bus_id,
                CurrentStateWrite::status(update.status, Timestamp::now()),
                UpdateKind::Status,
            )
            .await?;

        let recipients = self
            .registry
            .fan_out(
                &Topic::audience_of(&bus_id),
                TrackingEvent::BusStatus((&state).into()),
            )
            .await;

        tracing::debug!(
            bus_id = %bus_id,
            publisher = %update.publisher.id,
            status = %state.status,
            recipients,
            "Status broadcast"
        );

        Ok(DeliveryReport { bus_id, recipients })
    }

    /// The store is the authority on bus existence.
    async fn resolve(
        &self,
        bus_id: &BusId,
        kind: UpdateKind,
    ) -> Result<BusCurrentState, TrackingError> {
        self.store
            .get_current(bus_id)
            .await
            .map_err(|e| TrackingError::store(kind, e.to_string()))?
            .ok_or_else(|| TrackingError::BusNotFound(bus_id.clone()))
    }

    async fn write_current(
        &self,
        bus_id: &BusId,
        write: CurrentStateWrite,
        kind: UpdateKind,
    ) -> Result<BusCurrentState, TrackingError> {
        match self.store.set_current(bus_id, write).await {
            Ok(Some(state)) => Ok(state),
            // deleted between resolve and write
            Ok(None) => Err(TrackingError::BusNotFound(bus_id.clone())),
            Err(e) => {
                tracing::error!(bus_id = %bus_id, error = %e, "Current-state write failed");
                Err(TrackingError::store(kind, e.to_string()))
            }
        }
    }
}
