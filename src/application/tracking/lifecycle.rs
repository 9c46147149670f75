//! ConnectionLifecycle - connect, subscribe, dispatch, disconnect.
//!
//! Transports call into this type and never touch the registry directly:
//!
//! 1. `on_connect` verifies the credential and registers a session
//! 2. `dispatch` handles each decoded client command
//! 3. `on_disconnect` purges the session and its memberships
//!
//! Rejections are delivered to the offending session as `error` events;
//! they never reach other sessions.

use std::sync::Arc;

use crate::domain::foundation::{AuthError, BusId, SessionId, Timestamp};
use crate::domain::tracking::{Topic, TrackingError, TrackingEvent};
use crate::ports::{FleetStateStore, IdentityVerifier};

use super::commands::ClientCommand;
use super::registry::{Inbox, Session, SessionRegistry};
use super::router::BroadcastRouter;

/// A registered session and the queue of events addressed to it.
pub struct Connection {
    pub session: Session,
    pub inbox: Inbox,
}

pub struct ConnectionLifecycle {
    verifier: Arc<dyn IdentityVerifier>,
    registry: Arc<SessionRegistry>,
    store: Arc<dyn FleetStateStore>,
    router: Arc<BroadcastRouter>,
}

impl ConnectionLifecycle {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        registry: Arc<SessionRegistry>,
        store: Arc<dyn FleetStateStore>,
        router: Arc<BroadcastRouter>,
    ) -> Self {
        Self {
            verifier,
            registry,
            store,
            router,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<BroadcastRouter> {
        &self.router
    }

    /// Authenticate and register a new session.
    ///
    /// On failure nothing is registered. On success the first queued event
    /// is `Connected`.
    pub async fn on_connect(&self, credential: Option<&str>) -> Result<Connection, AuthError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let user = self.verifier.verify(credential).await.map_err(|e| {
            tracing::debug!(error = %e, "Connection refused");
            e
        })?;

        let (session, inbox) = self.registry.register(user).await;

        self.registry
            .send_to(
                &session.id,
                TrackingEvent::Connected {
                    session_id: session.id,
                    subject_id: session.user.id.clone(),
                    role: session.user.role,
                    timestamp: session.connected_at,
                },
            )
            .await;

        tracing::info!(
            session_id = %session.id,
            subject_id = %session.user.id,
            role = %session.user.role,
            "Session connected"
        );

        Ok(Connection { session, inbox })
    }

    /// Join a topic. Joining a bus topic also sends that bus's current
    /// snapshot to this session, unless a newer broadcast for the bus
    /// reached it first.
    pub async fn on_subscribe(
        &self,
        session_id: &SessionId,
        topic: Topic,
    ) -> Result<(), TrackingError> {
        let added = self.registry.subscribe(session_id, topic.clone()).await?;
        tracing::debug!(session_id = %session_id, topic = %topic, added, "Subscribed");

        if let Topic::Bus(bus_id) = &topic {
            self.send_snapshot(session_id, bus_id).await;
        }
        Ok(())
    }

    /// Leave a topic; leaving a topic never joined is a no-op.
    pub async fn on_unsubscribe(
        &self,
        session_id: &SessionId,
        topic: &Topic,
    ) -> Result<(), TrackingError> {
        let removed = self.registry.unsubscribe(session_id, topic).await?;
        tracing::debug!(session_id = %session_id, topic = %topic, removed, "Unsubscribed");
        Ok(())
    }

    /// Purge the session. Safe to call more than once.
    pub async fn on_disconnect(&self, session_id: &SessionId) {
        if let Some(session) = self.registry.remove(session_id).await {
            tracing::info!(
                session_id = %session_id,
                subject_id = %session.user.id,
                "Session disconnected"
            );
        }
    }

    /// Handle one client command, reporting any rejection to the sender.
    pub async fn dispatch(&self, session_id: &SessionId, command: ClientCommand) {
        if let Err(e) = self.execute(session_id, command).await {
            self.reject(session_id, &e).await;
        }
    }

    /// Send an `error` event for `error` to one session.
    pub async fn reject(&self, session_id: &SessionId, error: &TrackingError) {
        tracing::debug!(
            session_id = %session_id,
            code = %error.code(),
            error = %error,
            "Request rejected"
        );
        self.registry
            .send_to(
                session_id,
                TrackingEvent::Error {
                    code: error.code(),
                    message: error.client_message(),
                },
            )
            .await;
    }

    async fn execute(
        &self,
        session_id: &SessionId,
        command: ClientCommand,
    ) -> Result<(), TrackingError> {
        match command {
            ClientCommand::SubscribeBus(bus_id) => {
                self.on_subscribe(session_id, Topic::Bus(BusId::new(bus_id)?))
                    .await
            }
            ClientCommand::UnsubscribeBus(bus_id) => {
                self.on_unsubscribe(session_id, &Topic::Bus(BusId::new(bus_id)?))
                    .await
            }
            ClientCommand::SubscribeAllBuses => {
                self.on_subscribe(session_id, Topic::AllBuses).await
            }
            ClientCommand::UnsubscribeAllBuses => {
                self.on_unsubscribe(session_id, &Topic::AllBuses).await
            }
            ClientCommand::UpdateLocation(cmd) => {
                let session = self.live_session(session_id).await?;
                self.router.publish_location(&session.user, cmd).await?;
                Ok(())
            }
            ClientCommand::UpdateStatus(cmd) => {
                let session = self.live_session(session_id).await?;
                self.router.publish_status(&session.user, cmd).await?;
                Ok(())
            }
            ClientCommand::Ping => {
                self.registry
                    .send_to(
                        session_id,
                        TrackingEvent::Pong {
                            timestamp: Timestamp::now(),
                        },
                    )
                    .await;
                Ok(())
            }
        }
    }

    async fn live_session(&self, session_id: &SessionId) -> Result<Session, TrackingError> {
        self.registry
            .session(session_id)
            .await
            .ok_or(TrackingError::SessionGone(*session_id))
    }

    async fn send_snapshot(&self, session_id: &SessionId, bus_id: &BusId) {
        match self.store.get_current(bus_id).await {
            Ok(Some(state)) => {
                self.registry
                    .send_snapshot(session_id, (&state).into())
                    .await;
            }
            Ok(None) => {
                tracing::debug!(bus_id = %bus_id, "No snapshot, bus unknown");
            }
            Err(e) => {
                tracing::warn!(bus_id = %bus_id, error = %e, "Snapshot read failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockIdentityVerifier;
    use crate::adapters::fleet::InMemoryFleetStore;
    use crate::application::tracking::commands::{PublishLocation, PublishStatus};
    use crate::domain::fleet::BusStatus;
    use crate::domain::foundation::{ErrorCode, Role};

    struct Fixture {
        lifecycle: ConnectionLifecycle,
        registry: Arc<SessionRegistry>,
    }

    async fn fixture() -> Fixture {
        let verifier = MockIdentityVerifier::new()
            .with_test_user("driver-token", "driver-1", Role::Driver)
            .with_test_user("parent-token", "parent-1", Role::Parent)
            .with_test_user("admin-token", "admin-1", Role::Admin);
        let store = Arc::new(InMemoryFleetStore::new());
        store.insert_bus(BusId::new("B1").unwrap()).await;
        let registry = Arc::new(SessionRegistry::with_default_capacity());
        let router = Arc::new(BroadcastRouter::new(registry.clone(), store.clone()));
        let lifecycle =
            ConnectionLifecycle::new(Arc::new(verifier), registry.clone(), store, router);
        Fixture {
            lifecycle,
            registry,
        }
    }

    async fn connect(fx: &Fixture, token: &str) -> Connection {
        let mut conn = fx.lifecycle.on_connect(Some(token)).await.unwrap();
        match conn.inbox.recv().await {
            Some(TrackingEvent::Connected { session_id, .. }) => {
                assert_eq!(session_id, conn.session.id)
            }
            other => panic!("expected connected greeting, got {:?}", other),
        }
        conn
    }

    fn expect_error(event: Option<TrackingEvent>, code: ErrorCode) -> String {
        match event {
            Some(TrackingEvent::Error { code: got, message }) => {
                assert_eq!(got, code);
                message
            }
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connect_registers_session_with_role_from_credential() {
        let fx = fixture().await;

        let conn = connect(&fx, "driver-token").await;

        assert_eq!(conn.session.user.role, Role::Driver);
        assert_eq!(fx.registry.session_count().await, 1);
    }

    #[tokio::test]
    async fn invalid_credential_creates_no_session() {
        let fx = fixture().await;

        let result = fx.lifecycle.on_connect(Some("forged")).await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
        assert_eq!(fx.registry.session_count().await, 0);
    }

    #[tokio::test]
    async fn missing_credential_is_refused() {
        let fx = fixture().await;

        assert!(matches!(
            fx.lifecycle.on_connect(None).await,
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            fx.lifecycle.on_connect(Some("  ")).await,
            Err(AuthError::MissingCredential)
        ));
        assert_eq!(fx.registry.session_count().await, 0);
    }

    #[tokio::test]
    async fn subscribe_bus_sends_current_snapshot() {
        let fx = fixture().await;
        let mut conn = connect(&fx, "parent-token").await;

        fx.lifecycle
            .dispatch(&conn.session.id, ClientCommand::SubscribeBus("B1".into()))
            .await;

        match conn.inbox.recv().await {
            Some(TrackingEvent::BusLocation(snapshot)) => {
                assert_eq!(snapshot.bus_id.as_str(), "B1");
                assert_eq!(snapshot.status, BusStatus::Inactive);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn subscribe_unknown_bus_joins_without_snapshot() {
        let fx = fixture().await;
        let mut conn = connect(&fx, "parent-token").await;

        fx.lifecycle
            .dispatch(&conn.session.id, ClientCommand::SubscribeBus("B9".into()))
            .await;

        assert!(conn.inbox.try_recv().is_err());
        let topics = fx.registry.subscriptions(&conn.session.id).await.unwrap();
        assert!(topics.contains(&Topic::Bus(BusId::new("B9").unwrap())));
    }

    #[tokio::test]
    async fn subscribe_blank_bus_id_is_rejected() {
        let fx = fixture().await;
        let mut conn = connect(&fx, "parent-token").await;

        fx.lifecycle
            .dispatch(&conn.session.id, ClientCommand::SubscribeBus("".into()))
            .await;

        expect_error(conn.inbox.recv().await, ErrorCode::ValidationFailed);
        assert!(fx
            .registry
            .subscriptions(&conn.session.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_all_buses_without_membership_is_silent() {
        let fx = fixture().await;
        let mut conn = connect(&fx, "parent-token").await;

        fx.lifecycle
            .dispatch(&conn.session.id, ClientCommand::UnsubscribeAllBuses)
            .await;

        assert!(conn.inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn parent_location_update_gets_error_and_no_broadcast() {
        let fx = fixture().await;
        let mut parent = connect(&fx, "parent-token").await;
        let mut admin = connect(&fx, "admin-token").await;
        fx.lifecycle
            .dispatch(&admin.session.id, ClientCommand::SubscribeAllBuses)
            .await;

        fx.lifecycle
            .dispatch(
                &parent.session.id,
                ClientCommand::UpdateLocation(PublishLocation {
                    bus_id: "B1".into(),
                    coordinates: vec![1.0, 2.0],
                    speed: None,
                    heading: None,
                }),
            )
            .await;

        let message = expect_error(parent.inbox.recv().await, ErrorCode::Forbidden);
        assert_eq!(message, "Not authorized to update location");
        assert!(admin.inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn not_found_is_reported_to_sender_only() {
        let fx = fixture().await;
        let mut driver = connect(&fx, "driver-token").await;
        let mut admin = connect(&fx, "admin-token").await;
        fx.lifecycle
            .dispatch(&admin.session.id, ClientCommand::SubscribeAllBuses)
            .await;

        fx.lifecycle
            .dispatch(
                &driver.session.id,
                ClientCommand::UpdateStatus(PublishStatus {
                    bus_id: "missing".into(),
                    status: "active".into(),
                }),
            )
            .await;

        let message = expect_error(driver.inbox.recv().await, ErrorCode::BusNotFound);
        assert_eq!(message, "Bus not found");
        assert!(admin.inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn ping_answers_with_pong() {
        let fx = fixture().await;
        let mut conn = connect(&fx, "parent-token").await;

        fx.lifecycle
            .dispatch(&conn.session.id, ClientCommand::Ping)
            .await;

        assert!(matches!(
            conn.inbox.recv().await,
            Some(TrackingEvent::Pong { .. })
        ));
    }

    #[tokio::test]
    async fn disconnect_purges_session_and_topics() {
        let fx = fixture().await;
        let conn = connect(&fx, "parent-token").await;
        fx.lifecycle
            .dispatch(&conn.session.id, ClientCommand::SubscribeAllBuses)
            .await;

        fx.lifecycle.on_disconnect(&conn.session.id).await;
        fx.lifecycle.on_disconnect(&conn.session.id).await;

        assert_eq!(fx.registry.session_count().await, 0);
        assert_eq!(fx.registry.subscriber_count(&Topic::AllBuses).await, 0);
    }

    #[tokio::test]
    async fn commands_after_disconnect_are_ignored() {
        let fx = fixture().await;
        let conn = connect(&fx, "driver-token").await;
        let id = conn.session.id;
        fx.lifecycle.on_disconnect(&id).await;

        fx.lifecycle
            .dispatch(&id, ClientCommand::SubscribeAllBuses)
            .await;

        assert_eq!(fx.registry.subscriber_count(&Topic::AllBuses).await, 0);
    }
}
