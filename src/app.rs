//! Composition root: wires ports to the tracking core and builds the
//! axum application.
//!
//! ```text
//! GET  /ws                          live tracking (WebSocket)
//! GET  /api/health                  liveness
//! PUT  /api/buses/:bus_id/location  REST publish
//! PUT  /api/buses/:bus_id/status    REST publish
//! ```

use std::sync::Arc;

use axum::Router;
use http::{HeaderName, HeaderValue, Method};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::http::{tracking_router, TrackingAppState};
use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::application::tracking::{BroadcastRouter, ConnectionLifecycle, SessionRegistry};
use crate::config::ServerConfig;
use crate::ports::{FleetStateStore, IdentityVerifier};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Long-lived services shared by every transport.
#[derive(Clone)]
pub struct TrackingServices {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn FleetStateStore>,
    pub registry: Arc<SessionRegistry>,
    pub lifecycle: Arc<ConnectionLifecycle>,
}

impl TrackingServices {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        store: Arc<dyn FleetStateStore>,
        outbox_capacity: usize,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new(outbox_capacity));
        let router = Arc::new(BroadcastRouter::new(registry.clone(), store.clone()));
        let lifecycle = Arc::new(ConnectionLifecycle::new(
            verifier.clone(),
            registry.clone(),
            store.clone(),
            router,
        ));

        Self {
            verifier,
            store,
            registry,
            lifecycle,
        }
    }
}

/// Build the full application with middleware.
pub fn build_app(services: &TrackingServices, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let api = tracking_router(services.verifier.clone())
        .with_state(TrackingAppState::new(services.lifecycle.clone()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(server.request_timeout()));

    let ws = websocket_router().with_state(WebSocketState::new(services.lifecycle.clone()));

    Router::new()
        .nest("/api", api)
        .merge(ws)
        .layer(cors_layer(server))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockIdentityVerifier;
    use crate::adapters::fleet::InMemoryFleetStore;

    #[test]
    fn services_share_one_registry() {
        let services = TrackingServices::new(
            Arc::new(MockIdentityVerifier::new()),
            Arc::new(InMemoryFleetStore::new()),
            8,
        );

        assert!(Arc::ptr_eq(
            &services.registry,
            services.lifecycle.registry()
        ));
    }

    #[test]
    fn cors_skips_bad_origins() {
        let server = ServerConfig {
            cors_origins: Some("https://ok.example.org,\u{7f}bad".to_string()),
            ..Default::default()
        };
        let _layer = cors_layer(&server);
    }
}
