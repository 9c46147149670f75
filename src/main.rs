use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bus_tracker::adapters::auth::JwtIdentityVerifier;
use bus_tracker::adapters::fleet::{InMemoryFleetStore, PostgresFleetStore};
use bus_tracker::app::{build_app, TrackingServices};
use bus_tracker::application::tracking::SessionRegistry;
use bus_tracker::config::AppConfig;
use bus_tracker::domain::foundation::BusId;
use bus_tracker::ports::FleetStateStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Bus tracker starting"
    );

    let store = build_store(&config).await?;
    let verifier = Arc::new(JwtIdentityVerifier::from_config(&config.auth));
    let services = TrackingServices::new(verifier, store, config.tracking.outbox_capacity);

    let app = build_app(&services, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(services.registry.clone()))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter; JSON output in production.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }
}

async fn build_store(
    config: &AppConfig,
) -> Result<Arc<dyn FleetStateStore>, Box<dyn std::error::Error>> {
    let tracking = &config.tracking;

    let Some(url) = config.database.url() else {
        tracing::warn!("No database configured, using in-memory fleet store");
        let store = InMemoryFleetStore::with_retention(
            tracking.history_retention_secs,
            tracking.history_max_per_bus,
        );
        for id in tracking.seed_bus_list() {
            store.insert_bus(BusId::new(id)?).await;
        }
        return Ok(Arc::new(store));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.connect_timeout())
        .connect(url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let store = Arc::new(PostgresFleetStore::new(pool));
    spawn_retention_sweep(
        store.clone(),
        tracking.retention_sweep_interval(),
        tracking.history_retention_secs,
        tracking.history_max_per_bus,
    );
    Ok(store)
}

fn spawn_retention_sweep(
    store: Arc<PostgresFleetStore>,
    every: std::time::Duration,
    retention_secs: u64,
    max_per_bus: usize,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.prune_history(retention_secs, max_per_bus).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Pruned location history"),
                Err(e) => tracing::warn!(error = %e, "History retention sweep failed"),
            }
        }
    });
}

async fn shutdown_signal(registry: Arc<SessionRegistry>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    let dropped = registry.shutdown().await;
    tracing::info!(sessions = dropped, "Shutting down, closed live sessions");
}
