use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unipool_api::{app, AppState};
use unipool_core::routing::RoutePlanner;
use unipool_ride::RideLifecycle;
use unipool_store::{
    DbClient, InMemoryNotificationStore, PermissiveUserDirectory, PostgresRideRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unipool_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = unipool_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Unipool API on port {}", config.server.port);

    // Postgres connection + schema
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let rides: Arc<dyn unipool_ride::RideRepository> =
        Arc::new(PostgresRideRepository::new(db.pool.clone()));
    let notifications = Arc::new(InMemoryNotificationStore::new());
    let directory: Arc<dyn unipool_core::directory::UserDirectory> =
        Arc::new(PermissiveUserDirectory);

    // No live routing gateway wired in yet; every estimate uses the
    // deterministic offline formula.
    let planner = Arc::new(RoutePlanner::new(
        None,
        Duration::from_millis(config.routing.timeout_ms),
    ));

    let lifecycle = Arc::new(RideLifecycle::new(rides.clone(), notifications.clone()));

    // Lifecycle event broadcast for the SSE stream
    let (events_tx, _) = tokio::sync::broadcast::channel(100);

    let app_state = AppState {
        rides,
        lifecycle,
        planner,
        directory,
        notifications,
        events_tx,
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
