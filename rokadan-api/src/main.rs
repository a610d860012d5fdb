use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rokadan_api::{app, AppState, AuthConfig};
use rokadan_core::SystemClock;
use rokadan_reservation::ReservationService;
use rokadan_store::{Config, DbClient, PgAccessControl, PgCatalogReader, PgReservationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rokadan_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Rokadan API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let clock = SystemClock::with_offset_minutes(config.business_rules.utc_offset_minutes)
        .context("business_rules.utc_offset_minutes is out of range")?;

    let reservations = ReservationService::new(
        Arc::new(PgReservationStore::new(db.pool.clone())),
        Arc::new(PgCatalogReader::new(db.pool.clone())),
        Arc::new(PgAccessControl::new(db.pool.clone())),
        Arc::new(clock),
    );

    let app_state = AppState {
        reservations: Arc::new(reservations),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}
