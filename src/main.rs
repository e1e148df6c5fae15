use std::sync::Arc;

use anyhow::Context;
use pair_relay_service::{
    config::{Config, StorageBackend},
    db, logging,
    routes::build_router,
    services::{
        IdentityResolver, InMemoryDirectory, InMemoryMessageStore, JwtIdentityResolver,
        MessageStore, ParticipantDirectory, PgMessageStore, PgParticipantDirectory,
    },
    state::AppState,
};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    logging::init_tracing(config.log.format);
    tracing::info!("Configuration loaded successfully");

    let identity: Arc<dyn IdentityResolver> = Arc::new(JwtIdentityResolver::new(&config.jwt));

    let (directory, messages): (Arc<dyn ParticipantDirectory>, Arc<dyn MessageStore>) =
        match config.storage.backend {
            StorageBackend::Postgres => {
                let pool = db::init_pool(&config.database.url, config.database.max_connections)
                    .await
                    .context("failed to connect to database")?;
                tracing::info!("Database connection established");

                if config.database.run_migrations {
                    db::run_migrations(&pool)
                        .await
                        .context("failed to run migrations")?;
                    tracing::info!("Database migrations applied");
                }

                (
                    Arc::new(PgParticipantDirectory::new(pool.clone())),
                    Arc::new(PgMessageStore::new(pool)),
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; history is lost on restart");
                (
                    Arc::new(InMemoryDirectory::new()),
                    Arc::new(InMemoryMessageStore::new()),
                )
            }
        };

    let addr = config.bind_addr();
    let state = AppState::new(Arc::new(config), identity, directory, messages);
    let app = build_router(state);

    tracing::info!("Starting pair-relay-service on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("pair-relay-service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
