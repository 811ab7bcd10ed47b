//! mmo-store entry point.
//!
//! Bootstraps the game schema, loads the server configuration and keeps
//! the persistence context alive until interrupted.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mmo_store::Database;
use mmo_store::config::Settings;
use mmo_store::persistence::bootstrap::BootstrapOutcome;
use mmo_store::security::Sha256Security;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = Settings::from_env();
    tracing::info!(
        schema = %settings.database_schema,
        content_dir = %settings.content_dir.display(),
        "starting mmo-store"
    );

    let db = Database::new(&settings, Arc::new(Sha256Security))
        .context("building persistence context")?;
    tracing::debug!(
        idle_secs = db.connections().idle_window().as_secs(),
        "connection idle window"
    );

    match db.initialize_once().await.context("bootstrapping schema")? {
        BootstrapOutcome::AlreadyPresent => tracing::info!("schema already present"),
        BootstrapOutcome::Created {
            maps,
            events,
            encounters,
        } => tracing::info!(maps, events, encounters, "schema created and seeded"),
    }

    let config = db
        .config()
        .reload()
        .await
        .context("loading server configuration")?;
    let maps = db.maps().list().await.context("listing maps")?.len();
    let accounts = db.players().list().await.context("listing accounts")?.len();
    tracing::info!(
        port = config.port,
        password_required = config.password_required,
        maps,
        accounts,
        "persistence ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutting down");
    db.close().await;

    Ok(())
}
