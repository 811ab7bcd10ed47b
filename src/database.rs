//! The persistence context shared by every repository.
//!
//! Constructed once at process start and passed by reference; it owns the
//! connection manager, the configuration cache and the bootstrap flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Settings;
use crate::domain::ServerConfig;
use crate::error::StoreError;
use crate::persistence::assets::AssetLoader;
use crate::persistence::bootstrap::{BootstrapOutcome, SchemaBootstrapper};
use crate::persistence::connection::ConnectionManager;
use crate::persistence::postgres::PgConnector;
use crate::persistence::schema::SchemaName;
use crate::repository::{
    BankRepository, ConfigCache, ConfigRepository, MapRepository, PlayerRepository,
};
use crate::security::SecurityHooks;

/// Explicit persistence context.
#[derive(Debug)]
pub struct Database {
    connections: ConnectionManager<PgConnector>,
    schema: SchemaName,
    assets: AssetLoader,
    security: Arc<dyn SecurityHooks>,
    seed_config: ServerConfig,
    admin_password: String,
    config_cache: ConfigCache,
    initialized: AtomicBool,
}

impl Database {
    /// Builds the context. No connection is opened yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] for a malformed database URL
    /// or schema name.
    pub fn new(settings: &Settings, security: Arc<dyn SecurityHooks>) -> Result<Self, StoreError> {
        let connector = PgConnector::new(&settings.database_url, settings.connect_timeout())?;
        Ok(Self {
            connections: ConnectionManager::new(connector, settings.idle_timeout()),
            schema: SchemaName::new(&settings.database_schema)?,
            assets: AssetLoader::new(settings.content_dir.clone()),
            security,
            seed_config: settings.seed_server_config(),
            admin_password: settings.admin_password.clone(),
            config_cache: ConfigCache::new(),
            initialized: AtomicBool::new(false),
        })
    }

    /// Creates and seeds the schema on the first call; later calls return
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the datastore is unreachable,
    /// or the first bootstrap step failure (nothing is committed then).
    pub async fn initialize_once(&self) -> Result<BootstrapOutcome, StoreError> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(BootstrapOutcome::AlreadyPresent);
        }
        let mut conn = self.connections.ensure_connected().await?;
        // A concurrent caller may have finished while we waited for the handle.
        if self.initialized.load(Ordering::Acquire) {
            return Ok(BootstrapOutcome::AlreadyPresent);
        }

        let outcome = SchemaBootstrapper::new(
            &self.schema,
            &self.assets,
            self.security.as_ref(),
            &self.seed_config,
            &self.admin_password,
        )
        .run(&mut conn)
        .await?;
        self.initialized.store(true, Ordering::Release);
        Ok(outcome)
    }

    /// Player accounts.
    #[must_use]
    pub const fn players(&self) -> PlayerRepository<'_> {
        PlayerRepository::new(self)
    }

    /// Maps, events and encounters.
    #[must_use]
    pub const fn maps(&self) -> MapRepository<'_> {
        MapRepository::new(self)
    }

    /// Item banks.
    #[must_use]
    pub const fn banks(&self) -> BankRepository<'_> {
        BankRepository::new(self)
    }

    /// Server configuration.
    #[must_use]
    pub const fn config(&self) -> ConfigRepository<'_> {
        ConfigRepository::new(self)
    }

    /// The live configuration cache.
    #[must_use]
    pub const fn config_cache(&self) -> &ConfigCache {
        &self.config_cache
    }

    /// The connection manager.
    #[must_use]
    pub const fn connections(&self) -> &ConnectionManager<PgConnector> {
        &self.connections
    }

    /// Schema holding the game tables.
    #[must_use]
    pub const fn schema(&self) -> &SchemaName {
        &self.schema
    }

    /// Closes the shared connection, if open.
    pub async fn close(&self) {
        self.connections.close().await;
    }

    pub(crate) fn security(&self) -> &dyn SecurityHooks {
        self.security.as_ref()
    }

    pub(crate) const fn seed_config(&self) -> &ServerConfig {
        &self.seed_config
    }
}
