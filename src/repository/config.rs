//! Server configuration queries and cache refresh.

use serde_json::Value;

use crate::database::Database;
use crate::domain::ServerConfig;
use crate::error::StoreError;
use crate::persistence::bootstrap::CONFIG_KEY;
use crate::persistence::document::{WriteMode, from_document, to_document};
use crate::persistence::postgres;
use crate::persistence::schema::Table;

/// The configuration singleton and its cache.
#[derive(Debug, Clone, Copy)]
pub struct ConfigRepository<'a> {
    db: &'a Database,
}

impl<'a> ConfigRepository<'a> {
    pub(crate) const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Replaces the cache with the stored configuration and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingConfig`] before bootstrap, or another
    /// [`StoreError`] on connection, query or decode failure.
    pub async fn reload(&self) -> Result<ServerConfig, StoreError> {
        let config = {
            let mut conn = self.db.connections().ensure_connected().await?;
            let record =
                postgres::fetch_one(&mut conn, self.db.schema().table(Table::Config), CONFIG_KEY)
                    .await?
                    .ok_or(StoreError::MissingConfig)?;
            from_document::<ServerConfig>(record.doc)?
        };
        self.db.config_cache().replace(config.clone()).await;
        Ok(config)
    }

    /// Literal-replaces one top-level field of the stored configuration,
    /// then reloads the cache.
    ///
    /// The previous value is discarded entirely, nested keys included.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the result would no longer
    /// be a valid configuration (nothing is written in that case),
    /// [`StoreError::MissingConfig`] before bootstrap, or another
    /// [`StoreError`] on connection or query failure.
    pub async fn patch(&self, field: &str, value: Value) -> Result<ServerConfig, StoreError> {
        {
            let table = self.db.schema().table(Table::Config);
            let mut conn = self.db.connections().ensure_connected().await?;
            let mut doc = postgres::fetch_one(&mut conn, table, CONFIG_KEY)
                .await?
                .ok_or(StoreError::MissingConfig)?
                .doc;
            WriteMode::Replace.apply_field(&mut doc, field, value.clone());
            from_document::<ServerConfig>(doc)
                .map_err(|e| StoreError::InvalidConfig(format!("`{field}`: {e}")))?;

            postgres::replace_field(&mut conn, table, CONFIG_KEY, field, &value).await?;
        }
        tracing::info!(field, "server configuration field replaced");
        self.reload().await
    }

    /// Writes the whole cached configuration back to storage, merging it
    /// into the stored record.
    ///
    /// Use after editing the cache through
    /// [`ConfigCache::update`](super::ConfigCache::update).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingConfig`] when the cache is empty or no
    /// record is stored, or another [`StoreError`] on connection or query
    /// failure.
    pub async fn persist_cache(&self) -> Result<(), StoreError> {
        let config = self
            .db
            .config_cache()
            .get()
            .await
            .ok_or(StoreError::MissingConfig)?;
        let patch = to_document(&config)?;

        let mut conn = self.db.connections().ensure_connected().await?;
        let found = postgres::update_document(
            &mut conn,
            self.db.schema().table(Table::Config),
            CONFIG_KEY,
            WriteMode::Merge,
            patch,
        )
        .await?;
        if !found {
            return Err(StoreError::MissingConfig);
        }
        tracing::info!("server configuration changes saved");
        Ok(())
    }
}
