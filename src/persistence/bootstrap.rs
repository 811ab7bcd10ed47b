//! One-time creation and seeding of the game schema.
//!
//! Bootstrap runs inside a single transaction: schema, tables, indexes,
//! the administrator account, every map with its events and encounters,
//! and the configuration record. PostgreSQL DDL is transactional, so a
//! failure at any step leaves no schema behind and the next run starts
//! from scratch.

use sqlx::{Connection, PgConnection};

use super::assets::AssetLoader;
use super::document::to_document;
use super::models::RecordKey;
use super::postgres;
use super::schema::{SchemaName, Table};
use crate::domain::account::new_account_document;
use crate::domain::server_config::ADMIN_PERMISSION;
use crate::domain::{MapSeed, ServerConfig};
use crate::error::StoreError;
use crate::security::SecurityHooks;

/// Username of the seeded administrator.
pub const ADMIN_USERNAME: &str = "admin";

/// Key of the configuration singleton row.
pub const CONFIG_KEY: RecordKey = RecordKey::Int(1);

/// What a bootstrap run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The schema already existed; nothing was written.
    AlreadyPresent,
    /// The schema was created and seeded.
    Created {
        /// Maps imported.
        maps: usize,
        /// Events imported.
        events: usize,
        /// Encounter entries imported.
        encounters: usize,
    },
}

/// Creates and seeds the schema on first run.
#[derive(Debug)]
pub struct SchemaBootstrapper<'a> {
    schema: &'a SchemaName,
    assets: &'a AssetLoader,
    security: &'a dyn SecurityHooks,
    seed_config: &'a ServerConfig,
    admin_password: &'a str,
}

impl<'a> SchemaBootstrapper<'a> {
    /// Creates a bootstrapper for `schema`.
    #[must_use]
    pub const fn new(
        schema: &'a SchemaName,
        assets: &'a AssetLoader,
        security: &'a dyn SecurityHooks,
        seed_config: &'a ServerConfig,
        admin_password: &'a str,
    ) -> Self {
        Self {
            schema,
            assets,
            security,
            seed_config,
            admin_password,
        }
    }

    /// Creates and seeds the schema unless it already exists.
    ///
    /// When it exists, the security subsystem is told to load its tokens
    /// and nothing else happens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] on database failure and
    /// [`StoreError::Asset`] / [`StoreError::AssetFormat`] when a map
    /// asset is missing or malformed. Either way nothing is committed.
    pub async fn run(&self, conn: &mut PgConnection) -> Result<BootstrapOutcome, StoreError> {
        let schemas = postgres::list_schemas(conn).await?;
        if schemas.iter().any(|name| name == self.schema.as_str()) {
            self.security.load_tokens();
            tracing::info!(schema = self.schema.as_str(), "database initialized");
            return Ok(BootstrapOutcome::AlreadyPresent);
        }

        tracing::warn!(
            schema = self.schema.as_str(),
            "database not found, creating it"
        );
        let mut tx = conn.begin().await?;

        postgres::execute(&mut tx, &format!("CREATE SCHEMA {}", self.schema)).await?;
        for table in Table::ALL {
            let table_ref = self.schema.table(table);
            postgres::execute(&mut tx, &table_ref.create_sql()).await?;
            if let Some(index) = table_ref.index_sql() {
                postgres::execute(&mut tx, &index).await?;
            }
            tracing::info!(table = table.name(), "table created");
        }

        self.seed_admin(&mut tx).await?;
        let (maps, events, encounters) = self.seed_maps(&mut tx).await?;

        postgres::insert(
            &mut tx,
            self.schema.table(Table::Config),
            CONFIG_KEY,
            &to_document(self.seed_config)?,
        )
        .await?;
        tracing::info!("initial server configuration created");

        tx.commit().await?;
        tracing::info!(
            schema = self.schema.as_str(),
            maps,
            events,
            encounters,
            "database initialized"
        );
        Ok(BootstrapOutcome::Created {
            maps,
            events,
            encounters,
        })
    }

    async fn seed_admin(&self, conn: &mut PgConnection) -> Result<(), StoreError> {
        let digest = self.security.hash_password(self.admin_password);
        let mut doc = new_account_document(
            &self.seed_config.new_player_details,
            ADMIN_USERNAME,
            Some(digest),
        )?;
        doc.insert("permission".to_string(), ADMIN_PERMISSION.into());
        postgres::insert(conn, self.schema.table(Table::Users), RecordKey::random(), &doc).await?;
        tracing::info!(username = ADMIN_USERNAME, "initial admin account created");
        Ok(())
    }

    async fn seed_maps(&self, conn: &mut PgConnection) -> Result<(usize, usize, usize), StoreError> {
        let index = self.assets.map_index().await?;
        let mut event_count = 0usize;
        let mut encounter_count = 0usize;

        for info in &index {
            let file = self.assets.map_file(info.id).await?;
            let seed = MapSeed::from_asset(info, file).map_err(|e| {
                StoreError::asset_format(
                    self.assets.root().join(AssetLoader::map_file_name(info.id)),
                    e.to_string(),
                )
            })?;

            postgres::insert(
                conn,
                self.schema.table(Table::Maps),
                RecordKey::Int(info.id),
                &to_document(&seed.record)?,
            )
            .await?;
            for event in &seed.events {
                postgres::insert(conn, self.schema.table(Table::Events), RecordKey::random(), event)
                    .await?;
            }
            for encounter in &seed.encounters {
                postgres::insert(
                    conn,
                    self.schema.table(Table::Encounters),
                    RecordKey::random(),
                    encounter,
                )
                .await?;
            }

            event_count = event_count.saturating_add(seed.events.len());
            encounter_count = encounter_count.saturating_add(seed.encounters.len());
            tracing::info!(map_id = info.id, name = %info.name, "map created");
        }

        Ok((index.len(), event_count, encounter_count))
    }
}
