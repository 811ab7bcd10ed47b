//! Player account queries.

use sqlx::Connection;
use uuid::Uuid;

use crate::database::Database;
use crate::domain::account::{STATS_FIELD, new_account_document};
use crate::domain::{Account, PlayerUpdate, Registration};
use crate::error::StoreError;
use crate::persistence::document::WriteMode;
use crate::persistence::models::RecordKey;
use crate::persistence::postgres;
use crate::persistence::schema::Table;

/// Accounts in the `users` table.
#[derive(Debug, Clone, Copy)]
pub struct PlayerRepository<'a> {
    db: &'a Database,
}

impl<'a> PlayerRepository<'a> {
    pub(crate) const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Every account, in creation order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure, or if a
    /// stored account cannot be decoded.
    pub async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let records = postgres::fetch_all(&mut conn, self.db.schema().table(Table::Users)).await?;
        records.into_iter().map(|record| record.decode()).collect()
    }

    /// Finds an account by username, ignoring case.
    ///
    /// Should duplicates exist, the most recently created one wins.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let mut records = postgres::fetch_by_username(
            &mut conn,
            self.db.schema().table(Table::Users),
            username,
            false,
        )
        .await?;
        records.pop().map(|record| record.decode()).transpose()
    }

    /// Finds an account by its storage id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let record = postgres::fetch_one(
            &mut conn,
            self.db.schema().table(Table::Users),
            RecordKey::Uuid(id),
        )
        .await?;
        record.map(|record| record.decode()).transpose()
    }

    /// Deletes an account. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let removed = postgres::delete(
            &mut conn,
            self.db.schema().table(Table::Users),
            RecordKey::Uuid(id),
        )
        .await?;
        Ok(removed > 0)
    }

    /// Creates an account from the new-player template.
    ///
    /// The password digest is stored only when the live configuration
    /// requires passwords and one was supplied. Username uniqueness is the
    /// caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn register(&self, details: &Registration) -> Result<Uuid, StoreError> {
        let cache = self.db.config_cache();
        let template = match cache.new_player_template().await {
            Some(template) => template,
            None => self.db.seed_config().new_player_details.clone(),
        };
        let digest = match (cache.password_required().await, &details.password) {
            (true, Some(password)) => Some(self.db.security().hash_password(password)),
            _ => None,
        };
        let doc = new_account_document(&template, &details.username, digest)?;

        let id = Uuid::new_v4();
        let mut conn = self.db.connections().ensure_connected().await?;
        postgres::insert(
            &mut conn,
            self.db.schema().table(Table::Users),
            RecordKey::Uuid(id),
            &doc,
        )
        .await?;
        tracing::info!(username = %details.username, %id, "account registered");
        Ok(id)
    }

    /// Writes the supplied fields onto every account whose username
    /// matches ignoring case.
    ///
    /// Fields are merged into the stored document, except `stats`, which
    /// replaces the stored value wholesale so that removed keys disappear.
    /// Returns the number of accounts written (0 when none matched).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if a supplied field would make
    /// the account undecodable (nothing is written then), or another
    /// [`StoreError`] on connection or query failure.
    pub async fn save(&self, update: PlayerUpdate) -> Result<u64, StoreError> {
        let username = update.username.clone();
        let (patch, stats) = update.into_patch();
        let table = self.db.schema().table(Table::Users);

        let mut conn = self.db.connections().ensure_connected().await?;
        let mut tx = conn.begin().await?;
        let records = postgres::fetch_by_username(&mut tx, table, &username, true).await?;

        let mut written = 0u64;
        for mut record in records {
            WriteMode::Merge.apply(&mut record.doc, patch.clone());
            if let Some(stats) = &stats {
                WriteMode::Replace.apply_field(&mut record.doc, STATS_FIELD, stats.clone());
            }
            Account::validate_document(&record.doc)?;
            written = written.saturating_add(
                postgres::replace_document(&mut tx, table, record.key, &record.doc).await?,
            );
        }
        tx.commit().await?;

        tracing::debug!(%username, written, "player saved");
        Ok(written)
    }
}
