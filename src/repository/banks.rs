//! Item bank queries.

use serde_json::Value;
use uuid::Uuid;

use crate::database::Database;
use crate::domain::{Bank, NewBank};
use crate::error::StoreError;
use crate::persistence::document::{WriteMode, to_document};
use crate::persistence::models::RecordKey;
use crate::persistence::postgres;
use crate::persistence::schema::Table;

/// Banks in the `banks` table.
#[derive(Debug, Clone, Copy)]
pub struct BankRepository<'a> {
    db: &'a Database,
}

impl<'a> BankRepository<'a> {
    pub(crate) const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Every bank, in creation order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn list(&self) -> Result<Vec<Bank>, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let records = postgres::fetch_all(&mut conn, self.db.schema().table(Table::Banks)).await?;
        records.into_iter().map(|record| record.decode()).collect()
    }

    /// Banks whose name matches exactly. Names are not unique.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Bank>, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let records = postgres::fetch_where(
            &mut conn,
            self.db.schema().table(Table::Banks),
            "name",
            &Value::String(name.to_string()),
        )
        .await?;
        records.into_iter().map(|record| record.decode()).collect()
    }

    /// Finds a bank by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Bank>, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let record = postgres::fetch_one(
            &mut conn,
            self.db.schema().table(Table::Banks),
            RecordKey::Uuid(id),
        )
        .await?;
        record.map(|record| record.decode()).transpose()
    }

    /// Creates a bank with the default content for its type.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn create(&self, payload: NewBank) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let doc = payload.into_document();
        let mut conn = self.db.connections().ensure_connected().await?;
        postgres::insert(
            &mut conn,
            self.db.schema().table(Table::Banks),
            RecordKey::Uuid(id),
            &doc,
        )
        .await?;
        Ok(id)
    }

    /// Merges `bank` into the stored bank with the same id. Nested
    /// `content` keys the caller did not send are kept. Returns `false` if
    /// no bank has that id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn save(&self, bank: &Bank) -> Result<bool, StoreError> {
        let patch = to_document(bank)?;
        let mut conn = self.db.connections().ensure_connected().await?;
        postgres::update_document(
            &mut conn,
            self.db.schema().table(Table::Banks),
            RecordKey::Uuid(bank.id),
            WriteMode::Merge,
            patch,
        )
        .await
    }

    /// Deletes a bank. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let removed = postgres::delete(
            &mut conn,
            self.db.schema().table(Table::Banks),
            RecordKey::Uuid(id),
        )
        .await?;
        Ok(removed > 0)
    }
}
