//! World map queries: headers plus their events and encounter tables.

use serde_json::Value;

use crate::database::Database;
use crate::domain::map::{
    MAP_ID_FIELD, encounter_into_public, event_into_public, map_index,
};
use crate::domain::{MapIndexEntry, MapRecord, MapView};
use crate::error::StoreError;
use crate::persistence::document::Document;
use crate::persistence::models::RecordKey;
use crate::persistence::postgres;
use crate::persistence::schema::Table;

/// Maps, events and encounters.
#[derive(Debug, Clone, Copy)]
pub struct MapRepository<'a> {
    db: &'a Database,
}

impl<'a> MapRepository<'a> {
    pub(crate) const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Every map header (no events or encounters), in import order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn list(&self) -> Result<Vec<MapRecord>, StoreError> {
        let mut conn = self.db.connections().ensure_connected().await?;
        let records = postgres::fetch_all(&mut conn, self.db.schema().table(Table::Maps)).await?;
        records.into_iter().map(|record| record.decode()).collect()
    }

    /// Re-assembles a map from its normalized records.
    ///
    /// Events and encounters are always included; `include_header` adds
    /// the stored header fields. An unknown id yields empty lists and no
    /// header.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn get(&self, id: i64, include_header: bool) -> Result<MapView, StoreError> {
        let schema = self.db.schema();
        let map_id = Value::from(id);
        let mut conn = self.db.connections().ensure_connected().await?;

        let events =
            postgres::fetch_where(&mut conn, schema.table(Table::Events), MAP_ID_FIELD, &map_id)
                .await?;
        let encounters = postgres::fetch_where(
            &mut conn,
            schema.table(Table::Encounters),
            MAP_ID_FIELD,
            &map_id,
        )
        .await?;
        let header = if include_header {
            postgres::fetch_one(&mut conn, schema.table(Table::Maps), RecordKey::Int(id))
                .await?
                .map(|record| record.decode::<MapRecord>())
                .transpose()?
        } else {
            None
        };

        Ok(MapView {
            header,
            events: events
                .into_iter()
                .map(|record| event_into_public(record.into_document()))
                .collect(),
            encounter_list: encounters
                .into_iter()
                .map(|record| encounter_into_public(record.into_document()))
                .collect(),
        })
    }

    /// The map index in the shape the authoring tool writes.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn index(&self) -> Result<Vec<Option<MapIndexEntry>>, StoreError> {
        let records = self.list().await?;
        Ok(map_index(&records))
    }

    /// One map in the shape of its authoring file, or `None` if the map
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on connection or query failure.
    pub async fn authoring_file(&self, id: i64) -> Result<Option<Document>, StoreError> {
        let view = self.get(id, true).await?;
        if view.header.is_none() {
            return Ok(None);
        }
        Ok(Some(view.into_authoring_file()))
    }
}
