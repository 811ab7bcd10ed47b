//! World maps and their embedded sub-entities.
//!
//! A map file produced by the authoring tool carries its events and its
//! random encounter table inline. In storage they live in separate
//! tables joined by `mapId`; the functions here convert between the two
//! shapes.
//!
//! Events have two identities: the authoring-local id (unique only
//! within one map) and the storage key. In storage the authoring id is
//! kept under `idInMap` so that it never collides with the storage `id`;
//! the public view projects it back onto `id` and drops the storage key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persistence::document::Document;

/// Inline event list key in an authoring map file.
pub const EVENTS_FIELD: &str = "events";

/// Inline encounter list key in an authoring map file.
pub const ENCOUNTERS_FIELD: &str = "encounterList";

/// Key linking an event or encounter to its map.
pub const MAP_ID_FIELD: &str = "mapId";

/// Key holding the authoring-local event id in storage.
pub const ID_IN_MAP_FIELD: &str = "idInMap";

const ID_FIELD: &str = "id";

/// One entry of the authoring map index (`MapInfos.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    /// Authoring-assigned map id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Parent map in the authoring tree (0 for top level).
    #[serde(default)]
    pub parent_id: i64,
}

/// A stored map header. Events and encounters are never embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRecord {
    /// Authoring-assigned map id (stable across runs).
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Parent map in the authoring tree.
    #[serde(default)]
    pub parent_id: i64,
    /// Everything else from the map file (tiles, tileset, audio, ...).
    #[serde(flatten)]
    pub payload: Document,
}

/// A map split into its normalized records, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSeed {
    /// Header without `events` or `encounterList`.
    pub record: MapRecord,
    /// Events in storage form (`idInMap` + `mapId`).
    pub events: Vec<Document>,
    /// Encounters stamped with `mapId`.
    pub encounters: Vec<Document>,
}

/// Reasons an authoring map file cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapShapeError {
    /// A required list is absent or not an array.
    MissingList(&'static str),
    /// An entry of a list is not an object.
    NotAnObject(&'static str, usize),
    /// An event has no authoring id.
    EventWithoutId(usize),
}

impl std::fmt::Display for MapShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingList(field) => write!(f, "missing `{field}` array"),
            Self::NotAnObject(field, index) => write!(f, "`{field}[{index}]` is not an object"),
            Self::EventWithoutId(index) => write!(f, "`events[{index}]` has no `id`"),
        }
    }
}

impl MapSeed {
    /// Splits an authoring map file into header, events and encounters.
    ///
    /// `null` event slots are skipped. The index entry's id, name and
    /// parent override whatever the file itself says.
    ///
    /// # Errors
    ///
    /// Returns a [`MapShapeError`] when the file lacks its lists or an
    /// entry has the wrong shape.
    pub fn from_asset(info: &MapInfo, mut file: Document) -> Result<Self, MapShapeError> {
        let raw_events = take_list(&mut file, EVENTS_FIELD)?;
        let raw_encounters = take_list(&mut file, ENCOUNTERS_FIELD)?;

        let mut events = Vec::with_capacity(raw_events.len());
        for (index, slot) in raw_events.into_iter().enumerate() {
            match slot {
                Value::Null => {}
                Value::Object(event) => {
                    let stored = event_into_stored(event, info.id)
                        .ok_or(MapShapeError::EventWithoutId(index))?;
                    events.push(stored);
                }
                _ => return Err(MapShapeError::NotAnObject(EVENTS_FIELD, index)),
            }
        }

        let mut encounters = Vec::with_capacity(raw_encounters.len());
        for (index, slot) in raw_encounters.into_iter().enumerate() {
            let Value::Object(mut encounter) = slot else {
                return Err(MapShapeError::NotAnObject(ENCOUNTERS_FIELD, index));
            };
            encounter.insert(MAP_ID_FIELD.to_string(), Value::from(info.id));
            encounters.push(encounter);
        }

        file.remove(ID_FIELD);
        file.remove("name");
        file.remove("parentId");
        let record = MapRecord {
            id: info.id,
            name: info.name.clone(),
            parent_id: info.parent_id,
            payload: file,
        };

        Ok(Self {
            record,
            events,
            encounters,
        })
    }
}

fn take_list(file: &mut Document, field: &'static str) -> Result<Vec<Value>, MapShapeError> {
    match file.remove(field) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(MapShapeError::MissingList(field)),
    }
}

/// Converts an authoring event into its storage form.
///
/// Moves `id` to `idInMap` and stamps `mapId`. Returns `None` when the
/// event has no `id`.
#[must_use]
pub fn event_into_stored(mut event: Document, map_id: i64) -> Option<Document> {
    let id_in_map = event.remove(ID_FIELD)?;
    event.insert(ID_IN_MAP_FIELD.to_string(), id_in_map);
    event.insert(MAP_ID_FIELD.to_string(), Value::from(map_id));
    Some(event)
}

/// Converts a stored event into its public form.
///
/// Drops the storage key and `mapId`, and moves `idInMap` back to `id`.
/// Inverse of [`event_into_stored`].
#[must_use]
pub fn event_into_public(mut stored: Document) -> Document {
    stored.remove(ID_FIELD);
    stored.remove(MAP_ID_FIELD);
    if let Some(id_in_map) = stored.remove(ID_IN_MAP_FIELD) {
        stored.insert(ID_FIELD.to_string(), id_in_map);
    }
    stored
}

/// Converts a stored encounter into its public form (storage key dropped).
#[must_use]
pub fn encounter_into_public(mut stored: Document) -> Document {
    stored.remove(ID_FIELD);
    stored
}

/// A map re-assembled from normalized storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    /// Header fields, present only when requested.
    #[serde(flatten)]
    pub header: Option<MapRecord>,
    /// Events in public form.
    pub events: Vec<Document>,
    /// Random encounter table.
    pub encounter_list: Vec<Document>,
}

impl MapView {
    /// Renders the view in the authoring file shape.
    ///
    /// `id` and `name` are left to the map index; the events list regains
    /// its leading `null` slot.
    #[must_use]
    pub fn into_authoring_file(self) -> Document {
        let mut file = Document::new();
        if let Some(header) = self.header {
            file.insert("parentId".to_string(), Value::from(header.parent_id));
            file.extend(header.payload);
        }
        let events = std::iter::once(Value::Null)
            .chain(self.events.into_iter().map(Value::Object))
            .collect();
        file.insert(EVENTS_FIELD.to_string(), Value::Array(events));
        file.insert(
            ENCOUNTERS_FIELD.to_string(),
            Value::Array(self.encounter_list.into_iter().map(Value::Object).collect()),
        );
        file
    }
}

/// One entry of the map index served back to the game client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapIndexEntry {
    /// Map id.
    pub id: i64,
    /// Whether the node is expanded in the authoring tree.
    pub expanded: bool,
    /// Display name.
    pub name: String,
    /// Position in the tree, starting at 1.
    pub order: usize,
    /// Parent map.
    pub parent_id: i64,
    /// Editor scroll position.
    pub scroll_x: i64,
    /// Editor scroll position.
    pub scroll_y: i64,
}

/// Builds the authoring map index from stored headers.
///
/// Slot 0 is always `None`, as in the files the authoring tool writes.
#[must_use]
pub fn map_index(records: &[MapRecord]) -> Vec<Option<MapIndexEntry>> {
    std::iter::once(None)
        .chain(records.iter().enumerate().map(|(index, record)| {
            Some(MapIndexEntry {
                id: record.id,
                expanded: true,
                name: record.name.clone(),
                order: index.saturating_add(1),
                parent_id: record.parent_id,
                scroll_x: 0,
                scroll_y: 0,
            })
        }))
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn forest() -> MapInfo {
        MapInfo {
            id: 7,
            name: "Forest".to_string(),
            parent_id: 0,
        }
    }

    #[test]
    fn event_projection_round_trips() {
        let authoring = doc(json!({"id": 1, "x": 3, "y": 4}));
        let Some(stored) = event_into_stored(authoring.clone(), 7) else {
            panic!("event has an id");
        };
        assert_eq!(
            Value::Object(stored.clone()),
            json!({"idInMap": 1, "mapId": 7, "x": 3, "y": 4})
        );

        let mut with_key = stored;
        with_key.insert("id".into(), json!("4f7c2a9e-0000-4000-8000-000000000001"));
        assert_eq!(event_into_public(with_key), authoring);
    }

    #[test]
    fn stored_event_never_uses_public_id() {
        let Some(stored) = event_into_stored(doc(json!({"id": 12, "name": "Door"})), 3) else {
            panic!("event has an id");
        };
        assert!(!stored.contains_key("id"));
    }

    #[test]
    fn split_skips_null_events_and_strips_lists() {
        let file = doc(json!({
            "width": 17,
            "events": [null, {"id": 1, "x": 3, "y": 4}, null],
            "encounterList": [{"monsters": ["slime"]}]
        }));
        let Ok(seed) = MapSeed::from_asset(&forest(), file) else {
            panic!("valid map file");
        };
        assert_eq!(seed.record.id, 7);
        assert_eq!(seed.record.name, "Forest");
        assert_eq!(Value::Object(seed.record.payload), json!({"width": 17}));
        assert_eq!(seed.events.len(), 1);
        assert_eq!(
            seed.encounters,
            vec![doc(json!({"monsters": ["slime"], "mapId": 7}))]
        );
    }

    #[test]
    fn split_rejects_missing_lists() {
        let file = doc(json!({"events": []}));
        assert_eq!(
            MapSeed::from_asset(&forest(), file),
            Err(MapShapeError::MissingList("encounterList"))
        );
    }

    #[test]
    fn split_rejects_events_without_id() {
        let file = doc(json!({"events": [null, {"x": 1}], "encounterList": []}));
        assert_eq!(
            MapSeed::from_asset(&forest(), file),
            Err(MapShapeError::EventWithoutId(1))
        );
    }

    #[test]
    fn full_view_serializes_flat() {
        let view = MapView {
            header: Some(MapRecord {
                id: 7,
                name: "Forest".to_string(),
                parent_id: 0,
                payload: Document::new(),
            }),
            events: vec![doc(json!({"id": 1, "x": 3, "y": 4}))],
            encounter_list: vec![doc(json!({"monsters": ["slime"], "mapId": 7}))],
        };
        let Ok(value) = serde_json::to_value(&view) else {
            panic!("view must serialize");
        };
        assert_eq!(
            value,
            json!({
                "id": 7, "name": "Forest", "parentId": 0,
                "events": [{"id": 1, "x": 3, "y": 4}],
                "encounterList": [{"monsters": ["slime"], "mapId": 7}]
            })
        );
    }

    #[test]
    fn headerless_view_has_only_sub_entities() {
        let view = MapView {
            header: None,
            events: Vec::new(),
            encounter_list: Vec::new(),
        };
        let Ok(value) = serde_json::to_value(&view) else {
            panic!("view must serialize");
        };
        assert_eq!(value, json!({"events": [], "encounterList": []}));
    }

    #[test]
    fn authoring_file_restores_null_slot() {
        let view = MapView {
            header: Some(MapRecord {
                id: 7,
                name: "Forest".to_string(),
                parent_id: 2,
                payload: doc(json!({"width": 17})),
            }),
            events: vec![doc(json!({"id": 1}))],
            encounter_list: Vec::new(),
        };
        assert_eq!(
            Value::Object(view.into_authoring_file()),
            json!({"parentId": 2, "width": 17, "events": [null, {"id": 1}], "encounterList": []})
        );
    }

    #[test]
    fn index_starts_with_placeholder() {
        let records = vec![MapRecord {
            id: 1,
            name: "Town".to_string(),
            parent_id: 0,
            payload: Document::new(),
        }];
        let index = map_index(&records);
        assert_eq!(index.len(), 2);
        assert_eq!(index.first(), Some(&None));
        let Some(Some(town)) = index.get(1) else {
            panic!("town entry present");
        };
        assert_eq!(town.order, 1);
        assert!(town.expanded);
    }
}
