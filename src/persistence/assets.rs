//! Reader for the world-authoring content directory.
//!
//! The directory holds `MapInfos.json` (a JSON array whose slot 0 is
//! `null`) and one `MapNNN.json` per map, named by zero-padded id.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::domain::MapInfo;
use crate::error::StoreError;
use crate::persistence::document::Document;

/// File name of the map index.
pub const MAP_INDEX_FILE: &str = "MapInfos.json";

/// Stateless loader for authoring files under one directory.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    /// Creates a loader rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The content directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name of the map with `id`, e.g. `Map007.json`.
    #[must_use]
    pub fn map_file_name(id: i64) -> String {
        format!("Map{id:03}.json")
    }

    /// Loads the map index, skipping `null` placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Asset`] if the file cannot be read and
    /// [`StoreError::AssetFormat`] if it is not an array of map entries.
    pub async fn map_index(&self) -> Result<Vec<MapInfo>, StoreError> {
        let entries: Vec<Option<MapInfo>> = self.read_json(MAP_INDEX_FILE).await?;
        Ok(entries.into_iter().flatten().collect())
    }

    /// Loads one map file as a raw document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Asset`] if the file cannot be read and
    /// [`StoreError::AssetFormat`] if it is not a JSON object.
    pub async fn map_file(&self, id: i64) -> Result<Document, StoreError> {
        self.read_json(&Self::map_file_name(id)).await
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.root.join(name);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Asset {
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|e| StoreError::asset_format(path, e.to_string()))
    }
}
