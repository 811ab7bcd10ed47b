//! Stored row models.

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::document::{Document, from_document};
use crate::error::StoreError;

/// Primary key of a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// Storage-assigned UUID.
    Uuid(Uuid),
    /// Caller-assigned integer (map ids, the config singleton).
    Int(i64),
}

impl RecordKey {
    /// A fresh random key.
    #[must_use]
    pub fn random() -> Self {
        Self::Uuid(Uuid::new_v4())
    }

    /// The key as it appears in a document's `id` field.
    #[must_use]
    pub fn to_json(self) -> Value {
        match self {
            Self::Uuid(id) => Value::String(id.to_string()),
            Self::Int(id) => Value::from(id),
        }
    }
}

impl From<Uuid> for RecordKey {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<i64> for RecordKey {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

/// A row: its key plus the document stored without an `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Primary key.
    pub key: RecordKey,
    /// Stored document.
    pub doc: Document,
}

impl Record {
    /// The document with the key injected as `id`.
    #[must_use]
    pub fn into_document(self) -> Document {
        let mut doc = self.doc;
        doc.insert("id".to_string(), self.key.to_json());
        doc
    }

    /// Decodes the document (with `id`) into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] when the document does not
    /// match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        from_document(self.into_document())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn uuid_keys_render_as_strings() {
        let id = Uuid::nil();
        assert_eq!(
            RecordKey::from(id).to_json(),
            json!("00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(RecordKey::from(7_i64).to_json(), json!(7));
    }

    #[test]
    fn into_document_injects_id() {
        let Value::Object(doc) = json!({"name": "Forest"}) else {
            panic!("object literal");
        };
        let record = Record {
            key: RecordKey::Int(7),
            doc,
        };
        assert_eq!(
            Value::Object(record.into_document()),
            json!({"name": "Forest", "id": 7})
        );
    }
}
