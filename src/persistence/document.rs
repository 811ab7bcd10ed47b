//! Schema-less documents and the two write modes applied to them.
//!
//! Stored records are JSON objects. Updates either **merge** (nested
//! objects are merged key by key, every other value replaces) or
//! **replace** (the target field or record is substituted wholesale).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

/// A schema-less stored record.
pub type Document = serde_json::Map<String, Value>;

/// How a patch is written onto an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Recursively merge nested objects; other values replace.
    Merge,
    /// Substitute the whole target value.
    Replace,
}

impl WriteMode {
    /// Writes `patch` onto the whole document.
    pub fn apply(self, doc: &mut Document, patch: Document) {
        match self {
            Self::Merge => {
                for (key, value) in patch {
                    self.apply_field(doc, &key, value);
                }
            }
            Self::Replace => *doc = patch,
        }
    }

    /// Writes `value` onto a single top-level field.
    pub fn apply_field(self, doc: &mut Document, field: &str, value: Value) {
        match (self, doc.get_mut(field)) {
            (Self::Merge, Some(existing)) => merge_value(existing, value),
            _ => {
                doc.insert(field.to_string(), value);
            }
        }
    }
}

/// Deep-merges `patch` into `target`.
///
/// Objects merge key by key; arrays, scalars and `null` replace.
pub fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Serializes `value`, requiring it to be a JSON object.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if `value` fails to serialize or
/// is not an object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(
            format!("expected a JSON object, got {other}"),
        ))),
    }
}

/// Deserializes a stored document into `T`.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] when the document does not match `T`.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    #[test]
    fn merge_keeps_untouched_nested_keys() {
        let mut stored = doc(json!({"skin": {"faceName": "Actor1", "faceIndex": 0}, "x": 5}));
        WriteMode::Merge.apply(&mut stored, doc(json!({"skin": {"faceIndex": 3}, "x": 9})));
        assert_eq!(
            Value::Object(stored),
            json!({"skin": {"faceName": "Actor1", "faceIndex": 3}, "x": 9})
        );
    }

    #[test]
    fn merge_replaces_arrays_and_scalars() {
        let mut target = json!({"list": [1, 2, 3], "n": 1});
        merge_value(&mut target, json!({"list": [4], "n": null}));
        assert_eq!(target, json!({"list": [4], "n": null}));
    }

    #[test]
    fn replace_field_discards_previous_nested_keys() {
        let mut stored = doc(json!({"stats": {"hp": 10, "mp": 5}}));
        WriteMode::Replace.apply_field(&mut stored, "stats", json!({"hp": 8}));
        assert_eq!(Value::Object(stored), json!({"stats": {"hp": 8}}));
    }

    #[test]
    fn merge_field_deep_merges_same_value() {
        let mut stored = doc(json!({"stats": {"hp": 10, "mp": 5}}));
        WriteMode::Merge.apply_field(&mut stored, "stats", json!({"hp": 8}));
        assert_eq!(Value::Object(stored), json!({"stats": {"hp": 8, "mp": 5}}));
    }

    #[test]
    fn replace_whole_document() {
        let mut stored = doc(json!({"name": "Vault", "content": {"gold": 3}}));
        WriteMode::Replace.apply(&mut stored, doc(json!({"name": "Vault"})));
        assert_eq!(Value::Object(stored), json!({"name": "Vault"}));
    }

    #[test]
    fn to_document_rejects_non_objects() {
        assert!(to_document(&vec![1, 2]).is_err());
        assert!(to_document(&json!({"a": 1})).is_ok());
    }
}
