//! Item banks (shared or per-player storage).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::persistence::document::Document;

/// Bank type whose content is shared by every player.
pub const GLOBAL_BANK_TYPE: &str = "global";

/// A stored bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    /// Storage-assigned identifier.
    pub id: Uuid,
    /// Display name (not unique).
    pub name: String,
    /// Bank type, e.g. `"global"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Stored items; shape depends on the bank type.
    #[serde(default)]
    pub content: Value,
    /// Any other attributes set by the admin panel.
    #[serde(flatten)]
    pub extra: Document,
}

/// Payload for creating a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBank {
    /// Display name.
    pub name: String,
    /// Bank type.
    #[serde(rename = "type")]
    pub kind: String,
}

impl NewBank {
    /// Creates a payload.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Initial content for a bank of this type.
    #[must_use]
    pub fn initial_content(&self) -> Value {
        if self.kind == GLOBAL_BANK_TYPE {
            json!({"items": {}, "weapons": {}, "armors": {}, "gold": 0})
        } else {
            json!({})
        }
    }

    /// The document stored for this payload.
    #[must_use]
    pub fn into_document(self) -> Document {
        let content = self.initial_content();
        let mut doc = Document::new();
        doc.insert("name".to_string(), Value::String(self.name));
        doc.insert("type".to_string(), Value::String(self.kind));
        doc.insert("content".to_string(), content);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_bank_gets_item_shape() {
        let bank = NewBank::new("Vault", "global");
        assert_eq!(
            Value::Object(bank.into_document()),
            json!({
                "name": "Vault",
                "type": "global",
                "content": {"items": {}, "weapons": {}, "armors": {}, "gold": 0}
            })
        );
    }

    #[test]
    fn other_banks_start_empty() {
        let bank = NewBank::new("Personal", "player");
        assert_eq!(bank.initial_content(), json!({}));
    }

    #[test]
    fn type_matching_is_exact() {
        assert_eq!(NewBank::new("x", "Global").initial_content(), json!({}));
    }
}
