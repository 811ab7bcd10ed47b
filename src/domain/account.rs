//! Player accounts and the payloads used to create and update them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::server_config::{ADMIN_PERMISSION, NewPlayerTemplate, Skin};
use crate::error::StoreError;
use crate::persistence::document::{Document, from_document, to_document};

/// Stored key of the account username.
pub const USERNAME_FIELD: &str = "username";

/// Stored key of the free-form character statistics.
pub const STATS_FIELD: &str = "stats";

/// Stored key of the password digest.
pub const PASSWORD_FIELD: &str = "password";

/// A player account as stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Storage-assigned identifier.
    pub id: Uuid,
    /// Login name; unique ignoring case.
    pub username: String,
    /// Digest of the password, absent when passwords are not required.
    #[serde(rename = "password", default, skip_serializing_if = "Option::is_none")]
    pub password_digest: Option<String>,
    /// Permission level; see [`Account::is_admin`].
    #[serde(default)]
    pub permission: i64,
    /// Map the character currently stands on.
    #[serde(default)]
    pub map_id: i64,
    /// Tile column.
    #[serde(default)]
    pub x: i64,
    /// Tile row.
    #[serde(default)]
    pub y: i64,
    /// Appearance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<Skin>,
    /// Opaque character statistics owned by the game client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    /// Session flags and any other client-defined attributes.
    #[serde(flatten)]
    pub extra: Document,
}

impl Account {
    /// Returns `true` for accounts allowed to use the admin panel.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.permission >= ADMIN_PERMISSION
    }

    /// Checks that a stored account document (without `id`) still decodes
    /// as an [`Account`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] naming the offending field
    /// when it does not.
    pub fn validate_document(doc: &Document) -> Result<(), StoreError> {
        let mut candidate = doc.clone();
        candidate.insert("id".to_string(), Value::String(Uuid::nil().to_string()));
        from_document::<Self>(candidate)
            .map(|_| ())
            .map_err(|e| StoreError::InvalidRecord(format!("account: {e}")))
    }
}

/// Details supplied when a player signs up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Requested login name.
    pub username: String,
    /// Plaintext password, if the player supplied one.
    #[serde(default)]
    pub password: Option<String>,
}

/// A partial account update, keyed by username.
///
/// Every supplied top-level field is written; fields not present are left
/// untouched. `stats` is always written as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    /// Account to update, matched ignoring case.
    pub username: String,
    /// Fields to write.
    #[serde(flatten)]
    pub fields: Document,
}

impl PlayerUpdate {
    /// Creates an update for `username` with no fields yet.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            fields: Document::new(),
        }
    }

    /// Adds a field to write.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Splits the update into the merge patch and the `stats` value that
    /// must replace the stored one.
    ///
    /// The storage key `id` is never part of the patch.
    #[must_use]
    pub fn into_patch(self) -> (Document, Option<Value>) {
        let mut patch = self.fields;
        patch.remove("id");
        let stats = patch.remove(STATS_FIELD);
        patch.insert(USERNAME_FIELD.to_string(), Value::String(self.username));
        (patch, stats)
    }
}

/// Builds the document for a new account from the template.
///
/// `password_digest` is omitted from the document when `None`.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the template cannot be
/// serialized.
pub fn new_account_document(
    template: &NewPlayerTemplate,
    username: &str,
    password_digest: Option<String>,
) -> Result<Document, StoreError> {
    let mut doc = to_document(template)?;
    doc.insert(
        USERNAME_FIELD.to_string(),
        Value::String(username.to_string()),
    );
    if let Some(digest) = password_digest {
        doc.insert(PASSWORD_FIELD.to_string(), Value::String(digest));
    }
    Ok(doc)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_account_overlays_template() {
        let Ok(doc) = new_account_document(&NewPlayerTemplate::default(), "Alice", None) else {
            panic!("template must serialize");
        };
        assert_eq!(doc.get("username"), Some(&json!("Alice")));
        assert_eq!(doc.get("mapId"), Some(&json!(1)));
        assert_eq!(doc.get("permission"), Some(&json!(0)));
        assert!(!doc.contains_key("password"));
    }

    #[test]
    fn new_account_keeps_supplied_digest() {
        let Ok(doc) =
            new_account_document(&NewPlayerTemplate::default(), "bob", Some("abc".into()))
        else {
            panic!("template must serialize");
        };
        assert_eq!(doc.get("password"), Some(&json!("abc")));
    }

    #[test]
    fn update_patch_separates_stats_and_drops_id() {
        let update = PlayerUpdate::new("alice")
            .with("id", json!("spoofed"))
            .with("x", json!(3))
            .with("stats", json!({"hp": 8}));
        let (patch, stats) = update.into_patch();
        assert_eq!(stats, Some(json!({"hp": 8})));
        assert_eq!(
            Value::Object(patch),
            json!({"username": "alice", "x": 3})
        );
    }

    #[test]
    fn account_decodes_session_flags_into_extra() {
        let stored = json!({
            "id": "9b2f1c1e-8a43-4a55-9d36-1d7e3e7f0a11",
            "username": "admin",
            "password": "digest",
            "permission": 100,
            "mapId": 1, "x": 5, "y": 5,
            "isBusy": false
        });
        let Ok(account) = serde_json::from_value::<Account>(stored) else {
            panic!("stored account must deserialize");
        };
        assert!(account.is_admin());
        assert_eq!(account.password_digest.as_deref(), Some("digest"));
        assert_eq!(account.extra.get("isBusy"), Some(&json!(false)));
    }

    fn template_account() -> Document {
        match new_account_document(&NewPlayerTemplate::default(), "alice", None) {
            Ok(doc) => doc,
            Err(e) => panic!("template must serialize: {e}"),
        }
    }

    #[test]
    fn template_account_is_valid() {
        assert!(Account::validate_document(&template_account()).is_ok());
    }

    #[test]
    fn validation_rejects_mistyped_fields() {
        for (field, value) in [
            ("mapId", json!(null)),
            ("x", json!(3.5)),
            ("permission", json!("100")),
            ("skin", json!({"characterName": 4})),
            ("username", json!(7)),
        ] {
            let mut doc = template_account();
            doc.insert(field.to_string(), value.clone());
            let result = Account::validate_document(&doc);
            assert!(
                matches!(result, Err(StoreError::InvalidRecord(_))),
                "{field} = {value} should be rejected"
            );
        }
    }

    #[test]
    fn validation_accepts_client_defined_fields() {
        let mut doc = template_account();
        doc.insert("isBusy".to_string(), json!(true));
        doc.insert("stats".to_string(), json!({"hp": 8, "buffs": [1, 2]}));
        assert!(Account::validate_document(&doc).is_ok());
    }

    #[test]
    fn registration_password_is_optional() {
        let Ok(reg) = serde_json::from_value::<Registration>(json!({"username": "carol"})) else {
            panic!("registration must deserialize");
        };
        assert_eq!(reg.password, None);
    }
}
