//! The singleton server configuration record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persistence::document::Document;

/// Permission level granted to freshly registered accounts.
pub const DEFAULT_PERMISSION: i64 = 0;

/// Permission level at or above which an account is an administrator.
pub const ADMIN_PERMISSION: i64 = 100;

/// Sprite and portrait selection for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    /// Index inside the character sheet.
    pub character_index: i64,
    /// Character sheet file name.
    pub character_name: String,
    /// Battler sprite file name.
    pub battler_name: String,
    /// Face sheet file name.
    pub face_name: String,
    /// Index inside the face sheet.
    pub face_index: i64,
    /// Any additional client-defined skin attributes.
    #[serde(flatten)]
    pub extra: Document,
}

impl Default for Skin {
    fn default() -> Self {
        Self {
            character_index: 0,
            character_name: "Actor1".to_string(),
            battler_name: "Actor1_1".to_string(),
            face_name: "Actor1".to_string(),
            face_index: 0,
            extra: Document::new(),
        }
    }
}

/// Default attributes applied to every newly created account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayerTemplate {
    /// Starting permission level.
    pub permission: i64,
    /// Starting map.
    pub map_id: i64,
    /// Starting appearance.
    pub skin: Skin,
    /// Starting tile column.
    pub x: i64,
    /// Starting tile row.
    pub y: i64,
    /// Any additional attributes the admin added to the template.
    #[serde(flatten)]
    pub extra: Document,
}

impl Default for NewPlayerTemplate {
    fn default() -> Self {
        Self {
            permission: DEFAULT_PERMISSION,
            map_id: 1,
            skin: Skin::default(),
            x: 5,
            y: 5,
            extra: Document::new(),
        }
    }
}

/// Live server configuration. Exactly one is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port the game server listens on.
    pub port: u16,
    /// Whether logins must present a password.
    pub password_required: bool,
    /// Template applied to new accounts.
    pub new_player_details: NewPlayerTemplate,
    /// Switches shared by every player.
    #[serde(default)]
    pub global_switches: Document,
    /// Switches shared by party members.
    #[serde(default)]
    pub party_switches: Document,
    /// Variables shared by every player.
    #[serde(default)]
    pub global_variables: Document,
    /// Maps flagged as offline (no multiplayer sync).
    #[serde(default)]
    pub offline_maps: Document,
    /// Fields added by the admin panel that this crate does not interpret.
    #[serde(flatten)]
    pub extra: Document,
}

impl ServerConfig {
    /// Builds the record written on first bootstrap.
    #[must_use]
    pub fn seed(port: u16, password_required: bool) -> Self {
        Self {
            port,
            password_required,
            new_player_details: NewPlayerTemplate::default(),
            global_switches: Document::new(),
            party_switches: Document::new(),
            global_variables: Document::new(),
            offline_maps: Document::new(),
            extra: Document::new(),
        }
    }

    /// Returns a global switch value, if set.
    #[must_use]
    pub fn global_switch(&self, name: &str) -> Option<&Value> {
        self.global_switches.get(name)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn seed_serializes_with_camel_case_keys() {
        let Ok(value) = serde_json::to_value(ServerConfig::seed(8097, false)) else {
            panic!("seed config must serialize");
        };
        assert_eq!(
            value,
            json!({
                "port": 8097,
                "passwordRequired": false,
                "newPlayerDetails": {
                    "permission": 0,
                    "mapId": 1,
                    "skin": {
                        "characterIndex": 0,
                        "characterName": "Actor1",
                        "battlerName": "Actor1_1",
                        "faceName": "Actor1",
                        "faceIndex": 0
                    },
                    "x": 5,
                    "y": 5
                },
                "globalSwitches": {},
                "partySwitches": {},
                "globalVariables": {},
                "offlineMaps": {}
            })
        );
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let stored = json!({
            "port": 8097,
            "passwordRequired": true,
            "newPlayerDetails": {
                "permission": 0, "mapId": 2, "x": 1, "y": 1, "gold": 50,
                "skin": {"characterIndex": 1, "characterName": "A", "battlerName": "B",
                         "faceName": "C", "faceIndex": 2}
            },
            "globalSwitches": {"sw1": true},
            "motd": "welcome"
        });
        let Ok(config) = serde_json::from_value::<ServerConfig>(stored) else {
            panic!("stored config must deserialize");
        };
        assert_eq!(config.global_switch("sw1"), Some(&json!(true)));
        assert_eq!(config.new_player_details.extra.get("gold"), Some(&json!(50)));
        assert_eq!(config.extra.get("motd"), Some(&json!("welcome")));
        assert!(config.offline_maps.is_empty());
    }
}
