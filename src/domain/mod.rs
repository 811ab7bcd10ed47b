//! Domain layer: the records the game backend persists.
//!
//! Accounts, world maps with their events and encounter tables, item
//! banks, and the singleton server configuration. Every type keeps the
//! camel-cased field names the game client and the authoring tool use,
//! and carries unknown attributes through untouched.

pub mod account;
pub mod bank;
pub mod map;
pub mod server_config;

pub use account::{Account, PlayerUpdate, Registration};
pub use bank::{Bank, NewBank};
pub use map::{MapIndexEntry, MapInfo, MapRecord, MapSeed, MapView};
pub use server_config::{NewPlayerTemplate, ServerConfig, Skin};
