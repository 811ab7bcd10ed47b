//! Repository layer: the operations routing and session code call.
//!
//! Each repository borrows the [`Database`](crate::database::Database)
//! context, asks its connection manager for the shared handle at the
//! start of every operation, and returns owned domain values.

pub mod banks;
pub mod config;
pub mod config_cache;
pub mod maps;
pub mod players;

pub use banks::BankRepository;
pub use config::ConfigRepository;
pub use config_cache::ConfigCache;
pub use maps::MapRepository;
pub use players::PlayerRepository;
