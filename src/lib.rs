//! # mmo-store
//!
//! Persistence layer for an MMO game server backend.
//!
//! Stores player accounts, world maps with their events and encounter
//! tables, item banks and the server configuration singleton in a
//! PostgreSQL schema. On first start the schema is created and seeded
//! from the authoring tool's `MapInfos.json` and `MapNNN.json` files.
//!
//! ## Architecture
//!
//! ```text
//! Game server (routing, sessions)
//!     │
//!     ├── Database (database.rs)
//!     │       ├── PlayerRepository / MapRepository
//!     │       ├── BankRepository / ConfigRepository
//!     │       └── ConfigCache
//!     │
//!     ├── ConnectionManager (lazy open, idle close)
//!     ├── SchemaBootstrapper ── AssetLoader (content files)
//!     │
//!     └── PostgreSQL (one JSONB document per row)
//! ```

pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod repository;
pub mod security;

pub use database::Database;
pub use error::StoreError;
