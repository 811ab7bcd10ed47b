//! Persistence layer: PostgreSQL document storage and first-run bootstrap.
//!
//! Every game table holds one JSONB document per row. Reads and writes go
//! through the single handle owned by [`connection::ConnectionManager`];
//! [`bootstrap::SchemaBootstrapper`] creates and seeds the schema from the
//! authoring-tool content files on first start.

pub mod assets;
pub mod bootstrap;
pub mod connection;
pub mod document;
pub mod models;
pub mod postgres;
pub mod schema;
