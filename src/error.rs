//! Store error types.
//!
//! [`StoreError`] is the central error type for the persistence layer.
//! Absence is never an error: lookups return `Option` or an empty `Vec`
//! and callers check explicitly. Nothing is retried; every failure
//! surfaces to the immediate caller.

use std::path::PathBuf;

/// Persistence-layer error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category            |
/// |-----------|---------------------|
/// | 1000–1999 | Configuration       |
/// | 2000–2999 | Datastore           |
/// | 3000–3999 | World assets        |
/// | 4000–4999 | Document encoding   |
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The datastore could not be reached or the handshake failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A query failed on an open connection.
    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),

    /// A world-authoring asset could not be read.
    #[error("cannot read asset {path}: {source}")]
    Asset {
        /// Asset file that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A world-authoring asset was read but has an unexpected shape.
    #[error("malformed asset {path}: {reason}")]
    AssetFormat {
        /// Asset file that failed.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A write would leave a stored record that no longer decodes.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A setting or configuration patch was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The server configuration record does not exist yet.
    #[error("server configuration record is missing; has the database been bootstrapped?")]
    MissingConfig,
}

impl StoreError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidConfig(_) => 1001,
            Self::MissingConfig => 1002,
            Self::Connection(_) => 2001,
            Self::Query(_) => 2002,
            Self::Asset { .. } => 3001,
            Self::AssetFormat { .. } => 3002,
            Self::Serialization(_) => 4001,
            Self::InvalidRecord(_) => 4002,
        }
    }

    /// Returns `true` when the failure means the datastore is unreachable.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub(crate) fn asset_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::AssetFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
