//! Schema namespace and the fixed table set.
//!
//! Each table has the shape `(id, seq, doc)`: a primary key, an insertion
//! sequence that defines result order, and the JSONB document.

use std::fmt;

use crate::error::StoreError;

/// Maximum identifier length PostgreSQL keeps without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Validated name of the schema that holds the game tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validates `name` as a lower-case SQL identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] unless the name matches
    /// `[a-z_][a-z0-9_]*` and fits in 63 bytes.
    pub fn new(name: &str) -> Result<Self, StoreError> {
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_head || !valid_tail || name.len() > MAX_IDENTIFIER_LEN {
            return Err(StoreError::InvalidConfig(format!(
                "schema name {name:?} must match [a-z_][a-z0-9_]* (max {MAX_IDENTIFIER_LEN} bytes)"
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// The raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A table inside this schema.
    #[must_use]
    pub const fn table(&self, table: Table) -> TableRef<'_> {
        TableRef {
            schema: self,
            table,
        }
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Type of a table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Random UUID assigned on insert.
    Uuid,
    /// Caller-assigned integer.
    Int,
}

/// The fixed table set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// Player accounts.
    Users,
    /// Map headers.
    Maps,
    /// Map events.
    Events,
    /// Random encounter entries.
    Encounters,
    /// Item banks.
    Banks,
    /// The server configuration singleton.
    Config,
}

impl Table {
    /// Every table, in creation order.
    pub const ALL: [Self; 6] = [
        Self::Users,
        Self::Maps,
        Self::Events,
        Self::Encounters,
        Self::Banks,
        Self::Config,
    ];

    /// Unqualified table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Maps => "maps",
            Self::Events => "events",
            Self::Encounters => "encounters",
            Self::Banks => "banks",
            Self::Config => "config",
        }
    }

    /// Primary key type.
    #[must_use]
    pub const fn key_kind(self) -> KeyKind {
        match self {
            Self::Maps | Self::Config => KeyKind::Int,
            Self::Users | Self::Events | Self::Encounters | Self::Banks => KeyKind::Uuid,
        }
    }
}

/// A schema-qualified table.
#[derive(Debug, Clone, Copy)]
pub struct TableRef<'a> {
    schema: &'a SchemaName,
    table: Table,
}

impl TableRef<'_> {
    /// The table being referenced.
    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }

    /// `CREATE TABLE` statement for this table.
    #[must_use]
    pub fn create_sql(&self) -> String {
        let key_type = match self.table.key_kind() {
            KeyKind::Uuid => "UUID",
            KeyKind::Int => "BIGINT",
        };
        format!(
            "CREATE TABLE {self} (id {key_type} PRIMARY KEY, seq BIGSERIAL NOT NULL, doc JSONB NOT NULL)"
        )
    }

    /// Secondary index backing the table's lookup query, if it has one.
    #[must_use]
    pub fn index_sql(&self) -> Option<String> {
        let name = self.table.name();
        match self.table {
            Table::Users => Some(format!(
                "CREATE INDEX {name}_username_ci ON {self} ((lower(doc->>'username')))"
            )),
            Table::Events | Table::Encounters => Some(format!(
                "CREATE INDEX {name}_map_id ON {self} ((doc->'mapId'))"
            )),
            Table::Banks => Some(format!(
                "CREATE INDEX {name}_name ON {self} ((doc->'name'))"
            )),
            Table::Maps | Table::Config => None,
        }
    }
}

impl fmt::Display for TableRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.\"{}\"", self.schema, self.table.name())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(SchemaName::new("mmorpg").is_ok());
        assert!(SchemaName::new("_test_01").is_ok());
    }

    #[test]
    fn rejects_injection_and_odd_names() {
        let too_long = "x".repeat(64);
        for bad in ["", "MMORPG", "1world", "a;drop", "a\"b", too_long.as_str()] {
            assert!(SchemaName::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn qualified_names_are_quoted() {
        let Ok(schema) = SchemaName::new("mmorpg") else {
            panic!("valid schema name");
        };
        assert_eq!(
            schema.table(Table::Users).to_string(),
            "\"mmorpg\".\"users\""
        );
    }

    #[test]
    fn map_and_config_use_integer_keys() {
        let Ok(schema) = SchemaName::new("mmorpg") else {
            panic!("valid schema name");
        };
        assert!(schema.table(Table::Maps).create_sql().contains("id BIGINT"));
        assert!(schema.table(Table::Banks).create_sql().contains("id UUID"));
        assert!(schema.table(Table::Config).index_sql().is_none());
    }

    #[test]
    fn six_tables() {
        assert_eq!(Table::ALL.len(), 6);
    }
}
