//! PostgreSQL implementation of the document tables.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time checked)
//! so no live database is needed at build time. Table names come from the
//! validated [`SchemaName`](super::schema::SchemaName); every value is a
//! bound parameter.

use std::time::Duration;

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Connection, PgConnection, Postgres, Row};
use uuid::Uuid;

use super::connection::Connector;
use super::document::{Document, WriteMode};
use super::models::{Record, RecordKey};
use super::schema::{KeyKind, TableRef};
use crate::error::StoreError;

/// Opens single PostgreSQL connections for the [`ConnectionManager`](super::connection::ConnectionManager).
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PgConnector {
    /// Creates a connector for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the URL cannot be parsed.
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, StoreError> {
        let options: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| StoreError::InvalidConfig(format!("invalid database URL: {e}")))?;
        Ok(Self {
            options,
            connect_timeout,
        })
    }
}

impl Connector for PgConnector {
    type Handle = PgConnection;

    async fn open(&self) -> Result<PgConnection, StoreError> {
        let connect = PgConnection::connect_with(&self.options);
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(conn)) => {
                tracing::info!(
                    host = self.options.get_host(),
                    port = self.options.get_port(),
                    "connected to PostgreSQL"
                );
                Ok(conn)
            }
            Ok(Err(e)) => Err(StoreError::Connection(e.to_string())),
            Err(_) => Err(StoreError::Connection(format!(
                "timed out after {:?}",
                self.connect_timeout
            ))),
        }
    }

    async fn close(&self, handle: PgConnection) {
        if let Err(e) = handle.close().await {
            tracing::warn!(error = %e, "error while closing PostgreSQL connection");
        }
    }
}

fn bind_key<'q>(
    query: Query<'q, Postgres, PgArguments>,
    key: RecordKey,
) -> Query<'q, Postgres, PgArguments> {
    match key {
        RecordKey::Uuid(id) => query.bind(id),
        RecordKey::Int(id) => query.bind(id),
    }
}

fn decode_row(row: &PgRow, kind: KeyKind) -> Result<Record, StoreError> {
    let key = match kind {
        KeyKind::Uuid => RecordKey::Uuid(row.try_get::<Uuid, _>("id")?),
        KeyKind::Int => RecordKey::Int(row.try_get::<i64, _>("id")?),
    };
    let doc = match row.try_get::<Value, _>("doc")? {
        Value::Object(doc) => doc,
        other => {
            return Err(StoreError::Serialization(serde::de::Error::custom(
                format!("stored document is not an object: {other}"),
            )));
        }
    };
    Ok(Record { key, doc })
}

fn decode_rows(rows: &[PgRow], table: TableRef<'_>) -> Result<Vec<Record>, StoreError> {
    let kind = table.table().key_kind();
    rows.iter().map(|row| decode_row(row, kind)).collect()
}

/// Lists every schema name visible to the connection.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn list_schemas(conn: &mut PgConnection) -> Result<Vec<String>, StoreError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT schema_name::text FROM information_schema.schemata ORDER BY schema_name",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(names)
}

/// Runs a statement that returns nothing (DDL).
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn execute(conn: &mut PgConnection, sql: &str) -> Result<(), StoreError> {
    sqlx::query(sql).execute(&mut *conn).await?;
    Ok(())
}

/// Inserts one document under `key`. Any `id` field in `doc` is ignored.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure, including a
/// duplicate key.
pub async fn insert(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    key: RecordKey,
    doc: &Document,
) -> Result<(), StoreError> {
    let mut stored = doc.clone();
    stored.remove("id");
    let sql = format!("INSERT INTO {table} (id, doc) VALUES ($1, $2)");
    bind_key(sqlx::query(&sql), key)
        .bind(Value::Object(stored))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Fetches every row in insertion order.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn fetch_all(
    conn: &mut PgConnection,
    table: TableRef<'_>,
) -> Result<Vec<Record>, StoreError> {
    let sql = format!("SELECT id, doc FROM {table} ORDER BY seq");
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    decode_rows(&rows, table)
}

/// Fetches rows whose top-level `field` equals `value` exactly.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn fetch_where(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    field: &str,
    value: &Value,
) -> Result<Vec<Record>, StoreError> {
    let sql = format!("SELECT id, doc FROM {table} WHERE doc -> $1 = $2 ORDER BY seq");
    let rows = sqlx::query(&sql)
        .bind(field)
        .bind(value)
        .fetch_all(&mut *conn)
        .await?;
    decode_rows(&rows, table)
}

/// Fetches rows whose `username` equals `username` ignoring case.
///
/// With `lock` set the rows are locked until the surrounding transaction
/// ends.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn fetch_by_username(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    username: &str,
    lock: bool,
) -> Result<Vec<Record>, StoreError> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let sql = format!(
        "SELECT id, doc FROM {table} WHERE lower(doc->>'username') = lower($1) ORDER BY seq{suffix}"
    );
    let rows = sqlx::query(&sql)
        .bind(username)
        .fetch_all(&mut *conn)
        .await?;
    decode_rows(&rows, table)
}

/// Fetches one row by key.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn fetch_one(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    key: RecordKey,
) -> Result<Option<Record>, StoreError> {
    fetch_one_inner(conn, table, key, false).await
}

async fn fetch_one_inner(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    key: RecordKey,
    lock: bool,
) -> Result<Option<Record>, StoreError> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT id, doc FROM {table} WHERE id = $1{suffix}");
    let row = bind_key(sqlx::query(&sql), key)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|row| decode_row(&row, table.table().key_kind()))
        .transpose()
}

/// Replaces the whole stored document for `key`.
///
/// Returns the number of rows written (0 when the key is unknown).
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn replace_document(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    key: RecordKey,
    doc: &Document,
) -> Result<u64, StoreError> {
    let mut stored = doc.clone();
    stored.remove("id");
    let sql = format!("UPDATE {table} SET doc = $2 WHERE id = $1");
    let result = bind_key(sqlx::query(&sql), key)
        .bind(Value::Object(stored))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Literal-replaces one top-level field of the stored document.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn replace_field(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    key: RecordKey,
    field: &str,
    value: &Value,
) -> Result<u64, StoreError> {
    let sql =
        format!("UPDATE {table} SET doc = jsonb_set(doc, ARRAY[$2::text], $3, true) WHERE id = $1");
    let result = bind_key(sqlx::query(&sql), key)
        .bind(field)
        .bind(value)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Applies `patch` to the stored document for `key` with `mode`, inside
/// its own transaction.
///
/// Returns `false` when no row has that key.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn update_document(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    key: RecordKey,
    mode: WriteMode,
    patch: Document,
) -> Result<bool, StoreError> {
    let mut tx = conn.begin().await?;
    let Some(mut record) = fetch_one_inner(&mut tx, table, key, true).await? else {
        return Ok(false);
    };
    mode.apply(&mut record.doc, patch);
    replace_document(&mut tx, table, key, &record.doc).await?;
    tx.commit().await?;
    Ok(true)
}

/// Deletes the row for `key`. Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`StoreError::Query`] on database failure.
pub async fn delete(
    conn: &mut PgConnection,
    table: TableRef<'_>,
    key: RecordKey,
) -> Result<u64, StoreError> {
    let sql = format!("DELETE FROM {table} WHERE id = $1");
    let result = bind_key(sqlx::query(&sql), key)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
