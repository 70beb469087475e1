//! SQLite-based record store.
//!
//! Records live in a single table with their tagged JSON body:
//!
//! - `meta(key TEXT PRIMARY KEY, value TEXT NOT NULL)`
//! - `records(id INTEGER PRIMARY KEY, entity TEXT, variant TEXT, body TEXT)`
//!
//! Compiled predicates are translated to SQL over `json_extract` on
//! the body. Membership across a related collection becomes a
//! correlated `EXISTS (SELECT 1 FROM json_each(records.body, ..))`.
//! Every value is a bound parameter.
//!
//! The connection is configured with:
//!
//! - `journal_mode = WAL` for concurrent readers and a single writer.
//! - `synchronous = NORMAL`.
//! - `busy_timeout` to avoid transient `database is locked` errors.
//! - `case_sensitive_like = ON` so `LIKE` matches the file backend.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OpenFlags};

use crate::models::{Record, RecordTable, StoreBackendKind};
use crate::search::predicate::{Compiled, Predicate};
use crate::search::schema::{Field, Root};
use crate::search::value::{format_timestamp, Value};
use crate::store::backend::RecordStore;
use crate::store::models::{StoreMeta, STORE_SCHEMA_VERSION};

/// Unicode-aware lower-casing; SQLite's own `LOWER` only folds ASCII.
const LOWER_FN: &str = "appsearch_lower";

/// SQLite-backed implementation of `RecordStore`.
pub struct SqliteRecordStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteRecordStore {
    /// Open (or create) a SQLite store at the given path.
    pub fn open(store_path: &Path) -> Result<Self> {
        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(store_path, flags)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "case_sensitive_like", true)?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;

        conn.create_scalar_function(
            LOWER_FN,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                Ok(text.map(|t| t.to_lowercase()))
            },
        )?;

        Self::initialize_schema(&conn)?;

        Ok(Self {
            path: store_path.to_path_buf(),
            conn,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS records (
                id      INTEGER PRIMARY KEY,
                entity  TEXT NOT NULL,
                variant TEXT,
                body    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_entity_variant
                ON records(entity, variant);
        "#,
        )?;

        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn kind(&self) -> StoreBackendKind {
        StoreBackendKind::Sqlite
    }

    fn store_path(&self) -> &Path {
        &self.path
    }

    fn load_meta(&self) -> Result<StoreMeta> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM meta")?;
        let rows = stmt.query_map([], |row| {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            Ok((key, value))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }

        if map.is_empty() {
            return Ok(StoreMeta::fresh());
        }

        let schema_version = map
            .get("schema_version")
            .cloned()
            .unwrap_or_else(|| STORE_SCHEMA_VERSION.to_string());
        if schema_version != STORE_SCHEMA_VERSION {
            bail!(
                "unsupported store schema version {}; expected {}",
                schema_version,
                STORE_SCHEMA_VERSION
            );
        }

        let tool_version = map
            .get("tool_version")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let created_at = map
            .get("created_at")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let updated_at = map
            .get("updated_at")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(created_at);

        Ok(StoreMeta {
            schema_version,
            tool_version,
            created_at,
            updated_at,
        })
    }

    fn save_meta(&mut self, meta: &StoreMeta) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM meta", [])?;

        {
            let mut stmt = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
            let rows = [
                ("schema_version", meta.schema_version.clone()),
                ("tool_version", meta.tool_version.clone()),
                ("created_at", meta.created_at.to_string()),
                ("updated_at", meta.updated_at.to_string()),
            ];
            for (key, value) in rows {
                stmt.execute(params![key, value])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn insert(&mut self, records: &[Record]) -> Result<usize> {
        let tx = self.conn.transaction()?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO records (entity, variant, body) VALUES (?1, ?2, ?3)")?;
            for record in records {
                let body = serde_json::to_string(record)?;
                stmt.execute(params![
                    record.table().as_str(),
                    record.variant().map(|v| v.as_str()),
                    body
                ])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn count(&self, table: RecordTable) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE entity = ?1",
            params![table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_matching(&self, root: &Root, filter: &Compiled) -> Result<Vec<Record>> {
        let mut sql = String::from("SELECT id, body FROM records WHERE entity = ?");
        let mut bound = vec![SqlValue::Text(root.record_table().as_str().to_string())];

        if let Some(variant) = root.variant() {
            sql.push_str(" AND variant = ?");
            bound.push(SqlValue::Text(variant.as_str().to_string()));
        }

        if let Some(predicate) = filter.predicate() {
            let clause = translate(predicate, &mut bound);
            sql.push_str(" AND ");
            sql.push_str(&clause);
        }

        sql.push_str(" ORDER BY id ASC");
        tracing::debug!(sql = %sql, params = bound.len(), "sqlite find_matching");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bound.iter()), |row| {
            let id: i64 = row.get(0)?;
            let body: String = row.get(1)?;
            Ok((id, body))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let record: Record = serde_json::from_str(&body)
                .with_context(|| format!("corrupt record body for row {id}"))?;
            records.push(record);
        }

        Ok(records)
    }
}

/// Translate `predicate` into a SQL boolean expression over
/// `records.body`, appending its parameters to `bound` in order.
fn translate(predicate: &Predicate, bound: &mut Vec<SqlValue>) -> String {
    match predicate {
        Predicate::Equals { field, value } => {
            bound.push(json_path(field));
            bound.push(sql_value(value));
            "json_extract(records.body, ?) = ?".to_string()
        }
        Predicate::Like {
            field,
            pattern,
            case_insensitive,
        } => {
            bound.push(json_path(field));
            bound.push(SqlValue::Text(pattern.clone()));
            if *case_insensitive {
                format!("{LOWER_FN}(json_extract(records.body, ?)) LIKE ?")
            } else {
                "json_extract(records.body, ?) LIKE ?".to_string()
            }
        }
        Predicate::AtLeast { field, value } => compare(field, value, ">=", bound),
        Predicate::AtMost { field, value } => compare(field, value, "<=", bound),
        Predicate::Includes { field, value } => {
            bound.push(json_path(field));
            bound.push(sql_value(value));
            "EXISTS (SELECT 1 FROM json_each(records.body, ?) AS item WHERE item.value = ?)"
                .to_string()
        }
        Predicate::AnyRelated {
            collection,
            attribute,
            value,
        } => {
            bound.push(json_path(collection));
            bound.push(json_path(attribute));
            bound.push(sql_value(value));
            "EXISTS (SELECT 1 FROM json_each(records.body, ?) AS related \
             WHERE json_extract(related.value, ?) = ?)"
                .to_string()
        }
        Predicate::And(left, right) => {
            let left = translate(left, bound);
            let right = translate(right, bound);
            format!("({left} AND {right})")
        }
        Predicate::Or(left, right) => {
            let left = translate(left, bound);
            let right = translate(right, bound);
            format!("({left} OR {right})")
        }
    }
}

fn compare(field: &Field, value: &Value, op: &str, bound: &mut Vec<SqlValue>) -> String {
    match value {
        Value::Timestamp(_) | Value::Integer(_) => {
            bound.push(json_path(field));
            bound.push(sql_value(value));
            format!("json_extract(records.body, ?) {op} ?")
        }
        _ => {
            bound.push(json_path(field));
            bound.push(json_path(field));
            bound.push(SqlValue::Text(value.to_string()));
            format!(
                "(json_type(records.body, ?) NOT IN ('object', 'array') \
                 AND CAST(json_extract(records.body, ?) AS TEXT) {op} ?)"
            )
        }
    }
}

fn json_path(field: &Field) -> SqlValue {
    SqlValue::Text(format!("$.{}", field.dotted()))
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Text(text) => SqlValue::Text(text.clone()),
        Value::Enum(name) => SqlValue::Text((*name).to_string()),
        Value::Integer(n) => SqlValue::Integer(*n),
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        Value::Timestamp(ts) => SqlValue::Text(format_timestamp(*ts)),
    }
}
