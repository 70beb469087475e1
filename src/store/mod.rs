//! Record stores.
//!
//! A store is the "find all matching" collaborator of the search
//! compiler. Two backends share the `RecordStore` trait:
//!
//! - a file backend keeping `meta.json` + `records.jsonl` in a
//!   directory and evaluating predicates in process;
//! - a SQLite backend translating predicates to SQL over JSON bodies.
//!
//! Both return the same rows for the same predicate.

mod backend;
pub mod eval;
mod file;
pub mod models;
mod sqlite;

pub use backend::{in_scope, open_store, RecordStore};
pub use file::FileRecordStore;
pub use models::{StoreMeta, STORE_SCHEMA_VERSION};
pub use sqlite::SqliteRecordStore;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::models::{LoadConfig, Record, RecordTable, StoreBackendKind, StoreConfig, StoreSummary};

/// Open a store that must already exist on disk.
///
/// Unlike [`open_store`], this never creates an empty store as a side
/// effect of a read.
pub fn open_existing_store(config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
    if !config.store_path.exists() {
        bail!("store not found at {}", config.store_path.display());
    }
    match config.backend {
        StoreBackendKind::File if !config.store_path.is_dir() => bail!(
            "file backend requires store_path to be a directory; got {}",
            config.store_path.display()
        ),
        StoreBackendKind::Sqlite if !config.store_path.is_file() => bail!(
            "sqlite backend requires store_path to be a file; got {}",
            config.store_path.display()
        ),
        _ => {}
    }
    open_store(config)
}

/// Import every record from a JSONL file into the configured store.
pub fn load_records(config: &LoadConfig) -> Result<StoreSummary> {
    let records = read_records(config)?;

    let mut store = open_store(&config.store)?;
    let mut meta = store.load_meta()?;
    let loaded = store.insert(&records)?;
    meta.updated_at = current_epoch_seconds();
    store.save_meta(&meta)?;

    info!(
        backend = store.kind().as_str(),
        path = %store.store_path().display(),
        loaded,
        "loaded records"
    );

    summarize(store.as_ref(), &meta, Some(loaded as u64))
}

/// Read-only summary of an existing store.
pub fn get_store_info(config: &StoreConfig) -> Result<StoreSummary> {
    let store = open_existing_store(config)?;
    let meta = store.load_meta()?;
    summarize(store.as_ref(), &meta, None)
}

fn read_records(config: &LoadConfig) -> Result<Vec<Record>> {
    let file = File::open(&config.input)
        .with_context(|| format!("cannot open {}", config.input.display()))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line).with_context(|| {
            format!(
                "invalid record on line {} of {}",
                index + 1,
                config.input.display()
            )
        })?;
        records.push(record);
    }

    Ok(records)
}

fn summarize(
    store: &dyn RecordStore,
    meta: &StoreMeta,
    records_loaded: Option<u64>,
) -> Result<StoreSummary> {
    let mut counts = BTreeMap::new();
    for table in RecordTable::ALL {
        counts.insert(table.as_str().to_string(), store.count(table)?);
    }

    Ok(StoreSummary {
        backend: store.kind(),
        store_path: store.store_path().to_path_buf(),
        records_loaded,
        counts,
        schema_version: Some(meta.schema_version.clone()),
        tool_version: Some(meta.tool_version.clone()),
        created_at: format_timestamp_iso8601(meta.created_at),
        updated_at: format_timestamp_iso8601(meta.updated_at),
    })
}

pub(crate) fn current_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn format_timestamp_iso8601(secs: u64) -> Option<String> {
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    let dt = OffsetDateTime::from_unix_timestamp(secs as i64).ok()?;
    Some(dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string()))
}
