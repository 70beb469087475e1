//! Record store abstraction.
//!
//! The `RecordStore` trait is the "find all matching" boundary of the
//! search compiler: callers hand it a scope and a compiled predicate
//! without knowing which backend evaluates it.

use std::path::Path;

use anyhow::Result;

use crate::models::{Record, RecordTable, StoreBackendKind, StoreConfig};
use crate::search::predicate::Compiled;
use crate::search::schema::Root;
use crate::store::models::StoreMeta;

/// Pluggable record store.
pub trait RecordStore {
    /// Kind of backend implementation.
    fn kind(&self) -> StoreBackendKind;

    /// Root path for the on-disk store.
    fn store_path(&self) -> &Path;

    /// Load store metadata, or fresh metadata for a new store.
    fn load_meta(&self) -> Result<StoreMeta>;

    /// Persist store metadata.
    fn save_meta(&mut self, meta: &StoreMeta) -> Result<()>;

    /// Append records. Returns how many were written.
    fn insert(&mut self, records: &[Record]) -> Result<usize>;

    /// Number of records stored in `table`.
    fn count(&self, table: RecordTable) -> Result<u64>;

    /// Records inside `root`'s scope that satisfy `filter`, in
    /// insertion order.
    fn find_matching(&self, root: &Root, filter: &Compiled) -> Result<Vec<Record>>;
}

/// Helper to construct the configured backend.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
    match config.backend {
        StoreBackendKind::File => Ok(Box::new(crate::store::FileRecordStore::open(
            &config.store_path,
        )?)),
        StoreBackendKind::Sqlite => Ok(Box::new(crate::store::SqliteRecordStore::open(
            &config.store_path,
        )?)),
    }
}

/// Whether `record` falls inside `root`'s table and variant.
pub fn in_scope(root: &Root, record: &Record) -> bool {
    record.table() == root.record_table()
        && root
            .variant()
            .map_or(true, |variant| record.variant() == Some(variant))
}
