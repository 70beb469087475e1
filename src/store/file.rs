//! File-based record store.
//!
//! This backend keeps its data in one directory:
//! - `meta.json`
//! - `records.jsonl`, one tagged record per line
//!
//! Records are loaded into memory when the store is opened and
//! predicates are evaluated in process, one record at a time.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::models::{Record, RecordTable, StoreBackendKind};
use crate::search::predicate::Compiled;
use crate::search::schema::Root;
use crate::store::backend::{in_scope, RecordStore};
use crate::store::eval;
use crate::store::models::{StoreMeta, STORE_SCHEMA_VERSION};

/// File-backed implementation of `RecordStore`.
pub struct FileRecordStore {
    root: PathBuf,
    meta: Option<StoreMeta>,
    records: Vec<Record>,
}

impl FileRecordStore {
    /// Open (or create) a file-based store at the given directory.
    pub fn open(store_path: &Path) -> Result<Self> {
        fs::create_dir_all(store_path)?;

        let meta_path = store_path.join("meta.json");
        let meta = if meta_path.exists() {
            let file = File::open(&meta_path)?;
            let meta: StoreMeta = serde_json::from_reader(file)
                .with_context(|| format!("invalid store metadata in {}", meta_path.display()))?;
            if meta.schema_version != STORE_SCHEMA_VERSION {
                bail!(
                    "unsupported store schema version {}; expected {}",
                    meta.schema_version,
                    STORE_SCHEMA_VERSION
                );
            }
            Some(meta)
        } else {
            None
        };

        let records = Self::load_records(store_path)?;

        Ok(Self {
            root: store_path.to_path_buf(),
            meta,
            records,
        })
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    fn records_path(&self) -> PathBuf {
        self.root.join("records.jsonl")
    }

    fn load_records(root: &Path) -> Result<Vec<Record>> {
        let path = root.join("records.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record: Record = serde_json::from_str(&line).with_context(|| {
                format!("corrupt record on line {} of {}", index + 1, path.display())
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

impl RecordStore for FileRecordStore {
    fn kind(&self) -> StoreBackendKind {
        StoreBackendKind::File
    }

    fn store_path(&self) -> &Path {
        &self.root
    }

    fn load_meta(&self) -> Result<StoreMeta> {
        Ok(self.meta.clone().unwrap_or_else(StoreMeta::fresh))
    }

    fn save_meta(&mut self, meta: &StoreMeta) -> Result<()> {
        let path = self.meta_path();
        let tmp_path = path.with_extension("json.tmp");
        let file = File::create(&tmp_path)?;
        serde_json::to_writer(file, meta)?;
        fs::rename(tmp_path, path)?;
        self.meta = Some(meta.clone());
        Ok(())
    }

    fn insert(&mut self, records: &[Record]) -> Result<usize> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.records_path())?;
        let mut writer = BufWriter::new(file);

        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        self.records.extend_from_slice(records);
        Ok(records.len())
    }

    fn count(&self, table: RecordTable) -> Result<u64> {
        Ok(self.records.iter().filter(|r| r.table() == table).count() as u64)
    }

    fn find_matching(&self, root: &Root, filter: &Compiled) -> Result<Vec<Record>> {
        let mut matches = Vec::new();

        for record in self.records.iter().filter(|r| in_scope(root, r)) {
            let keep = match filter.predicate() {
                None => true,
                Some(predicate) => eval::matches(predicate, &serde_json::to_value(record)?),
            };
            if keep {
                matches.push(record.clone());
            }
        }

        Ok(matches)
    }
}
