//! Shared data models for search configs, responses, and stores.
//!
//! These types form the JSON API surface used by the CLI and the
//! HTTP server.

pub mod records;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use records::{
    Account, Application, ApplicationCommon, ApplicationStatus, ApplicationVariant,
    AssignedCommitteeMember, DraftApplication, Record, RecordTable, ReferredApplication, Role,
    SubmittedApplication, User,
};

/// Default location of a file-backed store.
pub const DEFAULT_FILE_STORE_PATH: &str = ".appsearch/store";

/// Default location of a SQLite-backed store.
pub const DEFAULT_SQLITE_STORE_PATH: &str = ".appsearch/store.sqlite";

/// Record store backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    /// Directory holding `meta.json` and `records.jsonl`.
    #[default]
    File,
    /// Single SQLite database file.
    Sqlite,
}

impl StoreBackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackendKind::File => "file",
            StoreBackendKind::Sqlite => "sqlite",
        }
    }

    pub fn default_path(self) -> PathBuf {
        match self {
            StoreBackendKind::File => PathBuf::from(DEFAULT_FILE_STORE_PATH),
            StoreBackendKind::Sqlite => PathBuf::from(DEFAULT_SQLITE_STORE_PATH),
        }
    }
}

/// Location and kind of a record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackendKind,
    /// Directory (file backend) or database file (sqlite backend).
    pub store_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::File,
            store_path: StoreBackendKind::File.default_path(),
        }
    }
}

/// A search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Entity kind name, e.g. `users` or `submitted-applications`.
    pub entity: String,
    /// Raw query string, e.g. `status=APPROVED,user.name:~smith`.
    #[serde(default)]
    pub query: String,
    /// Combine all criteria with OR instead of AND.
    #[serde(default)]
    pub or: bool,
    /// Store to search. When absent the caller's default store is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,
}

/// Search response envelope.
///
/// `error` is set only when the query could not be compiled; it never
/// carries backend details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Record>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Import request for `appsearch load`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// JSONL file with one tagged record per line.
    pub input: PathBuf,
    pub store: StoreConfig,
}

/// Summary information about a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSummary {
    pub backend: StoreBackendKind,
    pub store_path: PathBuf,
    /// Records added by the operation that produced this summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_loaded: Option<u64>,
    /// Total records per table, keyed by table name.
    pub counts: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Version of appsearch that wrote the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    /// ISO-8601 creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// ISO-8601 last-updated timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One searchable entity kind, as listed by `appsearch entities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub name: String,
    /// Store scope, e.g. `application/submitted`.
    pub scope: String,
    pub operators: Vec<String>,
    /// Public key renames as `(public, field)` pairs.
    pub renames: Vec<(String, String)>,
    /// Keys whose values are converted before comparison.
    pub converted: Vec<String>,
    /// Overridden `key` + operator pairs.
    pub overrides: Vec<String>,
}
