//! Persisted store metadata.

use serde::{Deserialize, Serialize};

/// On-disk layout version written by this build.
pub const STORE_SCHEMA_VERSION: &str = "1";

/// Metadata for a whole record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    /// Schema version for the store on disk.
    pub schema_version: String,
    /// Version of appsearch that wrote the store.
    pub tool_version: String,
    /// Unix timestamp (seconds since epoch) when the store was created.
    pub created_at: u64,
    /// Unix timestamp (seconds since epoch) of the last load.
    pub updated_at: u64,
}

impl StoreMeta {
    /// Metadata for a store created now.
    pub fn fresh() -> Self {
        let now = crate::store::current_epoch_seconds();
        Self {
            schema_version: STORE_SCHEMA_VERSION.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
