use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::{LoadConfig, SearchConfig, StoreBackendKind, StoreConfig};
use crate::search::EntityKind;

/// Top-level CLI entrypoint for `appsearch`.
#[derive(Parser, Debug)]
#[command(
    name = "appsearch",
    about = "Search accounts, users, and applications with compact query strings",
    author = "appsearch developers",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    /// Log filter used when `RUST_LOG` is unset (e.g. `debug`,
    /// `appsearch=trace`).
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search records of one entity kind.
    Search(SearchArgs),
    /// Import JSONL records into a store.
    Load(LoadArgs),
    /// Inspect an existing store without modifying it.
    StoreInfo(StoreInfoArgs),
    /// List searchable entity kinds and their operators.
    Entities(EntitiesArgs),
    /// Run a long-lived HTTP+JSON daemon.
    Serve(ServeArgs),
}

/// Arguments specific to the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Entity kind, e.g. `users` or `submitted-applications`.
    ///
    /// May be omitted when `[search] entity` is set in the project
    /// config; a single positional argument that is not an entity name
    /// is then the query.
    pub entity: Option<String>,

    /// Query string, e.g. `status=APPROVED,user.name:~smith`.
    ///
    /// An empty or missing query matches every record in scope.
    pub query: Option<String>,

    /// Combine criteria with OR instead of AND.
    #[arg(long = "or")]
    pub or: bool,

    /// Output format (text, table, or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Store backend. Inferred from `--store-path` when omitted.
    #[arg(long = "store-backend", value_enum)]
    pub store_backend: Option<StoreBackendArg>,

    /// Directory (file backend) or database file (sqlite backend).
    #[arg(long = "store-path")]
    pub store_path: Option<PathBuf>,

    /// Optional server URL for delegating search to a daemon.
    ///
    /// When set (either via this flag or the `APPSEARCH_SERVER_URL`
    /// environment variable), the CLI sends the search configuration
    /// to the HTTP server instead of running a local search. Use
    /// `--no-server` to override this and force local execution.
    #[arg(long = "server", env = "APPSEARCH_SERVER_URL")]
    pub server: Option<String>,

    /// Disable use of any configured server and force local search.
    #[arg(long = "no-server")]
    pub no_server: bool,
}

/// Arguments for the `load` subcommand.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// JSONL file with one tagged record per line.
    pub input: PathBuf,

    #[arg(long = "store-backend", value_enum)]
    pub store_backend: Option<StoreBackendArg>,

    #[arg(long = "store-path")]
    pub store_path: Option<PathBuf>,
}

/// Arguments for the `store-info` subcommand.
#[derive(Args, Debug)]
pub struct StoreInfoArgs {
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long = "store-backend", value_enum)]
    pub store_backend: Option<StoreBackendArg>,

    #[arg(long = "store-path")]
    pub store_path: Option<PathBuf>,

    /// Optional server URL for delegating to a daemon.
    #[arg(long = "server", env = "APPSEARCH_SERVER_URL")]
    pub server: Option<String>,

    /// Force local execution.
    #[arg(long = "no-server")]
    pub no_server: bool,
}

/// Arguments for the `entities` subcommand.
#[derive(Args, Debug)]
pub struct EntitiesArgs {
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (e.g. "127.0.0.1:7878").
    #[arg(long = "addr", default_value = DEFAULT_SERVE_ADDR)]
    pub addr: String,

    /// Store used for requests that do not name one.
    #[arg(long = "store-backend", value_enum)]
    pub store_backend: Option<StoreBackendArg>,

    #[arg(long = "store-path")]
    pub store_path: Option<PathBuf>,
}

pub const DEFAULT_SERVE_ADDR: &str = "127.0.0.1:7878";

/// CLI representation of output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Table,
    Json,
}

/// CLI representation of store backend kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendArg {
    File,
    Sqlite,
}

impl StoreBackendArg {
    pub fn to_model(self) -> StoreBackendKind {
        match self {
            StoreBackendArg::File => StoreBackendKind::File,
            StoreBackendArg::Sqlite => StoreBackendKind::Sqlite,
        }
    }
}

/// Resolve a store from optional backend and path flags.
///
/// An explicit backend wins. Otherwise a path with a `.sqlite`
/// extension selects SQLite and anything else the file backend.
pub fn store_config_from(backend: Option<StoreBackendArg>, path: Option<&Path>) -> StoreConfig {
    let backend = match (backend, path) {
        (Some(kind), _) => kind.to_model(),
        (None, Some(path)) => {
            if path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("sqlite"))
                .unwrap_or(false)
            {
                StoreBackendKind::Sqlite
            } else {
                StoreBackendKind::File
            }
        }
        (None, None) => StoreBackendKind::File,
    };

    let store_path = match path {
        Some(path) => path.to_path_buf(),
        None => backend.default_path(),
    };

    StoreConfig {
        backend,
        store_path,
    }
}

/// Build a core `SearchConfig` from CLI `SearchArgs`.
pub fn search_config_from_args(args: &SearchArgs) -> Result<SearchConfig> {
    let Some(entity) = &args.entity else {
        let names: Vec<&str> = EntityKind::ALL.iter().map(|kind| kind.name()).collect();
        bail!("missing entity; expected one of: {}", names.join(", "));
    };

    Ok(SearchConfig {
        entity: entity.clone(),
        query: args.query.clone().unwrap_or_default(),
        or: args.or,
        store: Some(store_config_from(
            args.store_backend,
            args.store_path.as_deref(),
        )),
    })
}

/// Build a core `LoadConfig` from CLI `LoadArgs`.
pub fn load_config_from_args(args: &LoadArgs) -> LoadConfig {
    LoadConfig {
        input: args.input.clone(),
        store: store_config_from(args.store_backend, args.store_path.as_deref()),
    }
}

pub fn store_info_config_from_args(args: &StoreInfoArgs) -> StoreConfig {
    store_config_from(args.store_backend, args.store_path.as_deref())
}

pub fn serve_store_config_from_args(args: &ServeArgs) -> StoreConfig {
    store_config_from(args.store_backend, args.store_path.as_deref())
}
