use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::{OutputFormat, StoreBackendArg, DEFAULT_SERVE_ADDR};
use crate::cli::{LoadArgs, SearchArgs, ServeArgs, StoreInfoArgs};
use crate::search::entities::EntityKind;

/// Top-level representation of `.appsearch/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub search: Option<SearchSection>,

    #[serde(default)]
    pub load: Option<StoreSection>,

    #[serde(default, rename = "store_info")]
    pub store_info: Option<StoreInfoSection>,

    #[serde(default)]
    pub serve: Option<ServeSection>,

    #[serde(default)]
    pub http: Option<HttpSection>,

    #[serde(default)]
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub or: Option<bool>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub store_backend: Option<StoreBackendArg>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub no_server: Option<bool>,
}

/// Store location shared by `[load]`.
#[derive(Debug, Default, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub store_backend: Option<StoreBackendArg>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreInfoSection {
    #[serde(default)]
    pub store_backend: Option<StoreBackendArg>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub no_server: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeSection {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub store_backend: Option<StoreBackendArg>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpSection {
    #[serde(default)]
    pub server_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

impl CliConfig {
    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    fn http_server_url(&self) -> Option<&String> {
        self.http.as_ref().and_then(|h| h.server_url.as_ref())
    }
}

/// Discover and load a project-local `.appsearch/config.toml` (or
/// `.appsearch/appsearch.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let Some(path) = find_project_config(&cwd) else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let appsearch_dir = current.join(".appsearch");
        let config_toml = appsearch_dir.join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        let appsearch_toml = appsearch_dir.join("appsearch.toml");
        if appsearch_toml.is_file() {
            return Some(appsearch_toml);
        }

        dir = current.parent();
    }

    None
}

pub fn apply_search_config_defaults(config: &CliConfig, args: &mut SearchArgs) {
    let Some(search) = &config.search else {
        if args.server.is_none() {
            args.server = config.http_server_url().cloned();
        }
        return;
    };

    if let Some(entity) = &search.entity {
        // With a configured entity, a lone positional is the query unless
        // it names an entity itself.
        let names_entity = args
            .entity
            .as_deref()
            .is_some_and(|raw| raw.parse::<EntityKind>().is_ok());
        if args.query.is_none() && !names_entity {
            args.query = args.entity.take();
            args.entity = Some(entity.clone());
        }
    }

    if !args.or {
        if let Some(true) = search.or {
            args.or = true;
        }
    }

    if matches!(args.format, OutputFormat::Text) {
        if let Some(format) = search.format {
            args.format = format;
        }
    }

    if args.store_backend.is_none() {
        args.store_backend = search.store_backend;
    }

    if args.store_path.is_none() {
        if let Some(store_path) = &search.store_path {
            args.store_path = Some(store_path.clone());
        }
    }

    if args.server.is_none() {
        if let Some(server) = &search.server {
            args.server = Some(server.clone());
        } else if let Some(url) = config.http_server_url() {
            args.server = Some(url.clone());
        }
    }

    if !args.no_server {
        if let Some(true) = search.no_server {
            args.no_server = true;
        }
    }
}

pub fn apply_load_config_defaults(config: &CliConfig, args: &mut LoadArgs) {
    if let Some(load) = &config.load {
        if args.store_backend.is_none() {
            args.store_backend = load.store_backend;
        }

        if args.store_path.is_none() {
            if let Some(store_path) = &load.store_path {
                args.store_path = Some(store_path.clone());
            }
        }
    }
}

pub fn apply_store_info_config_defaults(config: &CliConfig, args: &mut StoreInfoArgs) {
    let Some(info) = &config.store_info else {
        if args.server.is_none() {
            args.server = config.http_server_url().cloned();
        }
        return;
    };

    if args.store_backend.is_none() {
        args.store_backend = info.store_backend;
    }

    if args.store_path.is_none() {
        if let Some(store_path) = &info.store_path {
            args.store_path = Some(store_path.clone());
        }
    }

    if matches!(args.format, OutputFormat::Text) {
        if let Some(format) = info.format {
            args.format = format;
        }
    }

    if args.server.is_none() {
        if let Some(server) = &info.server {
            args.server = Some(server.clone());
        } else if let Some(url) = config.http_server_url() {
            args.server = Some(url.clone());
        }
    }

    if !args.no_server {
        if let Some(true) = info.no_server {
            args.no_server = true;
        }
    }
}

pub fn apply_serve_config_defaults(config: &CliConfig, args: &mut ServeArgs) {
    if let Some(serve) = &config.serve {
        if args.addr == DEFAULT_SERVE_ADDR {
            if let Some(addr) = &serve.addr {
                args.addr = addr.clone();
            }
        }

        if args.store_backend.is_none() {
            args.store_backend = serve.store_backend;
        }

        if args.store_path.is_none() {
            if let Some(store_path) = &serve.store_path {
                args.store_path = Some(store_path.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> CliConfig {
        toml::from_str(toml_text).expect("valid config")
    }

    fn bare_search_args() -> SearchArgs {
        SearchArgs {
            entity: None,
            query: None,
            or: false,
            format: OutputFormat::Text,
            store_backend: None,
            store_path: None,
            server: None,
            no_server: false,
        }
    }

    #[test]
    fn configured_entity_turns_lone_positional_into_query() {
        let config = parse(
            r#"
[search]
entity = "users"
or = true
format = "json"
store_path = "db/records.sqlite"
"#,
        );

        let mut args = bare_search_args();
        args.entity = Some("username:ali".to_string());
        apply_search_config_defaults(&config, &mut args);

        assert_eq!(args.entity.as_deref(), Some("users"));
        assert_eq!(args.query.as_deref(), Some("username:ali"));
        assert!(args.or);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.store_path, Some(PathBuf::from("db/records.sqlite")));
    }

    #[test]
    fn lone_entity_name_stays_the_entity_under_configured_default() {
        let config = parse(
            r#"
[search]
entity = "users"
"#,
        );

        let mut args = bare_search_args();
        args.entity = Some("accounts".to_string());
        apply_search_config_defaults(&config, &mut args);

        assert_eq!(args.entity.as_deref(), Some("accounts"));
        assert_eq!(args.query, None);
    }

    #[test]
    fn explicit_flags_win_over_config() {
        let config = parse(
            r#"
[search]
entity = "users"
format = "json"
store_backend = "sqlite"
"#,
        );

        let mut args = bare_search_args();
        args.entity = Some("accounts".to_string());
        args.query = Some("email:example".to_string());
        args.format = OutputFormat::Table;
        args.store_backend = Some(StoreBackendArg::File);
        apply_search_config_defaults(&config, &mut args);

        assert_eq!(args.entity.as_deref(), Some("accounts"));
        assert_eq!(args.format, OutputFormat::Table);
        assert_eq!(args.store_backend, Some(StoreBackendArg::File));
    }

    #[test]
    fn http_section_supplies_server_url() {
        let config = parse(
            r#"
[http]
server_url = "http://127.0.0.1:9000"
"#,
        );

        let mut args = bare_search_args();
        apply_search_config_defaults(&config, &mut args);
        assert_eq!(args.server.as_deref(), Some("http://127.0.0.1:9000"));
    }

    #[test]
    fn serve_addr_only_overrides_default() {
        let config = parse(
            r#"
[serve]
addr = "0.0.0.0:9999"
store_backend = "sqlite"
"#,
        );

        let mut args = ServeArgs {
            addr: DEFAULT_SERVE_ADDR.to_string(),
            store_backend: None,
            store_path: None,
        };
        apply_serve_config_defaults(&config, &mut args);
        assert_eq!(args.addr, "0.0.0.0:9999");
        assert_eq!(args.store_backend, Some(StoreBackendArg::Sqlite));

        let mut args = ServeArgs {
            addr: "127.0.0.1:1".to_string(),
            store_backend: None,
            store_path: None,
        };
        apply_serve_config_defaults(&config, &mut args);
        assert_eq!(args.addr, "127.0.0.1:1");
    }

    #[test]
    fn logging_level_is_read() {
        let config = parse(
            r#"
[logging]
level = "debug"
"#,
        );
        assert_eq!(config.log_level(), Some("debug"));
    }

    #[test]
    fn project_config_is_found_in_parent_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join(".appsearch");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("appsearch.toml"), "").unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_project_config(&nested),
            Some(dir.join("appsearch.toml"))
        );
    }
}
