use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::SearchResponse;
use crate::search::engine;
use crate::search::INVALID_SEARCH_EXPRESSION;
use crate::server;
use crate::store;

mod args;
mod config;
mod format;
mod http_backend;

pub use args::{
    Cli, Commands, EntitiesArgs, LoadArgs, OutputFormat, SearchArgs, ServeArgs, StoreInfoArgs,
};

use config::{
    apply_load_config_defaults, apply_search_config_defaults, apply_serve_config_defaults,
    apply_store_info_config_defaults, load_cli_config, CliConfig,
};
use http_backend::HttpSearchBackend;

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = load_cli_config()?;

    init_logging(cli.log_level.as_deref(), cli_config.as_ref());

    match cli.command {
        Some(Commands::Search(mut search_args)) => {
            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }

            let config = args::search_config_from_args(&search_args)?;
            let outcome = if let Some(server_url) =
                effective_server_url(search_args.server.as_deref(), search_args.no_server)
            {
                let backend = HttpSearchBackend::new(server_url)?;
                backend.search(config)
            } else {
                engine::run_search(config)
            };

            let response = match outcome {
                Ok(response) => response,
                Err(err) if is_rejected_query(&err) => {
                    info!(cause = %format!("{err:#}"), "rejected search query");
                    if matches!(search_args.format, OutputFormat::Json) {
                        serde_json::to_writer(
                            std::io::stdout(),
                            &SearchResponse::failed(INVALID_SEARCH_EXPRESSION),
                        )?;
                        println!();
                    }
                    return Err(anyhow!(INVALID_SEARCH_EXPRESSION));
                }
                Err(err) => return Err(err),
            };

            match search_args.format {
                OutputFormat::Text => format::print_text(&response),
                OutputFormat::Table => format::print_table(&response),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &response)?;
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Load(mut load_args)) => {
            if let Some(ref config) = cli_config {
                apply_load_config_defaults(config, &mut load_args);
            }

            let config = args::load_config_from_args(&load_args);
            let summary = store::load_records(&config)?;

            println!(
                "Loaded {} records into {} store at {}",
                summary.records_loaded.unwrap_or(0),
                summary.backend.as_str(),
                summary.store_path.display()
            );

            Ok(())
        }
        Some(Commands::StoreInfo(mut info_args)) => {
            if let Some(ref config) = cli_config {
                apply_store_info_config_defaults(config, &mut info_args);
            }

            let config = args::store_info_config_from_args(&info_args);
            let summary = if let Some(server_url) =
                effective_server_url(info_args.server.as_deref(), info_args.no_server)
            {
                let backend = HttpSearchBackend::new(server_url)?;
                backend.store_info(config)?
            } else {
                store::get_store_info(&config)?
            };

            match info_args.format {
                OutputFormat::Text | OutputFormat::Table => {
                    format::print_store_summary_text(&summary)
                }
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &summary)?;
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Entities(entities_args)) => {
            let entities = engine::list_entities();

            match entities_args.format {
                OutputFormat::Text | OutputFormat::Table => format::print_entities_text(&entities),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &entities)?;
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Serve(mut serve_args)) => {
            if let Some(ref config) = cli_config {
                apply_serve_config_defaults(config, &mut serve_args);
            }

            let addr: SocketAddr = serve_args.addr.parse()?;
            let default_store = args::serve_store_config_from_args(&serve_args);
            println!("Starting appsearch HTTP server on http://{addr}");

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(server::run(addr, default_store))?;
            Ok(())
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins, then `--log-level`, then `[logging] level`, then
/// `warn`.
fn init_logging(flag: Option<&str>, config: Option<&CliConfig>) {
    let fallback = flag
        .or_else(|| config.and_then(CliConfig::log_level))
        .unwrap_or("warn");

    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// A query the engine refused to compile, either locally or as
/// reported by a daemon.
fn is_rejected_query(err: &anyhow::Error) -> bool {
    engine::is_search_error(err) || err.to_string() == INVALID_SEARCH_EXPRESSION
}

fn effective_server_url(server_flag: Option<&str>, no_server: bool) -> Option<String> {
    if no_server {
        None
    } else {
        server_flag.map(|s| s.to_string())
    }
}
