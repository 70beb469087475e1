//! Search entry points.
//!
//! These functions provide the "search as a function" API used by the
//! CLI and the HTTP server.

use anyhow::Result;
use tracing::{debug, info};

use crate::models::{EntityInfo, SearchConfig, SearchResponse};
use crate::search::builder::build;
use crate::search::entities::EntityKind;
use crate::search::error::SearchError;
use crate::search::operators::OperatorRegistry;
use crate::search::parser::parse;
use crate::search::predicate::Compiled;
use crate::search::schema::Root;
use crate::store;

/// Parse and compile `query` for `entity` against the standard
/// registry. Returns the store scope alongside the predicate.
pub fn compile_query(entity: EntityKind, query: &str, or: bool) -> Result<(Root, Compiled), SearchError> {
    compile_query_with(entity, query, or, OperatorRegistry::global())
}

pub fn compile_query_with(
    entity: EntityKind,
    query: &str,
    or: bool,
    registry: &OperatorRegistry,
) -> Result<(Root, Compiled), SearchError> {
    let descriptor = entity.descriptor();
    let criteria = parse(query, descriptor.grammar(), or);
    debug!(
        entity = entity.name(),
        criteria = criteria.len(),
        or,
        "parsed search query"
    );
    let compiled = build(&criteria, &entity, registry)?;
    Ok((descriptor.scope(), compiled))
}

/// Execute a search against the configured store.
///
/// Compile failures surface as a `SearchError` inside the returned
/// `anyhow::Error`; callers downcast to tell them apart from store
/// failures.
pub fn run_search(config: SearchConfig) -> Result<SearchResponse> {
    let entity: EntityKind = config.entity.parse()?;
    let (scope, compiled) = compile_query(entity, &config.query, config.or)?;

    let store_config = config.store.unwrap_or_default();
    let store = store::open_existing_store(&store_config)?;
    let results = store.find_matching(&scope, &compiled)?;
    info!(
        entity = entity.name(),
        scope = %scope.describe(),
        matches = results.len(),
        "search finished"
    );

    Ok(SearchResponse {
        results,
        error: None,
    })
}

/// Describe every searchable entity kind.
pub fn list_entities() -> Vec<EntityInfo> {
    EntityKind::ALL
        .into_iter()
        .map(|kind| {
            let descriptor = kind.descriptor();
            EntityInfo {
                name: kind.name().to_string(),
                scope: descriptor.scope().describe(),
                operators: descriptor
                    .supported_operators()
                    .map(str::to_string)
                    .collect(),
                renames: descriptor
                    .key_mappings()
                    .iter()
                    .map(|(from, to)| (from.to_string(), to.to_string()))
                    .collect(),
                converted: {
                    let mut keys: Vec<String> =
                        descriptor.converters().keys().map(str::to_string).collect();
                    keys.sort();
                    keys
                },
                overrides: descriptor
                    .overrides()
                    .entries()
                    .into_iter()
                    .map(|(key, literal)| format!("{key}{literal}"))
                    .collect(),
            }
        })
        .collect()
}

/// Whether `err` came from compiling the query rather than from the
/// store or I/O.
pub fn is_search_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<SearchError>().is_some()
}
