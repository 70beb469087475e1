//! HTTP daemon/server mode for `appsearch`.
//!
//! This module exposes a small HTTP+JSON API over the search engine:
//!
//! - `POST /v1/search` accepts a JSON-encoded `SearchConfig` and
//!   returns a `SearchResponse`.
//! - `POST /v1/store/info` accepts a `StoreConfig` and returns a
//!   `StoreSummary`.
//! - `GET /v1/entities` lists the searchable entity kinds.
//! - `GET /v1/health` is a simple health check.
//!
//! Requests that do not name a store use the one the server was
//! started with. A query that fails to compile is answered with `400`
//! and the `invalid search expression` envelope; the cause is only
//! logged.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::models::{EntityInfo, SearchConfig, SearchResponse, StoreConfig, StoreSummary};
use crate::search::{engine, INVALID_SEARCH_EXPRESSION};
use crate::store;

/// Simple health-check response payload.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// JSON error body for failures other than rejected queries.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct ServerState {
    default_store: StoreConfig,
}

impl ServerState {
    pub fn new(default_store: StoreConfig) -> Self {
        Self { default_store }
    }
}

/// Error type used by HTTP handlers to map internal failures into
/// JSON error responses.
#[derive(Debug)]
enum ApiError {
    /// The query did not compile.
    Rejected,
    Status {
        status: StatusCode,
        message: String,
    },
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if engine::is_search_error(&err) {
            warn!(cause = %format!("{err:#}"), "rejected search query");
            return ApiError::Rejected;
        }

        let message = err.to_string();
        if message.starts_with("store not found at ") {
            ApiError::Status {
                status: StatusCode::NOT_FOUND,
                message,
            }
        } else {
            error!(error = %format!("{err:#}"), "request failed");
            ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "internal error".to_string(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Rejected => (
                StatusCode::BAD_REQUEST,
                Json(SearchResponse::failed(INVALID_SEARCH_EXPRESSION)),
            )
                .into_response(),
            ApiError::Status { status, message } => {
                (status, Json(ErrorResponse { error: message })).into_response()
            }
        }
    }
}

/// Build the Axum router for the appsearch HTTP API.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/search", post(search))
        .route("/v1/store/info", post(store_info))
        .route("/v1/entities", get(entities))
        .with_state(Arc::new(state))
}

/// Run the HTTP server bound to the provided socket address.
///
/// This is used by the CLI `appsearch serve` subcommand.
pub async fn run(addr: SocketAddr, default_store: StoreConfig) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, default_store).await
}

/// Run the HTTP server using an existing `TcpListener`.
pub async fn serve_with_listener(listener: TcpListener, default_store: StoreConfig) -> Result<()> {
    info!(
        addr = %listener.local_addr()?,
        backend = default_store.backend.as_str(),
        store = %default_store.store_path.display(),
        "serving search API"
    );
    let app = router(ServerState::new(default_store));
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn search(
    State(state): State<Arc<ServerState>>,
    Json(mut config): Json<SearchConfig>,
) -> Result<Json<SearchResponse>, ApiError> {
    if config.store.is_none() {
        config.store = Some(state.default_store.clone());
    }
    let response = engine::run_search(config)?;
    Ok(Json(response))
}

async fn store_info(Json(config): Json<StoreConfig>) -> Result<Json<StoreSummary>, ApiError> {
    let summary = store::get_store_info(&config)?;
    Ok(Json(summary))
}

async fn entities() -> Json<Vec<EntityInfo>> {
    Json(engine::list_entities())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, LoadConfig, Record, StoreBackendKind};

    fn loaded_store(dir: &std::path::Path) -> StoreConfig {
        let input = dir.join("records.jsonl");
        let lines: Vec<String> = ["alice", "bob"]
            .iter()
            .map(|name| {
                serde_json::to_string(&Record::Account(Account {
                    username: name.to_string(),
                    email: format!("{name}@example.com"),
                    confirmed: true,
                }))
                .unwrap()
            })
            .collect();
        std::fs::write(&input, lines.join("\n")).unwrap();

        let store = StoreConfig {
            backend: StoreBackendKind::File,
            store_path: dir.join("store"),
        };
        store::load_records(&LoadConfig {
            input,
            store: store.clone(),
        })
        .unwrap();
        store
    }

    fn state_for(store: StoreConfig) -> State<Arc<ServerState>> {
        State(Arc::new(ServerState::new(store)))
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok_status() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn search_uses_default_store_when_none_given() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = loaded_store(tmp.path());

        let config = SearchConfig {
            entity: "accounts".to_string(),
            query: "username=bob".to_string(),
            or: false,
            store: None,
        };

        let Json(response) = search(state_for(store), Json(config))
            .await
            .expect("search response");
        assert_eq!(response.results.len(), 1);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn bad_query_is_rejected_with_envelope() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = loaded_store(tmp.path());

        let config = SearchConfig {
            entity: "accounts".to_string(),
            query: "nickname=bob".to_string(),
            or: false,
            store: None,
        };

        let err = search(state_for(store), Json(config))
            .await
            .expect_err("expected rejection");
        assert!(matches!(err, ApiError::Rejected));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_store_is_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = StoreConfig {
            backend: StoreBackendKind::File,
            store_path: tmp.path().join("absent"),
        };

        let err = store_info(Json(config)).await.expect_err("expected error");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn entities_endpoint_lists_catalogue() {
        let Json(entities) = entities().await;
        assert!(entities.iter().any(|e| e.name == "referred-applications"));
    }
}
