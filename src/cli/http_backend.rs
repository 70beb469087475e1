use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Serialize;

use crate::models::{SearchConfig, SearchResponse, StoreConfig, StoreSummary};

/// HTTP client backend that delegates searches to a running
/// `appsearch` daemon.
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
}

impl HttpSearchBackend {
    /// Create a new HTTP backend targeting the given base URL
    /// (e.g. "http://127.0.0.1:7878").
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Execute a search via `POST /v1/search`.
    ///
    /// A rejected query comes back as a `400` carrying the response
    /// envelope; its message becomes the returned error.
    pub fn search(&self, config: SearchConfig) -> Result<SearchResponse> {
        let url = self.url_for("/v1/search");
        let response = self.send(&url, &config)?;

        if response.status() == StatusCode::BAD_REQUEST {
            let envelope = response
                .json::<SearchResponse>()
                .context("failed to decode JSON response from server")?;
            return Err(anyhow!(envelope
                .error
                .unwrap_or_else(|| format!("server rejected request to {url}"))));
        }

        decode(response, &url)
    }

    /// Inspect a store via `POST /v1/store/info`.
    pub fn store_info(&self, config: StoreConfig) -> Result<StoreSummary> {
        let url = self.url_for("/v1/store/info");
        let response = self.send(&url, &config)?;
        decode(response, &url)
    }

    fn send<T: Serialize>(&self, url: &str, body: &T) -> Result<Response> {
        self.client
            .post(url)
            .json(body)
            .send()
            .with_context(|| format!("failed to send request to {}", url))
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn decode<R: serde::de::DeserializeOwned>(response: Response, url: &str) -> Result<R> {
    let response = response
        .error_for_status()
        .with_context(|| format!("server returned error for {}", url))?;

    response
        .json::<R>()
        .context("failed to decode JSON response from server")
}
