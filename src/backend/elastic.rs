//! Elasticsearch Client
//!
//! [`DocumentStore`] over the Elasticsearch REST API.
//!
//! - `PUT /{index}/_doc/{id}?refresh=true` to upsert an entry
//! - `POST /{index}/_bulk?refresh=true` for ids that cannot be a path segment
//! - `POST /{index}/_search?track_total_hits=true` to look one up
//! - `POST /{index}/_delete_by_query` for invalidation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{BackendError, DeleteByQueryResponse, DocumentStore, SearchResponse};

/// Default cluster address.
const DEFAULT_BASE_URL: &str = "http://localhost:9200";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// == Elastic Config ==
/// Connection settings for [`ElasticClient`].
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    /// Cluster base URL (default: http://localhost:9200)
    pub base_url: String,
    /// Basic auth user, if the cluster requires one
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Per-request timeout (default: 10s)
    pub timeout: Duration,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// == Elastic Client ==
/// HTTP client for a single Elasticsearch cluster.
#[derive(Debug, Clone)]
pub struct ElasticClient {
    http: reqwest::Client,
    base_url: Url,
    config: ElasticConfig,
}

impl ElasticClient {
    /// Creates a client, validating the base URL up front.
    pub fn new(config: ElasticConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::Config(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Config(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and turns error statuses into [`BackendError`]s.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, BackendError> {
        let request = match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_client_error() || status.is_server_error() {
            return Err(error_from_body(status, &body));
        }

        Ok(body.to_vec())
    }

    /// Indexes one document through `_bulk`, which carries the id in the body.
    async fn bulk_index(
        &self,
        index: &str,
        id: &str,
        body: &Value,
        refresh: bool,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&[index, "_bulk"])?;
        debug!("indexing document via bulk: index={} id={}", index, id);

        let payload = format!("{}\n{}\n", json!({ "index": { "_id": id } }), body);
        let mut request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(payload);
        if refresh {
            request = request.query(&[("refresh", "true")]);
        }

        let bytes = self.send(request).await?;
        let response: BulkResponse = serde_json::from_slice(&bytes)?;
        if !response.errors {
            return Ok(());
        }

        let item = response
            .items
            .into_iter()
            .find_map(|mut item| item.remove("index"))
            .unwrap_or_default();
        let status =
            StatusCode::from_u16(item.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Err(error_from_detail(status, item.error))
    }
}

/// `.` and `..` are removed from URL paths as dot segments.
fn is_path_segment_safe(id: &str) -> bool {
    !matches!(id, "." | "..")
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Default, Deserialize)]
struct BulkItem {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

#[async_trait]
impl DocumentStore for ElasticClient {
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
        refresh: bool,
    ) -> Result<(), BackendError> {
        if !is_path_segment_safe(id) {
            return self.bulk_index(index, id, body, refresh).await;
        }

        let url = self.endpoint(&[index, "_doc", id])?;
        debug!("indexing document: index={} id={}", index, id);

        let mut request = self.http.put(url).json(body);
        if refresh {
            request = request.query(&[("refresh", "true")]);
        }

        self.send(request).await?;
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        body: &Value,
        track_total_hits: bool,
    ) -> Result<SearchResponse, BackendError> {
        let url = self.endpoint(&[index, "_search"])?;
        debug!("searching: index={} body={}", index, body);

        let mut request = self.http.post(url).json(body);
        if track_total_hits {
            request = request.query(&[("track_total_hits", "true")]);
        }

        let bytes = self.send(request).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn delete_by_query(
        &self,
        index: &str,
        body: &Value,
    ) -> Result<DeleteByQueryResponse, BackendError> {
        let url = self.endpoint(&[index, "_delete_by_query"])?;
        debug!("deleting by query: index={} body={}", index, body);

        let bytes = self.send(self.http.post(url).json(body)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Reads the `error` envelope of a failed response.
///
/// `{"error": {"type": .., "reason": ..}, "status": ..}` becomes a
/// [`BackendError::Query`]; anything else falls back to the bare status.
fn error_from_body(status: StatusCode, body: &[u8]) -> BackendError {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());
    error_from_detail(status, detail)
}

fn error_from_detail(status: StatusCode, detail: Option<Value>) -> BackendError {
    match detail {
        Some(Value::Object(map)) => {
            let field = |name: &str| {
                map.get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            BackendError::query(status.to_string(), field("type"), field("reason"))
        }
        Some(Value::String(reason)) => BackendError::query(status.to_string(), "error", reason),
        _ => BackendError::Http {
            status: status.to_string(),
        },
    }
}
