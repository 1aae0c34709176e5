//! Memory Store Module
//!
//! In-process [`DocumentStore`] holding documents per index, evaluating the
//! `match`, `prefix` and `match_all` queries the cache issues.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{
    BackendError, DeleteByQueryResponse, DocumentStore, Hit, Hits, SearchResponse, TotalHits,
};

// == Stored Document ==
#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    source: Value,
}

// == Memory Store ==
/// Document store kept in a `HashMap` of index name to documents.
///
/// Documents keep insertion order, so search hits come back oldest first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Index name to documents
    indices: RwLock<HashMap<String, Vec<StoredDocument>>>,
    /// When set, every call fails with a backend error
    failing: AtomicBool,
    /// When set, only delete-by-query calls fail
    failing_deletes: AtomicBool,
    /// Number of delete-by-query calls received
    delete_calls: AtomicUsize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store with no indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a document without upsert semantics.
    ///
    /// Allows states the cache never produces itself, such as two documents
    /// carrying the same `key` under different ids.
    pub async fn insert_raw(&self, index: &str, id: &str, source: Value) {
        let mut indices = self.indices.write().await;
        indices
            .entry(index.to_string())
            .or_default()
            .push(StoredDocument {
                id: id.to_string(),
                source,
            });
    }

    /// Returns the stored document for `id`, if any.
    pub async fn document(&self, index: &str, id: &str) -> Option<Value> {
        let indices = self.indices.read().await;
        indices
            .get(index)?
            .iter()
            .find(|doc| doc.id == id)
            .map(|doc| doc.source.clone())
    }

    /// Number of documents in `index` (zero when it does not exist).
    pub async fn len(&self, index: &str) -> usize {
        let indices = self.indices.read().await;
        indices.get(index).map_or(0, Vec::len)
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes only delete-by-query calls fail (or succeed again).
    pub fn set_failing_deletes(&self, failing: bool) {
        self.failing_deletes.store(failing, Ordering::SeqCst);
    }

    /// Number of delete-by-query calls received so far.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::query(
                "503 Service Unavailable",
                "cluster_block_exception",
                "blocked by: [SERVICE_UNAVAILABLE/1/state not recovered / initialized];",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
        _refresh: bool,
    ) -> Result<(), BackendError> {
        self.check_available()?;

        let mut indices = self.indices.write().await;
        let docs = indices.entry(index.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(doc) => doc.source = body.clone(),
            None => docs.push(StoredDocument {
                id: id.to_string(),
                source: body.clone(),
            }),
        }
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        body: &Value,
        track_total_hits: bool,
    ) -> Result<SearchResponse, BackendError> {
        self.check_available()?;
        let query = Query::parse(body)?;

        let indices = self.indices.read().await;
        let docs = indices.get(index).ok_or_else(|| index_not_found(index))?;

        let hits: Vec<Hit> = docs
            .iter()
            .filter(|doc| query.matches(&doc.source))
            .map(|doc| Hit {
                id: Some(doc.id.clone()),
                source: Some(doc.source.clone()),
            })
            .collect();

        let total = track_total_hits.then(|| TotalHits::Tracked {
            value: hits.len() as u64,
            relation: "eq".to_string(),
        });

        Ok(SearchResponse {
            hits: Hits { total, hits },
        })
    }

    async fn delete_by_query(
        &self,
        index: &str,
        body: &Value,
    ) -> Result<DeleteByQueryResponse, BackendError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(BackendError::query(
                "409 Conflict",
                "version_conflict_engine_exception",
                "version conflict, document already modified",
            ));
        }
        let query = Query::parse(body)?;

        let mut indices = self.indices.write().await;
        let docs = indices
            .get_mut(index)
            .ok_or_else(|| index_not_found(index))?;

        let before = docs.len();
        docs.retain(|doc| !query.matches(&doc.source));

        Ok(DeleteByQueryResponse {
            deleted: (before - docs.len()) as u64,
            failures: Vec::new(),
        })
    }
}

fn index_not_found(index: &str) -> BackendError {
    BackendError::query(
        "404 Not Found",
        "index_not_found_exception",
        format!("no such index [{}]", index),
    )
}

// == Query ==
/// The subset of the query DSL the memory store understands.
#[derive(Debug, PartialEq)]
enum Query {
    MatchAll,
    Match { field: String, value: String },
    Prefix { field: String, value: String },
}

impl Query {
    fn parse(body: &Value) -> Result<Self, BackendError> {
        let query = body
            .get("query")
            .and_then(Value::as_object)
            .ok_or_else(|| parsing_error("request body is missing [query]"))?;

        let (kind, clause) = query
            .iter()
            .next()
            .ok_or_else(|| parsing_error("query is empty"))?;

        match kind.as_str() {
            "match_all" => Ok(Query::MatchAll),
            "match" => {
                let (field, value) = field_clause(clause, "query")?;
                Ok(Query::Match { field, value })
            }
            "prefix" => {
                let (field, value) = field_clause(clause, "value")?;
                Ok(Query::Prefix { field, value })
            }
            other => Err(parsing_error(&format!("unknown query [{}]", other))),
        }
    }

    fn matches(&self, source: &Value) -> bool {
        let field_str = |field: &str| source.get(field).and_then(Value::as_str);
        match self {
            Query::MatchAll => true,
            Query::Match { field, value } => field_str(field) == Some(value.as_str()),
            Query::Prefix { field, value } => {
                field_str(field).is_some_and(|s| s.starts_with(value.as_str()))
            }
        }
    }
}

/// Reads `{"field": "v"}` or the long form `{"field": {"<long_key>": "v"}}`.
fn field_clause(clause: &Value, long_key: &str) -> Result<(String, String), BackendError> {
    let (field, body) = clause
        .as_object()
        .and_then(|map| map.iter().next())
        .ok_or_else(|| parsing_error("query clause is missing a field"))?;

    let value = match body {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get(long_key)
            .and_then(Value::as_str)
            .ok_or_else(|| parsing_error(&format!("[{}] is missing [{}]", field, long_key)))?
            .to_string(),
        _ => return Err(parsing_error(&format!("[{}] must be a string", field))),
    };

    Ok((field.clone(), value))
}

fn parsing_error(reason: &str) -> BackendError {
    BackendError::query("400 Bad Request", "parsing_exception", reason)
}

/// Builds a `{"key": .., "value": .., "created_at": ..}` document.
///
/// Convenience for seeding a [`MemoryStore`] with hand-made entries.
pub fn entry_document(key: &str, value: &str, created_at: &str) -> Value {
    json!({ "key": key, "value": value, "created_at": created_at })
}
