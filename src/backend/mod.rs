//! Backend Module
//!
//! The document store the cache persists into. [`ElasticClient`] talks to a
//! real Elasticsearch cluster over HTTP; [`MemoryStore`] evaluates the same
//! requests in process.

mod elastic;
mod error;
mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub use elastic::{ElasticClient, ElasticConfig};
pub use error::BackendError;
pub use memory::{entry_document, MemoryStore};

// == Document Store ==
/// Index, search and delete-by-query against a named index.
///
/// Bodies are the JSON documents and query DSL the store understands.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates or fully replaces the document stored under `id`.
    ///
    /// With `refresh` set, the write is made visible to search before the
    /// call returns.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
        refresh: bool,
    ) -> Result<(), BackendError>;

    /// Runs a search request.
    async fn search(
        &self,
        index: &str,
        body: &Value,
        track_total_hits: bool,
    ) -> Result<SearchResponse, BackendError>;

    /// Deletes every document matching the query in `body`.
    async fn delete_by_query(
        &self,
        index: &str,
        body: &Value,
    ) -> Result<DeleteByQueryResponse, BackendError>;
}

// == Wire Types ==
/// Body of a successful `_search` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Hits,
}

/// The `hits` section of a search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

impl Hits {
    /// Number of matching documents, falling back to the returned hits when
    /// the total was not tracked.
    pub fn match_count(&self) -> u64 {
        self.total
            .as_ref()
            .map_or(self.hits.len() as u64, TotalHits::value)
    }
}

/// Total hit count, a bare number on 6.x and an object from 7.x onward.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Tracked { value: u64, relation: String },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Tracked { value, .. } => *value,
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

/// Body of a `_delete_by_query` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteByQueryResponse {
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub failures: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_v6_total() {
        let json = r#"{"hits":{"total":2,"hits":[{"_id":"a","_source":{"key":"a"}}]}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.hits.total.unwrap().value(), 2);
        assert_eq!(resp.hits.hits.len(), 1);
        assert_eq!(resp.hits.hits[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn test_search_response_v7_total() {
        let json = r#"{"took":3,"hits":{"total":{"value":0,"relation":"eq"},"hits":[]}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.hits.total,
            Some(TotalHits::Tracked {
                value: 0,
                relation: "eq".to_string()
            })
        );
        assert!(resp.hits.hits.is_empty());
    }

    #[test]
    fn test_match_count() {
        let json = r#"{"hits":{"total":{"value":5,"relation":"eq"},"hits":[{"_id":"a"}]}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.hits.match_count(), 5);

        let json = r#"{"hits":{"hits":[{"_id":"a"},{"_id":"b"}]}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.hits.match_count(), 2);
    }

    #[test]
    fn test_hit_without_source() {
        let json = r#"{"hits":{"hits":[{"_id":"a"}]}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(resp.hits.hits[0].source.is_none());
    }

    #[test]
    fn test_delete_by_query_response() {
        let json = r#"{"took":12,"deleted":3,"failures":[]}"#;
        let resp: DeleteByQueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.deleted, 3);
        assert!(resp.failures.is_empty());
    }
}
