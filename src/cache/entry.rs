//! Cache Entry Module
//!
//! The document stored for each cache key.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single cache record, persisted as one document.
///
/// Field names are the stored JSON schema: `key`, `value`, `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key, also used as the document id
    pub key: String,
    /// Opaque payload
    pub value: String,
    /// Write time on the writer's clock (RFC 3339)
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::created_at(key, value, Utc::now())
    }

    /// Creates an entry with an explicit creation time.
    pub fn created_at(
        key: impl Into<String>,
        value: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            created_at,
        }
    }

    // == Age ==
    /// Time elapsed between creation and `now`.
    ///
    /// `None` when `created_at` lies in the future of `now` (writer clock ahead).
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        now.signed_duration_since(self.created_at).to_std().ok()
    }

    // == Is Expired ==
    /// Checks the entry against a lifetime.
    ///
    /// Expired only when the age is strictly greater than `expires_in`; an
    /// entry exactly at the boundary is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>, expires_in: Duration) -> bool {
        self.age_at(now).is_some_and(|age| age > expires_in)
    }

    // == Document Conversion ==
    /// Encodes the entry as the JSON document sent to the index.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Decodes a stored `_source` document.
    pub fn from_document(source: Value) -> serde_json::Result<Self> {
        serde_json::from_value(source)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_creation() {
        let before = Utc::now();
        let entry = CacheEntry::new("foo", "bar");

        assert_eq!(entry.key, "foo");
        assert_eq!(entry.value, "bar");
        assert!(entry.created_at >= before);
    }

    #[test]
    fn test_expiration_boundary() {
        let ttl = Duration::from_secs(10);
        let entry = CacheEntry::created_at("k", "v", t0());
        let eps = chrono::Duration::milliseconds(1);
        let d = chrono::Duration::seconds(10);

        assert!(!entry.is_expired_at(t0() + d - eps, ttl));
        assert!(!entry.is_expired_at(t0() + d, ttl), "boundary is still valid");
        assert!(entry.is_expired_at(t0() + d + eps, ttl));
    }

    #[test]
    fn test_future_entry_is_not_expired() {
        let entry = CacheEntry::created_at("k", "v", t0());
        let now = t0() - chrono::Duration::seconds(30);

        assert!(entry.age_at(now).is_none());
        assert!(!entry.is_expired_at(now, Duration::from_secs(1)));
    }

    #[test]
    fn test_document_field_names() {
        let entry = CacheEntry::created_at("foo", "bar", t0());
        let doc = entry.to_document().unwrap();

        assert_eq!(doc["key"], "foo");
        assert_eq!(doc["value"], "bar");
        assert_eq!(doc["created_at"], "2024-05-01T10:00:00Z");
        assert_eq!(doc.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_reads_offset_timestamps() {
        let doc = serde_json::json!({
            "key": "foo",
            "value": "bar",
            "created_at": "2024-05-01T17:00:00.123456789+07:00"
        });
        let entry = CacheEntry::from_document(doc).unwrap();

        assert_eq!(
            entry.created_at,
            t0() + chrono::Duration::nanoseconds(123_456_789)
        );
    }

    #[test]
    fn test_rejects_malformed_document() {
        let doc = serde_json::json!({ "key": "foo", "value": 42 });
        assert!(CacheEntry::from_document(doc).is_err());
    }
}
