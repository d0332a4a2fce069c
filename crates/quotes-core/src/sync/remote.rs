//! Remote quote source
//!
//! The transport only returns raw JSON items. Turning an item into a
//! record (id namespacing, picking the text field) happens in
//! [`to_raw_record`], on the core side.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::error::SyncError;
use crate::models::{RawRecord, SERVER_ID_PREFIX};

/// Fetch timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

/// Fields tried, in order, for the quote text of a remote item
const TEXT_FIELDS: &[&str] = &["text", "title", "body"];

/// Anything that can hand back a bounded list of remote items
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch at most `limit` raw items
    async fn fetch(&self, limit: usize) -> Result<Vec<Value>, SyncError>;
}

/// Remote source backed by an HTTP endpoint returning a JSON array
pub struct HttpRemoteSource {
    url: String,
    client: reqwest::Client,
}

impl HttpRemoteSource {
    pub fn new(url: &str) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .user_agent(concat!("quotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SyncError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch(&self, limit: usize) -> Result<Vec<Value>, SyncError> {
        debug!(url = %self.url, limit, "Fetching remote quotes");

        let response = self
            .client
            .get(&self.url)
            .query(&[("_limit", limit)])
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SyncError::Transport {
                url: self.url.clone(),
                source,
            })?;

        parse_payload(&self.url, &body, limit)
    }
}

/// Parse a response body into at most `limit` items
pub fn parse_payload(url: &str, body: &str, limit: usize) -> Result<Vec<Value>, SyncError> {
    let value: Value = serde_json::from_str(body).map_err(|e| SyncError::InvalidPayload {
        url: url.to_string(),
        details: e.to_string(),
    })?;

    let Value::Array(mut items) = value else {
        return Err(SyncError::InvalidPayload {
            url: url.to_string(),
            details: "expected a JSON array".to_string(),
        });
    };

    items.truncate(limit);
    Ok(items)
}

/// Map a raw remote item onto record input
///
/// The remote id (string or number) is namespaced with `server-`. Text
/// comes from the first non-blank of `text`, `title`, `body`; category
/// from `category`, falling back to `default_category`. Items that are
/// not objects map to empty input, which normalization then drops.
pub fn to_raw_record(item: &Value, default_category: &str) -> RawRecord {
    let Some(fields) = item.as_object() else {
        return RawRecord::default();
    };

    let id = fields.get("id").and_then(remote_id).map(Value::String);

    let text = TEXT_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key))
        .find(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
        .cloned();

    let category = fields
        .get("category")
        .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
        .cloned()
        .unwrap_or_else(|| Value::String(default_category.to_string()));

    RawRecord {
        id,
        text,
        category: Some(category),
        updated_at: fields.get("updatedAt").cloned(),
    }
}

fn remote_id(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        None
    } else if raw.starts_with(SERVER_ID_PREFIX) {
        Some(raw)
    } else {
        Some(format!("{}{}", SERVER_ID_PREFIX, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Origin, Record};
    use serde_json::json;

    fn record(item: Value) -> Option<Record> {
        Record::from_raw(to_raw_record(&item, "Server"), Origin::Server)
    }

    #[test]
    fn test_numeric_id_is_namespaced() {
        let r = record(json!({"id": 9, "title": "Hello"})).unwrap();
        assert_eq!(r.id, "server-9");
        assert_eq!(r.text, "Hello");
        assert_eq!(r.category, "Server");
    }

    #[test]
    fn test_prefixed_id_kept() {
        let r = record(json!({"id": "server-9", "text": "Hello", "category": "B"})).unwrap();
        assert_eq!(r.id, "server-9");
        assert_eq!(r.category, "B");
    }

    #[test]
    fn test_text_field_precedence() {
        let r = record(json!({"id": 1, "text": " ", "title": "Title", "body": "Body"})).unwrap();
        assert_eq!(r.text, "Title");

        let r = record(json!({"id": 1, "body": "Body only"})).unwrap();
        assert_eq!(r.text, "Body only");
    }

    #[test]
    fn test_unusable_items_map_to_rejected_input() {
        assert!(record(json!("not an object")).is_none());
        assert!(record(json!({"id": 1})).is_none());
        assert!(!to_raw_record(&json!({"title": "No id"}), "Server").has_id());
    }

    #[test]
    fn test_parse_payload_truncates() {
        let items = parse_payload("http://x", r#"[{"id":1},{"id":2},{"id":3}]"#, 2).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_payload_rejects_non_array() {
        let err = parse_payload("http://x", r#"{"id":1}"#, 5).unwrap_err();
        assert!(matches!(err, SyncError::InvalidPayload { .. }));

        let err = parse_payload("http://x", "<html>", 5).unwrap_err();
        assert!(matches!(err, SyncError::InvalidPayload { .. }));
    }

    #[test]
    fn test_http_source_new() {
        let source = HttpRemoteSource::new("http://localhost:9/posts").unwrap();
        assert_eq!(source.url(), "http://localhost:9/posts");
    }
}
