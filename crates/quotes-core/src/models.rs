//! Data models for quotes
//!
//! Defines the core data structures: Record, RawRecord, and Conflict.
//! Records are what the store holds; raw records are partial input from
//! the user, an import file, a stored snapshot, or the remote source.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Id namespace for records created on this device
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Id namespace for records received from the remote source
pub const SERVER_ID_PREFIX: &str = "server-";

/// Which side of the sync a record id was minted on
///
/// Only used when generating ids. Merge precedence never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Server,
}

impl Origin {
    /// The id prefix for this origin
    pub fn prefix(self) -> &'static str {
        match self {
            Origin::Local => LOCAL_ID_PREFIX,
            Origin::Server => SERVER_ID_PREFIX,
        }
    }

    /// Determine the origin of an id from its prefix
    pub fn of(id: &str) -> Option<Self> {
        if id.starts_with(LOCAL_ID_PREFIX) {
            Some(Origin::Local)
        } else if id.starts_with(SERVER_ID_PREFIX) {
            Some(Origin::Server)
        } else {
            None
        }
    }
}

/// Generate a fresh id in the given namespace
///
/// Millisecond timestamp plus 48 random bits; there is no central
/// sequencer to hand out counters.
pub fn generate_id(origin: Origin) -> String {
    let millis = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{:x}-{}", origin.prefix(), millis, &random[..12])
}

/// A quote with its category tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Stable identifier, unique within a store
    pub id: String,
    /// The quote text (trimmed, never empty)
    pub text: String,
    /// Category tag (trimmed, never empty)
    pub category: String,
    /// When this record was last changed
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a new local record with a fresh id
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self::with_id(generate_id(Origin::Local), text, category)
    }

    /// Create a record with a specific id
    pub fn with_id(
        id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: category.into(),
            updated_at: Utc::now(),
        }
    }

    /// Build a fully-populated record from partial input
    ///
    /// Missing ids are generated in `origin`'s namespace and a missing or
    /// unreadable timestamp is stamped with the current time. Returns `None`
    /// when text or category is absent, not a scalar, or blank once trimmed.
    pub fn from_raw(raw: RawRecord, origin: Origin) -> Option<Self> {
        let text = raw.text.as_ref().and_then(stringify)?;
        let category = raw.category.as_ref().and_then(stringify)?;
        let id = raw
            .id
            .as_ref()
            .and_then(stringify)
            .unwrap_or_else(|| generate_id(origin));
        let updated_at = raw
            .updated_at
            .as_ref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        Some(Self {
            id,
            text,
            category,
            updated_at,
        })
    }

    /// Whether text and category match (id and timestamp ignored)
    pub fn same_content(&self, other: &Record) -> bool {
        self.text == other.text && self.category == other.category
    }

    /// The namespace this record's id was minted in, if recognizable
    pub fn origin(&self) -> Option<Origin> {
        Origin::of(&self.id)
    }
}

/// Partially-populated record input
///
/// Fields are kept as loose JSON values so that numbers and legacy
/// snapshots without ids or timestamps still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
}

impl RawRecord {
    /// Raw input with only text and category
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: None,
            text: Some(Value::String(text.into())),
            category: Some(Value::String(category.into())),
            updated_at: None,
        }
    }

    /// Raw input with an explicit id
    pub fn with_id(
        id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(Value::String(id.into())),
            ..Self::new(text, category)
        }
    }

    /// Whether a usable id was supplied
    pub fn has_id(&self) -> bool {
        self.id.as_ref().and_then(stringify).is_some()
    }
}

impl From<Record> for RawRecord {
    fn from(record: Record) -> Self {
        Self {
            id: Some(Value::String(record.id)),
            text: Some(Value::String(record.text)),
            category: Some(Value::String(record.category)),
            updated_at: Some(Value::String(record.updated_at.to_rfc3339())),
        }
    }
}

/// A remote record whose content collides with a differently-identified
/// local record
///
/// Holds copies of both sides so it can be resolved even after the store
/// has changed underneath it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub conflict_id: String,
    /// The local record that was displaced
    pub local: Record,
    /// The remote record that provisionally replaced it
    pub remote: Record,
}

/// Quotes a fresh store starts with
pub fn default_quotes() -> Vec<Record> {
    [
        (
            "The only limit to our realization of tomorrow is our doubts of today.",
            "Motivation",
        ),
        ("In the middle of difficulty lies opportunity.", "Inspiration"),
        (
            "Code is like humor. When you have to explain it, it\u{2019}s bad.",
            "Programming",
        ),
        ("Simplicity is the soul of efficiency.", "Programming"),
        (
            "Life is what happens when you\u{2019}re busy making other plans.",
            "Life",
        ),
    ]
    .into_iter()
    .map(|(text, category)| Record::new(text, category))
    .collect()
}

/// Render a scalar JSON value as trimmed, non-empty text
fn stringify(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Accept RFC 3339 strings or epoch milliseconds
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}
