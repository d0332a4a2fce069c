//! JSON import and export of quotes
//!
//! Export writes the flat record array the snapshot uses. Import accepts
//! any array of objects carrying string `text` and `category`; anything
//! else is skipped, and a batch with nothing usable is rejected whole.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::models::{RawRecord, Record};

/// Why an import payload was rejected
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid format: expected an array of quotes")]
    NotAnArray,

    #[error("No valid quotes found in file")]
    NoValidQuotes,
}

/// Parse an import payload into raw records
///
/// Text and category are trimmed here so that blank entries are skipped
/// rather than failing later. Ids and timestamps pass through untouched.
pub fn parse_import(payload: &str) -> Result<Vec<RawRecord>, ImportError> {
    let value: Value = serde_json::from_str(payload)?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    let raws: Vec<RawRecord> = items.into_iter().filter_map(import_item).collect();
    if raws.is_empty() {
        return Err(ImportError::NoValidQuotes);
    }
    Ok(raws)
}

fn import_item(item: Value) -> Option<RawRecord> {
    let Value::Object(mut fields) = item else {
        return None;
    };
    let text = fields.get("text")?.as_str()?.trim().to_string();
    let category = fields.get("category")?.as_str()?.trim().to_string();
    if text.is_empty() || category.is_empty() {
        return None;
    }

    Some(RawRecord {
        id: fields.remove("id").filter(|v| v.is_string()),
        text: Some(Value::String(text)),
        category: Some(Value::String(category)),
        updated_at: fields.remove("updatedAt"),
    })
}

/// Render records as pretty-printed JSON
pub fn export_json(records: &[Record]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Default file name for an export made today
pub fn export_file_name() -> String {
    export_file_name_for(Utc::now().date_naive())
}

fn export_file_name_for(date: NaiveDate) -> String {
    format!("quotes-{}.json", date.format("%Y-%m-%d"))
}
