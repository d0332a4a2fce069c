//! Sync error types

use thiserror::Error;

/// Failures that abort a reconciliation pass
///
/// All of them leave the store and the pending conflicts untouched.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to reach remote source ({url}): {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote source ({url}) returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Remote source ({url}) returned an unexpected payload: {details}")]
    InvalidPayload { url: String, details: String },

    #[error("Remote source unavailable: {0}")]
    Unavailable(String),
}
