//! Sync with a remote quote source
//!
//! - `remote`: the [`RemoteSource`] trait and its HTTP implementation
//! - `coordinator`: single-flight passes with stale-result detection
//! - `poller`: background task running passes on an interval
//!
//! Fetching never holds the store lock. A pass that fails leaves the
//! store and its pending conflicts exactly as they were.

mod coordinator;
mod error;
mod poller;
mod remote;

pub use coordinator::{PassOutcome, SyncCoordinator};
pub use error::SyncError;
pub use poller::{spawn_sync_poller, SyncCommand, SyncEvent, SyncHandle};
pub use remote::{parse_payload, to_raw_record, HttpRemoteSource, RemoteSource};
