//! Storage layer
//!
//! Persists the store as JSON snapshots behind the `PersistenceAdapter`
//! trait. The file backend is the default; the in-memory backend is
//! used by tests and by callers that do not want anything on disk.

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{keys, save_json, FilePersistence, MemoryPersistence, PersistenceAdapter};
