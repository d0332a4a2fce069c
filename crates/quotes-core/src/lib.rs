//! Quotes Core Library
//!
//! This crate provides the core functionality for quotes, a local quote
//! collection that reconciles itself against a remote quote source.
//!
//! # Architecture
//!
//! - **Local store**: ordered records indexed by id, persisted as a full
//!   JSON snapshot after every mutation
//! - **Reconciliation**: remote wins on same-id edits; a remote record
//!   whose text matches a different local record replaces it and raises a
//!   conflict for the user to resolve
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Add a quote
//! store.add_quote("Simplicity is the soul of efficiency.", "Programming")?;
//!
//! // Merge a remote batch
//! let summary = store.reconcile(items)?;
//! for conflict in store.conflicts() {
//!     store.resolve_keep_local(&conflict.conflict_id)?;
//! }
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Records, raw input and conflicts
//! - `records`: Id-indexed record collection
//! - `reconcile`: Merge engine and conflict resolution
//! - `storage`: Keyed snapshot persistence
//! - `sync`: Remote source, pass coordination and polling
//! - `transfer`: JSON import and export
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod reconcile;
pub mod records;
pub mod storage;
pub mod store;
pub mod sync;
pub mod transfer;

pub use config::Config;
pub use models::{Conflict, Origin, RawRecord, Record};
pub use reconcile::{ReconcileSummary, ReconciliationEngine, Resolution};
pub use records::{RecordStore, Upsert};
pub use storage::{FilePersistence, MemoryPersistence, PersistenceAdapter, StorageError};
pub use store::{ImportSummary, Store, ALL_CATEGORIES};
pub use sync::{HttpRemoteSource, PassOutcome, RemoteSource, SyncCoordinator, SyncError};
pub use transfer::ImportError;
