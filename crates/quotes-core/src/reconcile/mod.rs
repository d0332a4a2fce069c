//! Reconciliation of the local store against a remote snapshot
//!
//! The engine merges each fetched batch into the store, accepting the
//! remote side provisionally whenever the same text shows up under two
//! different ids, and keeps those collisions as pending conflicts until
//! they are resolved or superseded by the next pass.

mod engine;
mod resolver;

pub use engine::{ReconcileSummary, ReconciliationEngine};
pub use resolver::Resolution;
