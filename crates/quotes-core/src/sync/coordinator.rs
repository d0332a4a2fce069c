//! Single-flight reconciliation passes
//!
//! A pass fetches from the remote source without holding the store lock,
//! then locks the store and merges. Two guards apply:
//!
//! - only one pass runs at a time; a pass requested while another is in
//!   flight is skipped rather than queued
//! - every pass records the generation it started under; if
//!   [`SyncCoordinator::invalidate`] ran meanwhile, its result is discarded

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::debug;

use super::remote::RemoteSource;
use crate::reconcile::ReconcileSummary;
use crate::store::Store;

/// What happened to a requested pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The remote batch was merged into the store
    Applied(ReconcileSummary),
    /// Another pass was already in flight
    Skipped,
    /// The pass was invalidated before it could apply
    Stale,
}

/// Runs reconciliation passes against one remote source
pub struct SyncCoordinator<R> {
    source: R,
    limit: usize,
    in_flight: AtomicBool,
    generation: AtomicU64,
}

impl<R: RemoteSource> SyncCoordinator<R> {
    /// Create a coordinator fetching at most `limit` items per pass
    pub fn new(source: R, limit: usize) -> Self {
        Self {
            source,
            limit,
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Discard the result of any pass currently in flight
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Run one pass
    ///
    /// A fetch or persistence failure is returned as an error; the store
    /// keeps its records and pending conflicts.
    pub async fn run_pass(&self, store: &Mutex<Store>) -> Result<PassOutcome> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Sync pass already in flight, skipping");
            return Ok(PassOutcome::Skipped);
        };

        let started = self.generation.load(Ordering::SeqCst);
        let items = self.source.fetch(self.limit).await?;

        let mut store = store.lock().await;
        if self.generation.load(Ordering::SeqCst) != started {
            debug!("Sync pass invalidated, discarding {} items", items.len());
            return Ok(PassOutcome::Stale);
        }

        let summary = store.reconcile(items)?;
        debug!(generation = started, "Sync pass applied");
        Ok(PassOutcome::Applied(summary))
    }
}

/// Clears the in-flight flag when the pass ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
