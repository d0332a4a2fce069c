//! Manual resolution of pending conflicts
//!
//! Resolving is total: whatever happened to the store since the conflict
//! was raised, afterwards it holds exactly the chosen side of the pair and
//! the conflict is gone. Unknown ids are a no-op.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use super::engine::ReconciliationEngine;
use crate::models::{Conflict, RawRecord};
use crate::records::RecordStore;

/// Which side of a conflict to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    KeepLocal,
    KeepServer,
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Resolution::KeepLocal),
            "server" | "remote" => Ok(Resolution::KeepServer),
            other => Err(format!(
                "unknown side '{}', expected 'local' or 'server'",
                other
            )),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::KeepLocal => write!(f, "local"),
            Resolution::KeepServer => write!(f, "server"),
        }
    }
}

impl ReconciliationEngine {
    /// Resolve a conflict in favour of one side
    ///
    /// Returns the resolved conflict, or `None` if no pending conflict has
    /// this id.
    pub fn resolve(
        &mut self,
        store: &mut RecordStore,
        conflict_id: &str,
        resolution: Resolution,
    ) -> Option<Conflict> {
        let Some(pos) = self
            .conflicts
            .iter()
            .position(|c| c.conflict_id == conflict_id)
        else {
            debug!(conflict_id, "No pending conflict with this id");
            return None;
        };
        let conflict = self.conflicts.remove(pos);

        match resolution {
            Resolution::KeepLocal => keep_local(store, &conflict),
            Resolution::KeepServer => keep_server(store, &conflict),
        }

        info!(conflict_id, %resolution, "Conflict resolved");
        Some(conflict)
    }

    /// Revert to the local record of a conflict
    pub fn resolve_keep_local(
        &mut self,
        store: &mut RecordStore,
        conflict_id: &str,
    ) -> Option<Conflict> {
        self.resolve(store, conflict_id, Resolution::KeepLocal)
    }

    /// Confirm the remote record of a conflict
    pub fn resolve_keep_server(
        &mut self,
        store: &mut RecordStore,
        conflict_id: &str,
    ) -> Option<Conflict> {
        self.resolve(store, conflict_id, Resolution::KeepServer)
    }
}

fn keep_local(store: &mut RecordStore, conflict: &Conflict) {
    store.remove_by_id(&conflict.remote.id);
    if !store.contains(&conflict.local.id) {
        if let Some(local) = store.normalize(RawRecord::from(conflict.local.clone())) {
            store.upsert_by_id(local);
        }
    }
}

fn keep_server(store: &mut RecordStore, conflict: &Conflict) {
    if !store.contains(&conflict.remote.id) {
        store.upsert_by_id(conflict.remote.clone());
    }
    store.remove_by_id(&conflict.local.id);
}
