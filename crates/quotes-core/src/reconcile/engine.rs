//! Merge of a remote snapshot into the local store

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Conflict, Origin, RawRecord, Record};
use crate::records::RecordStore;

/// Counts from one reconciliation pass
///
/// Reported for observability only; nothing downstream depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Remote records that had no local counterpart
    pub added: usize,
    /// Local records overwritten by a same-id remote record
    pub updated: usize,
    /// Content collisions raised for review
    pub conflicts: usize,
    /// Remote records already identical locally
    pub unchanged: usize,
    /// Malformed remote items discarded before merging
    pub dropped: usize,
}

impl ReconcileSummary {
    /// True if the pass did not change the store
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.conflicts == 0
    }
}

/// Holds the pending conflicts between passes
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    pub(super) conflicts: Vec<Conflict>,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore an engine with previously pending conflicts
    pub fn with_conflicts(conflicts: Vec<Conflict>) -> Self {
        Self { conflicts }
    }

    /// Conflicts awaiting resolution
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn conflict(&self, conflict_id: &str) -> Option<&Conflict> {
        self.conflicts.iter().find(|c| c.conflict_id == conflict_id)
    }

    /// Merge a remote batch into `store`
    ///
    /// Items are normalized first; any without an id or with blank
    /// text/category are dropped before the merge starts. Then, in order:
    ///
    /// 1. same id locally: remote replaces local if text or category differ
    /// 2. same text under another id: local is removed, remote inserted, and
    ///    a conflict records both so the choice can be reverted
    /// 3. otherwise remote is appended
    ///
    /// The pending conflict list is replaced by the conflicts of this pass.
    pub fn reconcile(&mut self, store: &mut RecordStore, remote: Vec<RawRecord>) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        let batch: Vec<Record> = remote
            .into_iter()
            .filter_map(|raw| {
                let record = if raw.has_id() {
                    Record::from_raw(raw, Origin::Server)
                } else {
                    None
                };
                if record.is_none() {
                    summary.dropped += 1;
                }
                record
            })
            .collect();

        let mut conflicts = Vec::new();
        for incoming in batch {
            merge_one(store, incoming, &mut conflicts, &mut summary);
        }

        let superseded = self.conflicts.len();
        self.conflicts = conflicts;

        info!(
            added = summary.added,
            updated = summary.updated,
            conflicts = summary.conflicts,
            unchanged = summary.unchanged,
            dropped = summary.dropped,
            superseded,
            "Reconciliation pass complete"
        );
        summary
    }
}

fn merge_one(
    store: &mut RecordStore,
    incoming: Record,
    conflicts: &mut Vec<Conflict>,
    summary: &mut ReconcileSummary,
) {
    if let Some(existing) = store.find_by_id(&incoming.id) {
        if existing.same_content(&incoming) {
            summary.unchanged += 1;
        } else {
            debug!(id = %incoming.id, "Remote update replaces local record");
            store.upsert_by_id(incoming);
            summary.updated += 1;
        }
        return;
    }

    if let Some(colliding) = store.find_by_text(&incoming.text, &incoming.id).cloned() {
        debug!(
            local = %colliding.id,
            remote = %incoming.id,
            "Content collision, remote accepted provisionally"
        );
        store.remove_by_id(&colliding.id);
        store.upsert_by_id(incoming.clone());

        let conflict_id = if conflicts.iter().any(|c| c.conflict_id == incoming.id) {
            format!("conflict-{}", Uuid::new_v4().simple())
        } else {
            incoming.id.clone()
        };
        conflicts.push(Conflict {
            conflict_id,
            local: colliding,
            remote: incoming,
        });
        summary.conflicts += 1;
        return;
    }

    debug!(id = %incoming.id, "Adding remote record");
    store.upsert_by_id(incoming);
    summary.added += 1;
}
