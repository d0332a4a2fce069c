//! Unified storage interface
//!
//! The `Store` owns the record collection and the reconciliation engine
//! and persists a full snapshot after every mutating operation:
//! - manual add / remove / import
//! - reconciliation passes
//! - conflict resolution
//! - changing the selected category filter
//!
//! Each mutation starts by re-reading the saved snapshots, so a
//! long-running process (such as `quotes watch`) keeps changes another
//! process saved in the meantime. The new state is computed on a copy and
//! only adopted once it has been written.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;  // Creates or loads existing
//!
//! store.add_quote("Simplicity is the soul of efficiency.", "Programming")?;
//!
//! let summary = store.reconcile(remote_items)?;
//! for conflict in store.conflicts() {
//!     println!("{} vs {}", conflict.local.id, conflict.remote.id);
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{default_quotes, Conflict, RawRecord, Record};
use crate::reconcile::{ReconcileSummary, ReconciliationEngine, Resolution};
use crate::records::{RecordStore, Upsert};
use crate::storage::{keys, save_json, FilePersistence, PersistenceAdapter, StorageError};
use crate::sync::to_raw_record;
use crate::transfer::{export_json, parse_import};

/// Filter value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// Counts from an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records with new ids
    pub added: usize,
    /// Records whose id already existed and were replaced
    pub replaced: usize,
}

/// Unified storage interface for quotes
pub struct Store {
    records: RecordStore,
    engine: ReconciliationEngine,
    persistence: Box<dyn PersistenceAdapter>,
    /// `ALL_CATEGORIES` or one of the current categories
    selected_category: String,
    config: Config,
}

impl Store {
    /// Open the store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with file persistence in `config.data_dir`
    pub fn open_with_config(config: Config) -> Result<Self> {
        let persistence = FilePersistence::new(&config.data_dir);
        Self::open_with_persistence(config, Box::new(persistence))
    }

    /// Open the store on top of any persistence backend
    ///
    /// On first run (or when the saved list is empty or unreadable) the
    /// store is seeded with the default quotes. Entries saved without an id
    /// get one now, and the snapshot is rewritten so the ids stick.
    pub fn open_with_persistence(
        config: Config,
        persistence: Box<dyn PersistenceAdapter>,
    ) -> Result<Self> {
        let mut store = Self {
            records: RecordStore::new(),
            engine: ReconciliationEngine::new(),
            persistence,
            selected_category: ALL_CATEGORIES.to_string(),
            config,
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-read the saved quotes, pending conflicts and selected category
    pub fn reload(&mut self) -> Result<()> {
        let (records, needs_save) = load_records(self.persistence.as_ref())?;
        let conflicts = load_conflicts(self.persistence.as_ref())?;
        let stored_category = load_selected_category(self.persistence.as_ref())?;

        if needs_save {
            self.save_records(&records)?;
        }
        let selected = valid_category(&records, stored_category.as_deref());
        if stored_category.as_deref() != Some(selected.as_str()) {
            self.save_selected_category(&selected)?;
        }

        debug!(quotes = records.len(), conflicts = conflicts.len(), "Loaded snapshot");
        self.records = records;
        self.engine = ReconciliationEngine::with_conflicts(conflicts);
        self.selected_category = selected;
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying record collection
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// All records in order
    pub fn all(&self) -> &[Record] {
        self.records.all()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.find_by_id(id)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    // ==================== Record Operations ====================

    /// Normalize partial input without storing it
    pub fn normalize(&self, raw: RawRecord) -> Option<Record> {
        self.records.normalize(raw)
    }

    /// Normalize and upsert a record
    pub fn upsert(&mut self, raw: RawRecord) -> Result<Record> {
        self.reload()?;
        let Some(record) = self.records.normalize(raw) else {
            bail!("Quote text and category are both required");
        };

        let mut records = self.records.clone();
        records.upsert_by_id(record.clone());
        self.commit(records, None)?;
        Ok(record)
    }

    /// Add a new quote
    pub fn add_quote(&mut self, text: &str, category: &str) -> Result<Record> {
        self.upsert(RawRecord::new(text, category))
    }

    /// Remove a quote by id
    pub fn remove(&mut self, id: &str) -> Result<Option<Record>> {
        self.reload()?;
        let mut records = self.records.clone();
        let removed = records.remove_by_id(id);
        if removed.is_some() {
            self.commit(records, None)?;
        }
        Ok(removed)
    }

    // ==================== Categories ====================

    /// Unique categories, sorted
    pub fn categories(&self) -> Vec<String> {
        self.records.categories()
    }

    pub fn selected_category(&self) -> &str {
        &self.selected_category
    }

    /// Select a category filter
    ///
    /// Anything that is neither `all` nor an existing category selects
    /// `all`. Returns the filter actually in effect.
    pub fn set_selected_category(&mut self, category: &str) -> Result<&str> {
        self.reload()?;
        let selected = valid_category(&self.records, Some(category.trim()));
        self.save_selected_category(&selected)?;
        self.selected_category = selected;
        Ok(&self.selected_category)
    }

    /// Records matching the selected category filter
    pub fn filtered(&self) -> Vec<&Record> {
        if self.selected_category == ALL_CATEGORIES {
            self.records.all().iter().collect()
        } else {
            self.records.in_category(&self.selected_category).collect()
        }
    }

    // ==================== Reconciliation ====================

    /// Pending conflicts from the last reconciliation pass
    pub fn conflicts(&self) -> &[Conflict] {
        self.engine.conflicts()
    }

    /// Look up a pending conflict
    pub fn conflict(&self, conflict_id: &str) -> Option<&Conflict> {
        self.engine.conflict(conflict_id)
    }

    /// Merge a batch of raw remote items into the store
    ///
    /// If saving fails the error is returned and the store keeps its
    /// previous records and conflicts.
    pub fn reconcile(&mut self, items: Vec<Value>) -> Result<ReconcileSummary> {
        self.reload()?;
        let raws = items
            .iter()
            .map(|item| to_raw_record(item, &self.config.remote_category))
            .collect();

        let mut records = self.records.clone();
        let mut engine = self.engine.clone();
        let summary = engine.reconcile(&mut records, raws);
        if summary.dropped > 0 {
            warn!(dropped = summary.dropped, "Dropped malformed remote items");
        }

        self.commit(records, Some(engine))?;
        Ok(summary)
    }

    /// Resolve a pending conflict
    ///
    /// Unknown ids are not an error; `None` is returned and nothing changes.
    pub fn resolve(&mut self, conflict_id: &str, resolution: Resolution) -> Result<Option<Conflict>> {
        self.reload()?;
        let mut records = self.records.clone();
        let mut engine = self.engine.clone();
        let resolved = engine.resolve(&mut records, conflict_id, resolution);
        if resolved.is_some() {
            self.commit(records, Some(engine))?;
        }
        Ok(resolved)
    }

    pub fn resolve_keep_local(&mut self, conflict_id: &str) -> Result<Option<Conflict>> {
        self.resolve(conflict_id, Resolution::KeepLocal)
    }

    pub fn resolve_keep_server(&mut self, conflict_id: &str) -> Result<Option<Conflict>> {
        self.resolve(conflict_id, Resolution::KeepServer)
    }

    // ==================== Import / Export ====================

    /// Import quotes from a JSON payload
    ///
    /// The batch is validated as a whole before anything is stored; a
    /// rejected payload surfaces an [`ImportError`](crate::ImportError).
    pub fn import_json(&mut self, payload: &str) -> Result<ImportSummary> {
        let raws = parse_import(payload)?;
        self.reload()?;

        let mut records = self.records.clone();
        let mut summary = ImportSummary::default();
        for raw in raws {
            let Some(record) = records.normalize(raw) else {
                continue;
            };
            match records.upsert_by_id(record) {
                Upsert::Inserted => summary.added += 1,
                Upsert::Replaced => summary.replaced += 1,
            }
        }

        self.commit(records, None)?;
        info!(
            added = summary.added,
            replaced = summary.replaced,
            "Imported quotes"
        );
        Ok(summary)
    }

    /// Export all quotes as pretty-printed JSON
    pub fn export_json(&self) -> Result<String> {
        export_json(self.records.all()).context("Failed to serialize quotes")
    }

    // ==================== Persistence ====================

    /// Save a new state, then adopt it
    ///
    /// The selected category falls back to `all` if it no longer exists.
    /// Nothing in memory changes unless every save succeeds.
    fn commit(&mut self, records: RecordStore, engine: Option<ReconciliationEngine>) -> Result<()> {
        self.save_records(&records)?;
        if let Some(ref engine) = engine {
            self.save_conflicts(engine)?;
        }

        let selected = valid_category(&records, Some(self.selected_category.as_str()));
        if selected != self.selected_category {
            info!(from = %self.selected_category, "Selected category is gone, showing all");
            self.save_selected_category(&selected)?;
        }

        self.records = records;
        if let Some(engine) = engine {
            self.engine = engine;
        }
        self.selected_category = selected;
        Ok(())
    }

    fn save_records(&self, records: &RecordStore) -> Result<()> {
        save_json(self.persistence.as_ref(), keys::QUOTES, records.all())
            .context("Failed to save quotes")
    }

    fn save_conflicts(&self, engine: &ReconciliationEngine) -> Result<()> {
        save_json(self.persistence.as_ref(), keys::CONFLICTS, engine.conflicts())
            .context("Failed to save pending conflicts")
    }

    fn save_selected_category(&self, category: &str) -> Result<()> {
        save_json(self.persistence.as_ref(), keys::SELECTED_CATEGORY, category)
            .context("Failed to save selected category")
    }
}

/// `candidate` if it is `all` or an existing category, else `all`
fn valid_category(records: &RecordStore, candidate: Option<&str>) -> String {
    match candidate {
        Some(c) if c == ALL_CATEGORIES || records.in_category(c).next().is_some() => c.to_string(),
        _ => ALL_CATEGORIES.to_string(),
    }
}

/// Load the quotes snapshot
///
/// Returns the records and whether the snapshot must be rewritten
/// (seeded defaults or ids assigned to legacy entries).
fn load_records(persistence: &dyn PersistenceAdapter) -> Result<(RecordStore, bool)> {
    let blob = persistence
        .load(keys::QUOTES)
        .context("Failed to load quotes")?;

    let mut records = RecordStore::new();
    let mut needs_save = false;

    if let Some(blob) = blob {
        match serde_json::from_str::<Vec<Value>>(&blob) {
            Ok(items) => {
                for item in items {
                    let Ok(raw) = serde_json::from_value::<RawRecord>(item) else {
                        continue;
                    };
                    needs_save |= !raw.has_id();
                    if let Some(record) = records.normalize(raw) {
                        records.upsert_by_id(record);
                    }
                }
            }
            Err(e) => {
                persistence
                    .save(keys::QUOTES_BACKUP, &blob)
                    .context("Failed to back up unreadable quotes snapshot")?;
                let err = StorageError::CorruptSnapshot {
                    key: keys::QUOTES.to_string(),
                    backup_key: keys::QUOTES_BACKUP.to_string(),
                    details: e.to_string(),
                };
                warn!("{}", err);
            }
        }
    }

    if records.is_empty() {
        info!("No saved quotes, seeding defaults");
        for record in default_quotes() {
            records.upsert_by_id(record);
        }
        needs_save = true;
    }

    Ok((records, needs_save))
}

fn load_conflicts(persistence: &dyn PersistenceAdapter) -> Result<Vec<Conflict>> {
    let Some(blob) = persistence
        .load(keys::CONFLICTS)
        .context("Failed to load pending conflicts")?
    else {
        return Ok(Vec::new());
    };

    Ok(serde_json::from_str(&blob).unwrap_or_else(|e| {
        warn!("Discarding unreadable pending conflicts: {}", e);
        Vec::new()
    }))
}

fn load_selected_category(persistence: &dyn PersistenceAdapter) -> Result<Option<String>> {
    let blob = persistence
        .load(keys::SELECTED_CATEGORY)
        .context("Failed to load selected category")?;
    Ok(blob.and_then(|b| serde_json::from_str::<String>(&b).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryPersistence, StorageResult};
    use crate::transfer::ImportError;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Memory persistence whose saves can be switched to fail
    #[derive(Default)]
    struct FlakyPersistence {
        inner: MemoryPersistence,
        failing: AtomicBool,
    }

    impl PersistenceAdapter for FlakyPersistence {
        fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::WriteError {
                    path: PathBuf::from(key),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk unplugged"),
                });
            }
            self.inner.save(key, blob)
        }

        fn load(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.load(key)
        }
    }

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    /// Store over shared memory persistence seeded with `quotes`
    fn store_with(quotes: Value) -> (Store, Arc<MemoryPersistence>) {
        let persistence =
            Arc::new(MemoryPersistence::new().with_blob(keys::QUOTES, &quotes.to_string()));
        let store =
            Store::open_with_persistence(Config::default(), Box::new(Arc::clone(&persistence)))
                .unwrap();
        (store, persistence)
    }

    fn saved_quotes(persistence: &MemoryPersistence) -> Vec<Record> {
        let blob = persistence.load(keys::QUOTES).unwrap().unwrap();
        serde_json::from_str(&blob).unwrap()
    }

    fn triples(store: &Store) -> Vec<(&str, &str, &str)> {
        store
            .all()
            .iter()
            .map(|r| (r.id.as_str(), r.text.as_str(), r.category.as_str()))
            .collect()
    }

    #[test]
    fn test_open_seeds_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open_with_config(test_config(&temp_dir)).unwrap();

        assert_eq!(store.count(), 5);
        assert_eq!(store.selected_category(), ALL_CATEGORIES);
        assert!(temp_dir.path().join("quotes.json").exists());
        assert!(temp_dir.path().join("selected_category.json").exists());
    }

    #[test]
    fn test_seeded_ids_stable_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let first: Vec<String> = Store::open_with_config(test_config(&temp_dir))
            .unwrap()
            .all()
            .iter()
            .map(|r| r.id.clone())
            .collect();
        let second: Vec<String> = Store::open_with_config(test_config(&temp_dir))
            .unwrap()
            .all()
            .iter()
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_legacy_snapshot_gets_ids() {
        let (store, persistence) = store_with(json!([
            {"text": "Old one", "category": "Legacy"},
            {"text": 12, "category": ["bad"]},
            "garbage"
        ]));

        assert_eq!(store.count(), 1);
        let record = &store.all()[0];
        assert!(record.id.starts_with("local-"));
        assert_eq!(saved_quotes(&persistence)[0].id, record.id);
    }

    #[test]
    fn test_corrupt_snapshot_is_backed_up() {
        let persistence = Arc::new(MemoryPersistence::new().with_blob(keys::QUOTES, "{not json"));
        let store =
            Store::open_with_persistence(Config::default(), Box::new(Arc::clone(&persistence)))
                .unwrap();

        assert_eq!(store.count(), 5);
        assert_eq!(
            persistence.load(keys::QUOTES_BACKUP).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_add_and_remove_persist() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let id = {
            let mut store = Store::open_with_config(config.clone()).unwrap();
            let record = store.add_quote("  Stay hungry ", " Life ").unwrap();
            assert_eq!(record.text, "Stay hungry");
            assert_eq!(record.category, "Life");
            record.id
        };

        let mut store = Store::open_with_config(config.clone()).unwrap();
        assert_eq!(store.count(), 6);
        assert!(store.get(&id).is_some());

        assert!(store.remove(&id).unwrap().is_some());
        assert!(store.remove(&id).unwrap().is_none());

        let store = Store::open_with_config(config).unwrap();
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_add_quote_requires_text_and_category() {
        let (mut store, _) = store_with(json!([{"id": "local-1", "text": "Hi", "category": "A"}]));
        assert!(store.add_quote("   ", "A").is_err());
        assert!(store.add_quote("Text", "").is_err());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_selected_category_validation() {
        let (mut store, persistence) = store_with(json!([
            {"id": "local-1", "text": "One", "category": "Life"},
            {"id": "local-2", "text": "Two", "category": "Art"}
        ]));

        assert_eq!(store.set_selected_category("Life").unwrap(), "Life");
        assert_eq!(store.filtered().len(), 1);
        assert_eq!(
            persistence.load(keys::SELECTED_CATEGORY).unwrap().as_deref(),
            Some("\"Life\"")
        );

        assert_eq!(store.set_selected_category("Nope").unwrap(), ALL_CATEGORIES);
        assert_eq!(store.filtered().len(), 2);
    }

    #[test]
    fn test_selected_category_falls_back_when_gone() {
        let (mut store, _) = store_with(json!([
            {"id": "local-1", "text": "One", "category": "Life"},
            {"id": "local-2", "text": "Two", "category": "Art"}
        ]));
        store.set_selected_category("Art").unwrap();

        store.remove("local-2").unwrap();
        assert_eq!(store.selected_category(), ALL_CATEGORIES);
    }

    #[test]
    fn test_categories() {
        let (store, _) = store_with(json!([
            {"id": "local-1", "text": "One", "category": "Life"},
            {"id": "local-2", "text": "Two", "category": "Art"},
            {"id": "local-3", "text": "Three", "category": "Life"}
        ]));
        assert_eq!(store.categories(), vec!["Art", "Life"]);
    }

    #[test]
    fn test_scenario_collision_then_keep_local() {
        let (mut store, persistence) =
            store_with(json!([{"id": "local-1", "text": "Hello", "category": "A"}]));

        let summary = store
            .reconcile(vec![json!({"id": "server-9", "text": "Hello", "category": "B"})])
            .unwrap();
        assert_eq!(summary.conflicts, 1);
        assert_eq!(triples(&store), vec![("server-9", "Hello", "B")]);
        assert_eq!(store.conflicts().len(), 1);
        assert_eq!(store.conflicts()[0].local.category, "A");
        assert_eq!(saved_quotes(&persistence)[0].id, "server-9");

        store.resolve_keep_local("server-9").unwrap().unwrap();
        assert_eq!(triples(&store), vec![("local-1", "Hello", "A")]);
        assert!(store.conflicts().is_empty());
        assert_eq!(saved_quotes(&persistence)[0].id, "local-1");
        assert_eq!(
            persistence.load(keys::CONFLICTS).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_scenario_identical_remote_is_noop() {
        let (mut store, _) = store_with(json!([{"id": "server-9", "text": "X", "category": "A"}]));
        let before = store.all().to_vec();

        let summary = store
            .reconcile(vec![json!({"id": "server-9", "text": "X", "category": "A"})])
            .unwrap();

        assert!(summary.is_noop());
        assert_eq!(summary.updated, 0);
        assert!(store.conflicts().is_empty());
        assert_eq!(store.all(), &before[..]);
    }

    #[test]
    fn test_scenario_blank_remote_dropped() {
        let (mut store, _) = store_with(json!([{"id": "local-1", "text": "Hello", "category": "A"}]));

        let summary = store
            .reconcile(vec![json!({"id": 3, "title": "    ", "category": "A"})])
            .unwrap();

        assert_eq!(summary.dropped, 1);
        assert_eq!(store.count(), 1);
        assert!(store.conflicts().is_empty());
    }

    #[test]
    fn test_remote_items_get_default_category() {
        let (mut store, _) = store_with(json!([{"id": "local-1", "text": "Hello", "category": "A"}]));

        store
            .reconcile(vec![json!({"id": 1, "userId": 1, "title": "sunt aut facere"})])
            .unwrap();

        let record = store.get("server-1").unwrap();
        assert_eq!(record.text, "sunt aut facere");
        assert_eq!(record.category, "Server");
    }

    #[test]
    fn test_conflicts_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        {
            let mut store = Store::open_with_config(config.clone()).unwrap();
            let text = store.all()[0].text.clone();
            store
                .reconcile(vec![json!({"id": 77, "text": text, "category": "Remote"})])
                .unwrap();
            assert_eq!(store.conflicts().len(), 1);
        }

        let mut store = Store::open_with_config(config).unwrap();
        assert_eq!(store.conflicts().len(), 1);
        let resolved = store.resolve_keep_server("server-77").unwrap().unwrap();
        assert!(store.get(&resolved.local.id).is_none());
        assert!(store.get("server-77").is_some());
        assert!(store.conflicts().is_empty());
    }

    #[test]
    fn test_resolve_unknown_conflict_is_noop() {
        let (mut store, _) = store_with(json!([{"id": "local-1", "text": "Hello", "category": "A"}]));
        assert!(store.resolve_keep_server("missing").unwrap().is_none());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_import_adds_and_replaces() {
        let (mut store, persistence) =
            store_with(json!([{"id": "local-1", "text": "Hello", "category": "A"}]));

        let summary = store
            .import_json(
                r#"[
                    {"text": "New one", "category": "B"},
                    {"id": "local-1", "text": "Hello again", "category": "A"},
                    {"text": "", "category": "B"}
                ]"#,
            )
            .unwrap();

        assert_eq!(summary, ImportSummary { added: 1, replaced: 1 });
        assert_eq!(store.count(), 2);
        assert_eq!(store.get("local-1").unwrap().text, "Hello again");
        assert_eq!(saved_quotes(&persistence).len(), 2);
    }

    #[test]
    fn test_import_rejects_whole_batch() {
        let (mut store, _) = store_with(json!([{"id": "local-1", "text": "Hello", "category": "A"}]));

        let err = store.import_json(r#"{"text": "x"}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::NotAnArray)
        ));

        let err = store.import_json(r#"[{"text": " "}]"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::NoValidQuotes)
        ));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_export_round_trips_through_import() {
        let (store, _) = store_with(json!([
            {"id": "local-1", "text": "Hello", "category": "A"},
            {"id": "server-2", "text": "World", "category": "B"}
        ]));
        let exported = store.export_json().unwrap();

        let (mut other, _) = store_with(json!([{"id": "local-9", "text": "Else", "category": "C"}]));
        let summary = other.import_json(&exported).unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(other.get("server-2").unwrap().text, "World");
    }

    #[test]
    fn test_second_store_keeps_other_writers_changes() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut watcher = Store::open_with_config(config.clone()).unwrap();
        let mut cli = Store::open_with_config(config.clone()).unwrap();

        let added = cli.add_quote("Added while watching", "Life").unwrap();
        watcher
            .reconcile(vec![json!({"id": 1, "title": "Remote"})])
            .unwrap();

        assert!(watcher.get(&added.id).is_some());
        let reopened = Store::open_with_config(config).unwrap();
        assert!(reopened.get(&added.id).is_some());
        assert!(reopened.get("server-1").is_some());
    }

    #[test]
    fn test_resolve_sees_conflict_raised_by_other_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut first = Store::open_with_config(config.clone()).unwrap();
        let mut second = Store::open_with_config(config).unwrap();
        let text = first.all()[0].text.clone();

        second
            .reconcile(vec![json!({"id": 5, "text": text, "category": "Remote"})])
            .unwrap();

        first.reload().unwrap();
        assert_eq!(first.conflict("server-5").unwrap().local.text, text);

        assert!(first.resolve_keep_local("server-5").unwrap().is_some());
        assert!(first.get("server-5").is_none());
        assert!(first.conflict("server-5").is_none());
        assert!(first.conflicts().is_empty());
    }

    #[test]
    fn test_failed_save_leaves_store_unchanged() {
        let persistence = Arc::new(FlakyPersistence {
            inner: MemoryPersistence::new().with_blob(
                keys::QUOTES,
                &json!([{"id": "local-1", "text": "Hello", "category": "A"}]).to_string(),
            ),
            failing: AtomicBool::new(false),
        });
        let mut store =
            Store::open_with_persistence(Config::default(), Box::new(Arc::clone(&persistence)))
                .unwrap();
        let before = store.all().to_vec();

        persistence.failing.store(true, Ordering::SeqCst);

        let err = store
            .reconcile(vec![json!({"id": 9, "text": "Hello", "category": "B"})])
            .unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.downcast_ref::<StorageError>().is_some()));
        assert_eq!(store.all(), &before[..]);
        assert!(store.conflicts().is_empty());

        assert!(store.add_quote("New", "B").is_err());
        assert!(store.import_json(r#"[{"text": "X", "category": "C"}]"#).is_err());
        assert_eq!(store.all(), &before[..]);

        persistence.failing.store(false, Ordering::SeqCst);
        let summary = store
            .reconcile(vec![json!({"id": 9, "text": "Hello", "category": "B"})])
            .unwrap();
        assert_eq!(summary.conflicts, 1);
        assert_eq!(store.all()[0].id, "server-9");
    }

    #[test]
    fn test_upsert_and_import_refresh_selected_category() {
        let (mut store, persistence) = store_with(json!([
            {"id": "local-1", "text": "One", "category": "Life"},
            {"id": "local-2", "text": "Two", "category": "Art"}
        ]));

        store.set_selected_category("Art").unwrap();
        store
            .upsert(RawRecord::with_id("local-2", "Two", "Life"))
            .unwrap();
        assert_eq!(store.selected_category(), ALL_CATEGORIES);
        assert_eq!(
            persistence.load(keys::SELECTED_CATEGORY).unwrap().as_deref(),
            Some("\"all\"")
        );

        store.set_selected_category("Life").unwrap();
        store
            .import_json(
                r#"[
                    {"id": "local-1", "text": "One", "category": "Music"},
                    {"id": "local-2", "text": "Two", "category": "Music"}
                ]"#,
            )
            .unwrap();
        assert_eq!(store.selected_category(), ALL_CATEGORIES);
    }
}
