//! In-memory record collection
//!
//! An ordered list of records plus an id index kept in step with it.
//! Order is insertion order; replacing a record keeps its position.

use std::collections::{BTreeSet, HashMap};

use crate::models::{generate_id, Origin, RawRecord, Record};

/// What `upsert_by_id` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No record had this id; it was appended
    Inserted,
    /// A record with this id was replaced in place
    Replaced,
}

/// Ordered collection of records keyed by id
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    /// id -> position in `records`
    index: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, later duplicates replacing earlier ones
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.upsert_by_id(record);
        }
        store
    }

    /// Replace the record with the same id, or append it
    pub fn upsert_by_id(&mut self, record: Record) -> Upsert {
        match self.index.get(&record.id) {
            Some(&pos) => {
                self.records[pos] = record;
                Upsert::Replaced
            }
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                Upsert::Inserted
            }
        }
    }

    /// Remove the record with this id, if any
    pub fn remove_by_id(&mut self, id: &str) -> Option<Record> {
        let pos = self.index.remove(id)?;
        let removed = self.records.remove(pos);
        for record in &self.records[pos..] {
            if let Some(slot) = self.index.get_mut(&record.id) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// First record with exactly this text whose id is not `excluding_id`
    pub fn find_by_text(&self, text: &str, excluding_id: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.text == text && r.id != excluding_id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All records in order
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Normalize partial input into a record ready for `upsert_by_id`
    ///
    /// Like [`Record::from_raw`] with a local origin, except that a
    /// generated id is also guaranteed not to clash with one already here.
    /// A supplied id is kept as-is so that upserting it replaces.
    pub fn normalize(&self, raw: RawRecord) -> Option<Record> {
        let generated = !raw.has_id();
        let mut record = Record::from_raw(raw, Origin::Local)?;
        while generated && self.contains(&record.id) {
            record.id = generate_id(Origin::Local);
        }
        Some(record)
    }

    /// Unique categories, sorted
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.category.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Records tagged with `category`
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Record> {
        self.records.iter().filter(move |r| r.category == category)
    }
}
