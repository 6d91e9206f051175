//! Canon store - entries by id with a tag index.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{CanonEntry, Tag};

/// The long-term canon store.
///
/// Serialized as a plain list of entries; the tag index is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CanonEntry>", into = "Vec<CanonEntry>")]
pub struct CanonStore {
    /// All entries stored by ID.
    entries: BTreeMap<String, CanonEntry>,

    /// Index: Tag -> entries carrying this tag.
    tag_index: BTreeMap<Tag, BTreeSet<String>>,
}

impl CanonStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any entry with the same id.
    pub fn add_entry(&mut self, entry: CanonEntry) -> Option<CanonEntry> {
        let previous = self.remove_entry(&entry.id);

        for tag in &entry.tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(entry.id.clone());
        }
        self.entries.insert(entry.id.clone(), entry);

        previous
    }

    /// Remove an entry from the store.
    pub fn remove_entry(&mut self, id: &str) -> Option<CanonEntry> {
        let entry = self.entries.remove(id)?;
        for tag in &entry.tags {
            if let Some(ids) = self.tag_index.get_mut(tag) {
                ids.remove(id);
                if ids.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        Some(entry)
    }

    /// Get entry by ID.
    pub fn get(&self, id: &str) -> Option<&CanonEntry> {
        self.entries.get(id)
    }

    /// Get all entries associated with a tag.
    pub fn entries_by_tag(&self, tag: &Tag) -> Vec<&CanonEntry> {
        self.tag_index
            .get(tag)
            .map(|ids| ids.iter().filter_map(|id| self.entries.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get all entries, in id order.
    pub fn entries(&self) -> impl Iterator<Item = &CanonEntry> {
        self.entries.values()
    }

    /// Check if a tag is used by any entry.
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tag_index.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<CanonEntry>> for CanonStore {
    fn from(entries: Vec<CanonEntry>) -> Self {
        let mut store = CanonStore::new();
        for entry in entries {
            store.add_entry(entry);
        }
        store
    }
}

impl From<CanonStore> for Vec<CanonEntry> {
    fn from(store: CanonStore) -> Self {
        store.entries.into_values().collect()
    }
}
