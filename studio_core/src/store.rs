//! Keyed entity storage.
//!
//! The core only talks to storage through [`Repository`]. Every write is a
//! single-key upsert with last-write-wins semantics; there are no version
//! tokens and no cross-record transactions.

use crate::Result;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A record kind that can live in a repository
pub trait Entity: Clone {
    /// Creation input, without an id
    type Draft;
    /// Partial update; absent fields keep their stored value
    type Patch;
    /// Human readable kind, used in logs and not-found errors
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn from_draft(id: String, draft: Self::Draft) -> Self;
    fn apply(&mut self, patch: Self::Patch);

    /// Checked on create and on the merged record of every update
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Generic keyed store for one entity kind.
///
/// Reads of unknown ids return `None`; updating an unknown id returns
/// `Ok(None)` and deleting one returns `false`.
pub trait Repository<T: Entity> {
    fn get(&self, id: &str) -> Option<T>;
    fn list(&self) -> Vec<T>;
    fn create(&mut self, draft: T::Draft) -> Result<T>;
    fn update(&mut self, id: &str, patch: T::Patch) -> Result<Option<T>>;
    fn delete(&mut self, id: &str) -> bool;
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// In-memory repository ordered by id
#[derive(Clone, Debug)]
pub struct MemoryRepository<T> {
    items: BTreeMap<String, T>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from existing records, keyed by their own ids
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| (item.id().to_string(), item))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }
}

impl<T: Entity> Repository<T> for MemoryRepository<T> {
    fn get(&self, id: &str) -> Option<T> {
        self.items.get(id).cloned()
    }

    fn list(&self) -> Vec<T> {
        self.items.values().cloned().collect()
    }

    fn create(&mut self, draft: T::Draft) -> Result<T> {
        let item = T::from_draft(new_id(), draft);
        item.validate()?;
        self.items.insert(item.id().to_string(), item.clone());
        tracing::info!("Created {} {}", T::KIND, item.id());
        Ok(item)
    }

    fn update(&mut self, id: &str, patch: T::Patch) -> Result<Option<T>> {
        let Some(existing) = self.items.get(id) else {
            tracing::debug!("Update of unknown {} {}", T::KIND, id);
            return Ok(None);
        };

        let mut updated = existing.clone();
        updated.apply(patch);
        updated.validate()?;
        self.items.insert(id.to_string(), updated.clone());
        tracing::info!("Updated {} {}", T::KIND, id);
        Ok(Some(updated))
    }

    fn delete(&mut self, id: &str) -> bool {
        let removed = self.items.remove(id).is_some();
        if removed {
            tracing::info!("Deleted {} {}", T::KIND, id);
        }
        removed
    }
}
