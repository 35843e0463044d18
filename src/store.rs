//! Local copy of the user collection.
//!
//! Holds the result of the most recent successful list fetch. The only
//! in-place edit is removing a record after a confirmed delete; every other
//! change arrives through a full replacement.

use crate::api::User;

#[derive(Clone, Debug, Default)]
pub struct UserStore {
    records: Vec<User>,
    fetched: bool,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a fresh list result.
    pub fn replace_all(&mut self, records: Vec<User>) {
        tracing::debug!(count = records.len(), "cache replaced");
        self.records = records;
        self.fetched = true;
    }

    /// Drop the record with `id`. Returns whether anything was removed;
    /// an absent id leaves the cache untouched.
    pub fn remove_by_id(&mut self, id: u64) -> bool {
        let before = self.records.len();
        self.records.retain(|u| u.id != id);
        let removed = self.records.len() != before;
        if !removed {
            tracing::debug!(id, "delete confirmed for id not in cache");
        }
        removed
    }

    pub fn records(&self) -> &[User] {
        &self.records
    }

    pub fn get(&self, id: u64) -> Option<&User> {
        self.records.iter().find(|u| u.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a list fetch has ever succeeded. Mutating panels stay locked until it has.
    pub fn has_fetched(&self) -> bool {
        self.fetched
    }
}
