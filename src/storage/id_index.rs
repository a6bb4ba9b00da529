//! In-memory index of record ids already present in the dataset

use std::collections::HashSet;

/// Set of stored record ids
///
/// Rebuilt from the record store at startup and never persisted on its own; the
/// dataset file stays authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdIndex {
    ids: HashSet<i64>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Marks `id` as stored; returns false if it already was
    pub fn insert(&mut self, id: i64) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<i64> for IdIndex {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<i64> for IdIndex {
    fn extend<T: IntoIterator<Item = i64>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}
