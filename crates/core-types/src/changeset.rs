//! Ordered change list with the `(selector, type)` merge rule.

use serde::{Deserialize, Serialize};

use crate::change::{ChangeKind, DomChange};

/// What `ChangeSet::upsert` did with the incoming record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Appended(usize),
    Merged(usize),
}

impl UpsertOutcome {
    pub fn index(&self) -> usize {
        match self {
            UpsertOutcome::Appended(idx) | UpsertOutcome::Merged(idx) => *idx,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Vec<DomChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from an arbitrary list, folding duplicates in order.
    pub fn from_changes<I>(changes: I) -> Self
    where
        I: IntoIterator<Item = DomChange>,
    {
        let mut set = Self::new();
        for change in changes {
            set.upsert(change);
        }
        set
    }

    /// Merge into the existing record for the same key, or append.
    pub fn upsert(&mut self, change: DomChange) -> UpsertOutcome {
        match self.changes.iter().position(|c| c.same_key(&change)) {
            Some(idx) => {
                self.changes[idx].merge_from(change);
                UpsertOutcome::Merged(idx)
            }
            None => {
                self.changes.push(change);
                UpsertOutcome::Appended(self.changes.len() - 1)
            }
        }
    }

    /// Index of the record holding `(selector, kind)`.
    pub fn position(&self, selector: &str, kind: ChangeKind) -> Option<usize> {
        self.changes.iter().position(|c| c.key() == (selector, kind))
    }

    /// Swap the record at `index` for `change`, returning the old one.
    pub fn replace(&mut self, index: usize, change: DomChange) -> Option<DomChange> {
        self.changes
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, change))
    }

    pub fn pop(&mut self) -> Option<DomChange> {
        self.changes.pop()
    }

    pub fn remove(&mut self, index: usize) -> Option<DomChange> {
        (index < self.changes.len()).then(|| self.changes.remove(index))
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DomChange> {
        self.changes.get(index)
    }

    pub fn as_slice(&self) -> &[DomChange] {
        &self.changes
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomChange> {
        self.changes.iter()
    }

    pub fn to_vec(&self) -> Vec<DomChange> {
        self.changes.clone()
    }

    pub fn into_vec(self) -> Vec<DomChange> {
        self.changes
    }
}
