//! Ordered change list of an editing session with undo history.

use tracing::{debug, warn};
use variant_core_types::{ChangeKind, ChangeSet, DomChange, UpsertOutcome};
use variant_page_dom::Document;

use crate::inverse::InverseOp;

#[derive(Debug, Clone)]
struct HistoryEntry {
    selector: String,
    kind: ChangeKind,
    /// Record the new change merged into or replaced, if any.
    replaced: Option<DomChange>,
    inverse: InverseOp,
}

/// Change list plus the history needed to undo each recorded edit.
///
/// Seeded changes (handed in when the session starts) are part of the list
/// but not of the history: undo only walks back edits made in this session,
/// while [`ChangeTracker::clear_all`] empties the list entirely.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    changes: ChangeSet,
    history: Vec<HistoryEntry>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed<I>(&mut self, changes: I)
    where
        I: IntoIterator<Item = DomChange>,
    {
        for change in changes {
            self.changes.upsert(change);
        }
    }

    /// Merge-or-append `change`, remembering how to revert the page.
    pub fn record(&mut self, change: DomChange, inverse: InverseOp) -> UpsertOutcome {
        let replaced = self
            .changes
            .position(&change.selector, change.kind)
            .and_then(|idx| self.changes.get(idx).cloned());
        let entry = HistoryEntry {
            selector: change.selector.clone(),
            kind: change.kind,
            replaced,
            inverse,
        };
        let outcome = self.changes.upsert(change);
        debug!(
            selector = %entry.selector,
            kind = %entry.kind,
            merged = matches!(outcome, UpsertOutcome::Merged(_)),
            "change recorded"
        );
        self.history.push(entry);
        outcome
    }

    /// Undo the latest edit: revert the page, then restore the list to what
    /// it was before that edit. Returns the record that was undone.
    pub fn undo_last(&mut self, doc: &mut Document) -> Option<DomChange> {
        let entry = self.history.pop()?;
        if let Err(err) = entry.inverse.apply(doc) {
            warn!(selector = %entry.selector, error = %err, "could not revert page for undo");
        }
        let idx = self.changes.position(&entry.selector, entry.kind)?;
        match entry.replaced {
            Some(previous) => self.changes.replace(idx, previous),
            None => self.changes.remove(idx),
        }
    }

    /// Undo every session edit newest first, then drop seeded records too.
    pub fn clear_all(&mut self, doc: &mut Document) -> usize {
        let mut undone = 0;
        while !self.history.is_empty() {
            self.undo_last(doc);
            undone += 1;
        }
        self.changes.clear();
        undone
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn to_vec(&self) -> Vec<DomChange> {
        self.changes.to_vec()
    }
}
