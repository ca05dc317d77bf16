//! Label-scoped preview engine.
//!
//! The first change to touch an element captures its original state, whatever
//! the label. Every applied change is journaled, so removing one label
//! restores the shared original and re-applies what the other labels still
//! hold on that element. Markers go only once no label touches the element.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};
use variant_core_types::markers::{INSERTED_ATTR, LABEL_ATTR, MODIFIED_ATTR, ORIGINAL_ATTR, PREVIEW_MARKERS};
use variant_core_types::{ChangeKind, ClassOp, DomChange, InsertPosition};
use variant_page_dom::{Adjacent, Document, NodeId};

use crate::errors::PreviewError;
use crate::policy::PreviewPolicy;
use crate::sanitize::{is_safe_attribute, sanitize_html, sanitize_subtree};
use crate::snapshot::{ElementState, Snapshot};

/// Result of one `apply_change` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Mutated this many elements.
    Applied(usize),
    /// `enabled: false`; nothing captured, nothing touched.
    Disabled,
    /// Selector matched no element.
    NoMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: usize,
    /// Index in the batch and the error of each failed change.
    pub failed: Vec<(usize, PreviewError)>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemoveReport {
    /// Elements restored from an in-memory snapshot.
    pub restored: usize,
    /// Tool-created nodes taken out.
    pub removed: usize,
    /// Elements found by the marker sweep.
    pub swept: usize,
}

impl RemoveReport {
    pub fn is_noop(&self) -> bool {
        self.restored == 0 && self.removed == 0 && self.swept == 0
    }
}

#[derive(Debug, Clone, Default)]
struct LabelScope {
    /// Elements this label mutated, in first-touch order; reverted newest first.
    touched: Vec<NodeId>,
    created: Vec<NodeId>,
}

impl LabelScope {
    fn has_touched(&self, node: NodeId) -> bool {
        self.touched.contains(&node)
    }

    fn is_empty(&self) -> bool {
        self.touched.is_empty() && self.created.is_empty()
    }
}

/// One change as it landed on one element.
#[derive(Debug, Clone)]
struct AppliedChange {
    label: String,
    node: NodeId,
    change: DomChange,
    destination: Option<NodeId>,
    created: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct PreviewStateManager {
    policy: PreviewPolicy,
    /// State of each touched element before any label changed it.
    originals: BTreeMap<NodeId, Snapshot>,
    scopes: BTreeMap<String, LabelScope>,
    /// Every applied change across labels, oldest first.
    journal: Vec<AppliedChange>,
}

impl PreviewStateManager {
    pub fn new(policy: PreviewPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &PreviewPolicy {
        &self.policy
    }

    /// Labels with at least one touched element or created node.
    pub fn active_labels(&self) -> Vec<&str> {
        self.scopes.keys().map(String::as_str).collect()
    }

    pub fn is_active(&self, label: &str) -> bool {
        self.scopes.contains_key(label)
    }

    /// Number of elements `label` has changed.
    pub fn snapshot_count(&self, label: &str) -> usize {
        self.scopes.get(label).map_or(0, |scope| scope.touched.len())
    }

    /// Original state of `node`, if `label` has changed it.
    pub fn snapshot(&self, node: NodeId, label: &str) -> Option<&Snapshot> {
        if !self.scopes.get(label)?.has_touched(node) {
            return None;
        }
        self.originals.get(&node)
    }

    /// Apply a batch in order. A failing change is logged and recorded in the
    /// report; the rest of the batch still runs.
    pub fn apply_changes(&mut self, doc: &mut Document, changes: &[DomChange], label: &str) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (index, change) in changes.iter().enumerate() {
            match self.apply_change(doc, change, label) {
                Ok(ChangeOutcome::Applied(_)) => report.applied += 1,
                Ok(ChangeOutcome::Disabled | ChangeOutcome::NoMatch) => report.skipped += 1,
                Err(err) => {
                    warn!(index, selector = %change.selector, kind = %change.kind, error = %err, "change failed");
                    report.failed.push((index, err));
                }
            }
        }
        info!(
            label,
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed.len(),
            "preview applied"
        );
        report
    }

    pub fn apply_change(
        &mut self,
        doc: &mut Document,
        change: &DomChange,
        label: &str,
    ) -> Result<ChangeOutcome, PreviewError> {
        if label.is_empty() {
            return Err(PreviewError::EmptyLabel);
        }
        if !change.enabled {
            debug!(selector = %change.selector, kind = %change.kind, "change disabled; skipped");
            return Ok(ChangeOutcome::Disabled);
        }
        change.validate()?;
        self.check_safety(change)?;

        let targets = doc
            .query_all(&change.selector)
            .map_err(|err| PreviewError::invalid_selector(&change.selector, err))?;
        if targets.is_empty() {
            debug!(selector = %change.selector, "selector matched nothing");
            return Ok(ChangeOutcome::NoMatch);
        }
        let destination = match change.kind {
            ChangeKind::Move => Some(self.move_destination(doc, change)?),
            _ => None,
        };

        let mut applied = 0;
        for node in targets {
            if !doc.is_connected(node) {
                // An earlier match in this batch (e.g. a duplicate) displaced it.
                continue;
            }
            self.ensure_snapshot(doc, node, label)?;
            let created = self.mutate(doc, node, change, destination)?;
            for copy in &created {
                self.track_created(doc, *copy, label)?;
            }
            self.journal.push(AppliedChange {
                label: label.to_string(),
                node,
                change: change.clone(),
                destination,
                created,
            });
            applied += 1;
        }
        debug!(selector = %change.selector, kind = %change.kind, applied, label, "change applied");
        Ok(ChangeOutcome::Applied(applied))
    }

    fn check_safety(&self, change: &DomChange) -> Result<(), PreviewError> {
        if !self.policy.sanitize_html || change.kind != ChangeKind::Attribute {
            return Ok(());
        }
        let properties = change.value.as_properties().into_iter().flatten();
        for (name, value) in properties {
            if !is_safe_attribute(name, value) {
                return Err(PreviewError::Unsafe(format!("attribute '{name}'")));
            }
            if PREVIEW_MARKERS.contains(&name.as_str()) {
                return Err(PreviewError::Unsafe(format!("reserved attribute '{name}'")));
            }
        }
        Ok(())
    }

    fn move_destination(&self, doc: &Document, change: &DomChange) -> Result<NodeId, PreviewError> {
        let selector = change.target_selector.as_deref().unwrap_or_default();
        doc.query_one(selector)
            .map_err(|err| PreviewError::invalid_selector(selector, err))?
            .ok_or_else(|| PreviewError::missing_target(selector))
    }

    /// Capture once per element; the original stays until no label touches
    /// the element any more.
    fn ensure_snapshot(&mut self, doc: &mut Document, node: NodeId, label: &str) -> Result<(), PreviewError> {
        if !self.originals.contains_key(&node) {
            let snapshot = Snapshot::capture(doc, node)?;
            if self.policy.write_original_data && !doc.has_attr(node, ORIGINAL_ATTR) {
                match snapshot.state.to_json() {
                    Ok(json) => doc.set_attr(node, ORIGINAL_ATTR, &json)?,
                    Err(err) => warn!(%node, error = %err, "could not serialize original state"),
                }
            }
            self.originals.insert(node, snapshot);
        }
        let scope = self.scopes.entry(label.to_string()).or_default();
        if !scope.has_touched(node) {
            scope.touched.push(node);
        }
        doc.set_attr(node, MODIFIED_ATTR, "true")?;
        doc.set_attr(node, LABEL_ATTR, label)?;
        Ok(())
    }

    /// Apply `change` to `node`; returns the nodes it created.
    fn mutate(
        &self,
        doc: &mut Document,
        node: NodeId,
        change: &DomChange,
        destination: Option<NodeId>,
    ) -> Result<Vec<NodeId>, PreviewError> {
        let text = change.value.as_text().unwrap_or_default();
        match change.kind {
            ChangeKind::Text => doc.set_text_content(node, text)?,
            ChangeKind::Html => {
                let html = self.clean(text);
                doc.set_inner_html(node, &html)?;
            }
            ChangeKind::Style => {
                for (property, value) in change.value.as_properties().into_iter().flatten() {
                    doc.set_style_property(node, property, value)?;
                }
            }
            ChangeKind::Class => {
                let class_name = change.class_name.as_deref().unwrap_or_default();
                match change.class_op()? {
                    ClassOp::Add => doc.add_class(node, class_name)?,
                    ClassOp::Remove => doc.remove_class(node, class_name)?,
                };
            }
            ChangeKind::Attribute => {
                for (name, value) in change.value.as_properties().into_iter().flatten() {
                    doc.set_attr(node, name, value)?;
                }
            }
            ChangeKind::Delete => {
                if self.policy.mimic_delete {
                    doc.set_style_property(node, "display", "none")?;
                } else {
                    doc.detach(node)?;
                }
            }
            ChangeKind::Move => {
                if let Some(destination) = destination.filter(|d| *d != node) {
                    let position = change.position.unwrap_or(InsertPosition::After);
                    doc.insert_adjacent(destination, adjacent_for(position), node)?;
                }
            }
            ChangeKind::Insert => {
                let position = change.position.unwrap_or(InsertPosition::After);
                let nodes = doc.import_fragment(text);
                let holder = doc.create_element("template");
                for created in &nodes {
                    doc.append_child(holder, *created)?;
                }
                if self.policy.sanitize_html {
                    sanitize_subtree(doc, holder);
                }
                let nodes = doc.children(holder).to_vec();
                self.place_created(doc, node, position, &nodes)?;
                return Ok(nodes);
            }
            ChangeKind::Duplicate => {
                let copy = doc.deep_clone(node)?;
                for marker in [MODIFIED_ATTR, ORIGINAL_ATTR] {
                    doc.remove_attr(copy, marker)?;
                }
                doc.insert_adjacent(node, Adjacent::AfterEnd, copy)?;
                return Ok(vec![copy]);
            }
        }
        Ok(Vec::new())
    }

    /// Re-run a journaled change after its element was reset to the original.
    /// Nodes it created the first time are moved back into place, not rebuilt.
    fn replay(&self, doc: &mut Document, entry: &AppliedChange) -> Result<(), PreviewError> {
        match entry.change.kind {
            ChangeKind::Insert => {
                let position = entry.change.position.unwrap_or(InsertPosition::After);
                self.place_created(doc, entry.node, position, &entry.created)
            }
            ChangeKind::Duplicate => {
                for copy in &entry.created {
                    doc.insert_adjacent(entry.node, Adjacent::AfterEnd, *copy)?;
                }
                Ok(())
            }
            _ => self
                .mutate(doc, entry.node, &entry.change, entry.destination)
                .map(drop),
        }
    }

    fn clean(&self, html: &str) -> String {
        if self.policy.sanitize_html {
            sanitize_html(html)
        } else {
            html.to_string()
        }
    }

    /// Insert `nodes` in order at `position` relative to `anchor`.
    fn place_created(
        &self,
        doc: &mut Document,
        anchor: NodeId,
        position: InsertPosition,
        nodes: &[NodeId],
    ) -> Result<(), PreviewError> {
        let mut previous: Option<NodeId> = None;
        for node in nodes {
            match (position, previous) {
                (InsertPosition::Before, _) => doc.insert_adjacent(anchor, Adjacent::BeforeBegin, *node)?,
                (InsertPosition::Append, _) => doc.insert_adjacent(anchor, Adjacent::BeforeEnd, *node)?,
                (InsertPosition::After, None) => doc.insert_adjacent(anchor, Adjacent::AfterEnd, *node)?,
                (InsertPosition::Prepend, None) => doc.insert_adjacent(anchor, Adjacent::AfterBegin, *node)?,
                (_, Some(prev)) => doc.insert_adjacent(prev, Adjacent::AfterEnd, *node)?,
            }
            previous = Some(*node);
        }
        Ok(())
    }

    fn track_created(&mut self, doc: &mut Document, node: NodeId, label: &str) -> Result<(), PreviewError> {
        if doc.is_element(node) {
            doc.set_attr(node, INSERTED_ATTR, "true")?;
            doc.set_attr(node, LABEL_ATTR, label)?;
        }
        self.scopes
            .entry(label.to_string())
            .or_default()
            .created
            .push(node);
        Ok(())
    }

    /// Revert everything applied under `label`. Calling it again, or for a
    /// label that was never applied, changes nothing. Elements other labels
    /// also changed keep those labels' changes.
    pub fn remove_changes(&mut self, doc: &mut Document, label: &str) -> RemoveReport {
        let mut report = RemoveReport::default();
        if let Some(scope) = self.scopes.remove(label) {
            self.journal.retain(|entry| entry.label != label);
            for node in scope.created.iter().rev() {
                if doc.parent(*node).is_some() && doc.detach(*node).is_ok() {
                    report.removed += 1;
                }
            }
            self.forget_created(doc, &scope.created);
            for node in scope.touched.iter().rev() {
                if self.revert_element(doc, *node, label) {
                    report.restored += 1;
                }
            }
        }
        report.swept = self.sweep(doc, label);
        if report.is_noop() {
            debug!(label, "nothing to revert");
        } else {
            info!(
                label,
                restored = report.restored,
                removed = report.removed,
                swept = report.swept,
                "preview reverted"
            );
        }
        report
    }

    /// Reset `node` to its original state, then re-apply what other labels
    /// still hold on it. Returns whether the original was restored.
    fn revert_element(&mut self, doc: &mut Document, node: NodeId, label: &str) -> bool {
        let restored = match self.originals.get(&node) {
            Some(original) => original.restore(doc, node),
            None => return false,
        };
        if let Err(err) = &restored {
            warn!(%node, label, error = %err, "could not restore element");
        }

        let remaining: Vec<AppliedChange> = self
            .journal
            .iter()
            .filter(|entry| entry.node == node)
            .cloned()
            .collect();
        match remaining.last() {
            None => {
                self.originals.remove(&node);
                strip_markers(doc, node);
            }
            Some(latest) => {
                for entry in &remaining {
                    if let Err(err) = self.replay(doc, entry) {
                        warn!(%node, label = %entry.label, error = %err, "could not re-apply change");
                    }
                }
                let _ = doc.set_attr(node, LABEL_ATTR, &latest.label);
                debug!(%node, removed = label, kept = %latest.label, "element still previewed");
            }
        }
        restored.is_ok()
    }

    /// Drop every record about nodes a removed label created; they are no
    /// longer part of the page.
    fn forget_created(&mut self, doc: &Document, created: &[NodeId]) {
        if created.is_empty() {
            return;
        }
        let gone: BTreeSet<NodeId> = created
            .iter()
            .flat_map(|node| std::iter::once(*node).chain(doc.descendants(*node)))
            .collect();
        self.journal.retain(|entry| !gone.contains(&entry.node));
        self.originals.retain(|node, _| !gone.contains(node));
        for scope in self.scopes.values_mut() {
            scope.touched.retain(|node| !gone.contains(node));
        }
        self.scopes.retain(|_, scope| !scope.is_empty());
    }

    /// Best-effort cleanup of labelled elements this instance has no snapshot
    /// for, e.g. left behind by an earlier manager.
    fn sweep(&self, doc: &mut Document, label: &str) -> usize {
        let leftovers: Vec<NodeId> = doc
            .all_elements()
            .into_iter()
            .filter(|node| doc.attr(*node, LABEL_ATTR) == Some(label))
            .collect();
        let mut swept = 0;
        for node in leftovers {
            if !doc.is_connected(node) {
                continue;
            }
            swept += 1;
            if doc.has_attr(node, INSERTED_ATTR) {
                let _ = doc.detach(node);
                continue;
            }
            let original = doc
                .attr(node, ORIGINAL_ATTR)
                .map(ElementState::from_json);
            match original {
                Some(Ok(state)) => {
                    if let Err(err) = state
                        .restore_attributes(doc, node)
                        .and_then(|()| state.restore_content(doc, node))
                    {
                        warn!(%node, label, error = %err, "could not restore swept element");
                    }
                }
                Some(Err(err)) => warn!(%node, label, error = %err, "unreadable original data"),
                None => debug!(%node, label, "no original data; stripping markers only"),
            }
            strip_markers(doc, node);
        }
        swept
    }
}

fn strip_markers(doc: &mut Document, node: NodeId) {
    for marker in PREVIEW_MARKERS {
        let _ = doc.remove_attr(node, marker);
    }
}

fn adjacent_for(position: InsertPosition) -> Adjacent {
    match position {
        InsertPosition::Before => Adjacent::BeforeBegin,
        InsertPosition::After => Adjacent::AfterEnd,
        InsertPosition::Prepend => Adjacent::AfterBegin,
        InsertPosition::Append => Adjacent::BeforeEnd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn disabled_change_is_not_captured() {
        let mut doc = Document::parse(r#"<p id="p">x</p>"#);
        let mut manager = PreviewStateManager::default();
        let outcome = manager
            .apply_change(&mut doc, &DomChange::text("#p", "y").disabled(), "exp")
            .unwrap();
        assert_eq!(outcome, ChangeOutcome::Disabled);
        assert_eq!(manager.snapshot_count("exp"), 0);
        assert!(!manager.is_active("exp"));
    }

    #[test]
    fn snapshot_is_taken_once_per_label() {
        let mut doc = Document::parse(r#"<p id="p">one</p>"#);
        let p = doc.query_one("#p").unwrap().unwrap();
        let mut manager = PreviewStateManager::default();
        manager.apply_change(&mut doc, &DomChange::text("#p", "two"), "exp").unwrap();
        manager.apply_change(&mut doc, &DomChange::text("#p", "three"), "exp").unwrap();
        assert_eq!(manager.snapshot_count("exp"), 1);
        assert_eq!(manager.snapshot(p, "exp").unwrap().state.text_content, "one");
        assert_eq!(doc.attr(p, LABEL_ATTR), Some("exp"));
    }

    #[test]
    fn unmatched_and_invalid_selectors() {
        let mut doc = Document::parse("<p>x</p>");
        let mut manager = PreviewStateManager::default();
        assert_eq!(
            manager.apply_change(&mut doc, &DomChange::delete("#missing"), "exp"),
            Ok(ChangeOutcome::NoMatch)
        );
        assert!(matches!(
            manager.apply_change(&mut doc, &DomChange::delete("p::before"), "exp"),
            Err(PreviewError::InvalidSelector { .. })
        ));
        assert_eq!(
            manager.apply_change(&mut doc, &DomChange::delete("p"), ""),
            Err(PreviewError::EmptyLabel)
        );
    }

    #[test]
    fn unsafe_attribute_is_refused() {
        let mut doc = Document::parse(r#"<a id="link" href="/">x</a>"#);
        let mut manager = PreviewStateManager::default();
        let err = manager
            .apply_change(&mut doc, &DomChange::attribute("#link", "onclick", "steal()"), "exp")
            .unwrap_err();
        assert!(matches!(err, PreviewError::Unsafe(_)));
        assert!(!doc.to_html().contains("onclick"));
    }

    #[test]
    fn real_delete_is_reinserted_on_revert() {
        let mut doc = Document::parse(r#"<ul><li id="a">A</li><li id="b">B</li></ul>"#);
        let before = doc.to_html();
        let mut manager = PreviewStateManager::new(PreviewPolicy {
            mimic_delete: false,
            ..PreviewPolicy::default()
        });
        manager.apply_change(&mut doc, &DomChange::delete("#a"), "exp").unwrap();
        assert!(doc.query_one("#a").unwrap().is_none());
        manager.remove_changes(&mut doc, "exp");
        assert_eq!(doc.to_html(), before);
    }
}
