//! Visual editing session: Stopped -> Started -> {selected <-> menu open} -> Stopped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use variant_core_types::markers::{is_marker_attr, EDITABLE_ATTR, EDITOR_MARKERS, HOVER_ATTR, SELECTED_ATTR};
use variant_core_types::{ClassOp, DomChange, InsertPosition, SessionId};
use variant_page_dom::{
    Adjacent, DomEvent, Document, EventKind, EventOutcome, ListenerId, NodeId,
};
use variant_selector::{is_extension_owned, SelectorGenerator};

use crate::actions::{EditorAction, InsertBlock, MenuCommand, ToolbarAction};
use crate::chrome::EditorChrome;
use crate::errors::EditorError;
use crate::inverse::InverseOp;
use crate::menu::ActionMenu;
use crate::tracker::ChangeTracker;

/// Receives the full change list after every edit and on save. This is the
/// only way session data leaves before the session stops.
pub type ChangesCallback = Box<dyn FnMut(&[DomChange]) + Send>;

const CAPTURED_EVENTS: [EventKind; 7] = [
    EventKind::Click,
    EventKind::ContextMenu,
    EventKind::KeyDown,
    EventKind::MouseDown,
    EventKind::MouseUp,
    EventKind::MouseOver,
    EventKind::MouseOut,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorState {
    Stopped,
    Started,
}

/// What an event or toolbar action did, for the host to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorResponse {
    pub outcome: EventOutcome,
    /// The change list changed (the callback has already seen it).
    pub changed: bool,
    /// A menu entry needs input from the user before it can run.
    pub input_requested: Option<MenuCommand>,
    /// The session stopped; this is its final change list.
    pub completed: Option<Vec<DomChange>>,
}

impl EditorResponse {
    fn consumed() -> Self {
        Self {
            outcome: EventOutcome::consumed(),
            ..Self::default()
        }
    }
}

pub struct VisualEditor {
    session: SessionId,
    variant_name: String,
    generator: Arc<SelectorGenerator>,
    state: EditorState,
    tracker: ChangeTracker,
    chrome: Option<EditorChrome>,
    menu: Option<ActionMenu>,
    menu_generation: u64,
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
    listeners: Vec<ListenerId>,
    on_change: Option<ChangesCallback>,
    clipboard: Option<String>,
    live: Arc<AtomicBool>,
}

impl fmt::Debug for VisualEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualEditor")
            .field("session", &self.session)
            .field("variant_name", &self.variant_name)
            .field("state", &self.state)
            .field("changes", &self.tracker.len())
            .field("selected", &self.selected)
            .finish()
    }
}

impl VisualEditor {
    pub fn new(generator: Arc<SelectorGenerator>, variant_name: impl Into<String>) -> Self {
        Self {
            session: SessionId::new(),
            variant_name: variant_name.into(),
            generator,
            state: EditorState::Stopped,
            tracker: ChangeTracker::new(),
            chrome: None,
            menu: None,
            menu_generation: 0,
            selected: None,
            hovered: None,
            listeners: Vec::new(),
            on_change: None,
            clipboard: None,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub fn variant_name(&self) -> &str {
        &self.variant_name
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EditorState::Started
    }

    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }

    pub fn listener_owner(&self) -> String {
        format!("editor:{}", self.session)
    }

    pub fn changes(&self) -> &[DomChange] {
        self.tracker.changes().as_slice()
    }

    pub fn change_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu.is_some()
    }

    pub fn chrome(&self) -> Option<&EditorChrome> {
        self.chrome.as_ref()
    }

    /// Last value written by a copy action.
    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    // ----- lifecycle --------------------------------------------------------

    /// Start editing. `initial` seeds the change list (those changes are
    /// assumed to be previewed already). A second call while started is a
    /// no-op.
    pub fn start(
        &mut self,
        doc: &mut Document,
        initial: Vec<DomChange>,
        on_change: ChangesCallback,
    ) -> Result<(), EditorError> {
        if self.is_active() {
            debug!(session = %self.session, "editor already started");
            return Ok(());
        }
        self.tracker.seed(initial);
        let chrome = EditorChrome::mount(doc, &self.session, self.tracker.len())?;

        let prefix = self.generator.policy().reserved_prefix.clone();
        if let Some(body) = doc.body() {
            for node in doc.descendants(body) {
                if !is_extension_owned(doc, node, &prefix) {
                    doc.set_attr(node, EDITABLE_ATTR, "")?;
                }
            }
        }

        let owner = self.listener_owner();
        self.listeners = CAPTURED_EVENTS
            .iter()
            .map(|kind| doc.listeners_mut().add(&owner, *kind, true))
            .collect();
        self.chrome = Some(chrome);
        self.on_change = Some(on_change);
        self.state = EditorState::Started;
        self.live.store(true, Ordering::SeqCst);
        info!(
            session = %self.session,
            variant = %self.variant_name,
            seeded = self.tracker.len(),
            "visual editor started"
        );
        Ok(())
    }

    /// Reverse every start-time effect and hand back the final change list.
    /// Returns `None` when already stopped, so the list is flushed once.
    pub fn stop(&mut self, doc: &mut Document) -> Option<Vec<DomChange>> {
        if !self.is_active() {
            return None;
        }
        self.close_menu(doc);
        if let Some(chrome) = self.chrome.take() {
            chrome.unmount(doc);
        }
        for node in doc.all_elements() {
            for marker in EDITOR_MARKERS {
                if doc.has_attr(node, marker) {
                    let _ = doc.remove_attr(node, marker);
                }
            }
        }
        for id in self.listeners.drain(..) {
            doc.listeners_mut().remove(id);
        }
        doc.listeners_mut().remove_owner(&self.listener_owner());
        self.selected = None;
        self.hovered = None;
        self.on_change = None;
        self.state = EditorState::Stopped;
        self.live.store(false, Ordering::SeqCst);
        let changes = self.tracker.to_vec();
        info!(
            session = %self.session,
            variant = %self.variant_name,
            changes = changes.len(),
            "visual editor stopped"
        );
        Some(changes)
    }

    /// Alias of [`VisualEditor::stop`] used when a new session replaces this one.
    pub fn destroy(&mut self, doc: &mut Document) -> Option<Vec<DomChange>> {
        self.stop(doc)
    }

    // ----- change list ------------------------------------------------------

    /// Merge-or-append a change made outside the session's own actions.
    /// The page is not touched and the record is not undoable. The toolbar
    /// count catches up on the next edit.
    pub fn add_change(&mut self, change: DomChange) -> Result<(), EditorError> {
        change.validate()?;
        self.tracker.record(change, InverseOp::Nothing);
        self.notify();
        Ok(())
    }

    /// Revert the latest edit on the page and drop it from the list.
    pub fn undo_last_change(&mut self, doc: &mut Document) -> Option<DomChange> {
        let undone = self.tracker.undo_last(doc)?;
        info!(selector = %undone.selector, kind = %undone.kind, "change undone");
        self.refresh_toolbar(doc);
        self.notify();
        Some(undone)
    }

    /// Revert every edit newest first and empty the list.
    pub fn clear_all(&mut self, doc: &mut Document) {
        let undone = self.tracker.clear_all(doc);
        info!(undone, "all changes cleared");
        self.refresh_toolbar(doc);
        self.notify();
    }

    /// Push the current list to the callback without stopping.
    pub fn save(&mut self) {
        debug!(changes = self.tracker.len(), "saving change list");
        self.notify();
    }

    fn notify(&mut self) {
        let changes = self.tracker.changes().as_slice();
        if let Some(callback) = self.on_change.as_mut() {
            callback(changes);
        }
    }

    fn refresh_toolbar(&self, doc: &mut Document) {
        if let Some(chrome) = &self.chrome {
            if let Err(err) = chrome.refresh_count(doc, self.tracker.len()) {
                warn!(error = %err, "failed to refresh toolbar count");
            }
        }
    }

    /// Record, refresh the toolbar, then propagate.
    fn commit(&mut self, doc: &mut Document, change: DomChange, inverse: InverseOp) {
        self.tracker.record(change, inverse);
        self.refresh_toolbar(doc);
        self.notify();
    }

    // ----- selection --------------------------------------------------------

    pub fn select(&mut self, doc: &mut Document, node: NodeId) -> Result<(), EditorError> {
        if !self.is_active() {
            return Err(EditorError::NotStarted);
        }
        if !doc.is_connected(node) || !doc.is_element(node) {
            return Err(EditorError::SelectionLost);
        }
        self.clear_selection(doc);
        doc.set_attr(node, SELECTED_ATTR, "")?;
        self.selected = Some(node);
        self.open_menu(doc, node)?;
        debug!(%node, "element selected for editing");
        Ok(())
    }

    pub fn deselect(&mut self, doc: &mut Document) {
        self.close_menu(doc);
        self.clear_selection(doc);
    }

    fn clear_selection(&mut self, doc: &mut Document) {
        if let Some(previous) = self.selected.take() {
            let _ = doc.remove_attr(previous, SELECTED_ATTR);
        }
    }

    fn open_menu(&mut self, doc: &mut Document, target: NodeId) -> Result<(), EditorError> {
        self.close_menu(doc);
        self.menu_generation += 1;
        self.menu = Some(ActionMenu::open(doc, &self.session, target, self.menu_generation)?);
        Ok(())
    }

    pub fn close_menu(&mut self, doc: &mut Document) {
        if let Some(menu) = self.menu.take() {
            menu.close(doc);
        }
    }

    fn live_selection(&self, doc: &Document) -> Result<NodeId, EditorError> {
        let node = self.selected.ok_or(EditorError::NoSelection)?;
        if doc.is_connected(node) {
            Ok(node)
        } else {
            Err(EditorError::SelectionLost)
        }
    }

    // ----- actions ----------------------------------------------------------

    /// Run an action on the selected element: mutate the page, record the
    /// change, refresh the toolbar and propagate the list. Returns the change
    /// as recorded, or `None` for non-mutating actions.
    pub fn apply_action(
        &mut self,
        doc: &mut Document,
        action: EditorAction,
    ) -> Result<Option<DomChange>, EditorError> {
        if !self.is_active() {
            return Err(EditorError::NotStarted);
        }
        let target = self.live_selection(doc)?;
        let selector = self.generator.generate(doc, target);
        debug!(action = action.name(), selector = %selector, "applying editor action");

        let (change, inverse) = match action {
            EditorAction::EditText(text) => {
                let inverse = InverseOp::capture_element(doc, target);
                doc.set_text_content(target, &text)?;
                (DomChange::text(&selector, text), inverse)
            }
            EditorAction::EditHtml(html) => {
                let inverse = InverseOp::capture_element(doc, target);
                doc.set_inner_html(target, &html)?;
                self.tag_editable_subtree(doc, target)?;
                (DomChange::html(&selector, html), inverse)
            }
            EditorAction::MoveUp => {
                let sibling = doc
                    .previous_element_sibling(target)
                    .ok_or_else(|| EditorError::invalid("element is already first"))?;
                let anchor = self.generator.generate(doc, sibling);
                let inverse = self.position_inverse(doc, target)?;
                doc.insert_adjacent(sibling, Adjacent::BeforeBegin, target)?;
                (DomChange::moved(&selector, anchor, InsertPosition::Before), inverse)
            }
            EditorAction::MoveDown => {
                let sibling = doc
                    .next_element_sibling(target)
                    .ok_or_else(|| EditorError::invalid("element is already last"))?;
                let anchor = self.generator.generate(doc, sibling);
                let inverse = self.position_inverse(doc, target)?;
                doc.insert_adjacent(sibling, Adjacent::AfterEnd, target)?;
                (DomChange::moved(&selector, anchor, InsertPosition::After), inverse)
            }
            EditorAction::CopyElement => {
                self.clipboard = Some(clean_outer_html(doc, target)?);
                return Ok(None);
            }
            EditorAction::CopySelector => {
                self.clipboard = Some(selector);
                return Ok(None);
            }
            EditorAction::SelectParent => {
                let parent = doc
                    .parent_element(target)
                    .filter(|p| !matches!(doc.tag_name(*p), Some("body") | Some("html")))
                    .ok_or_else(|| EditorError::invalid("element has no editable parent"))?;
                self.select(doc, parent)?;
                return Ok(None);
            }
            EditorAction::Insert(block) => {
                let (node, html) = self.build_block(doc, &block)?;
                doc.insert_adjacent(target, adjacent_for(block.position), node)?;
                (
                    DomChange::insert(&selector, html, block.position),
                    InverseOp::Detach { node },
                )
            }
            EditorAction::Hide => {
                let inverse = InverseOp::capture_attributes(doc, target);
                doc.set_style_property(target, "display", "none")?;
                (DomChange::style(&selector, [("display", "none")]), inverse)
            }
            EditorAction::Delete => {
                let inverse = InverseOp::capture_attributes(doc, target);
                doc.set_style_property(target, "display", "none")?;
                (DomChange::delete(&selector), inverse)
            }
            EditorAction::Remove => {
                let inverse = self.position_inverse(doc, target)?;
                self.deselect(doc);
                doc.detach(target)?;
                (DomChange::delete(&selector), inverse)
            }
            EditorAction::Duplicate => {
                let copy = doc.deep_clone(target)?;
                let _ = doc.remove_attr(copy, SELECTED_ATTR);
                doc.insert_adjacent(target, Adjacent::AfterEnd, copy)?;
                (DomChange::duplicate(&selector), InverseOp::Detach { node: copy })
            }
            EditorAction::SetStyle(properties) => {
                if properties.is_empty() {
                    return Err(EditorError::invalid("no style properties given"));
                }
                let inverse = InverseOp::capture_attributes(doc, target);
                for (property, value) in &properties {
                    doc.set_style_property(target, property, value)?;
                }
                (DomChange::style(&selector, properties), inverse)
            }
            EditorAction::SetAttribute(name, value) => {
                let name = name.trim().to_ascii_lowercase();
                if name.is_empty() || is_marker_attr(&name) || name.starts_with("on") {
                    return Err(EditorError::invalid(format!("attribute '{name}' is not editable")));
                }
                let inverse = InverseOp::capture_attributes(doc, target);
                doc.set_attr(target, &name, &value)?;
                (DomChange::attribute(&selector, name, value), inverse)
            }
            EditorAction::AddClass(class_name) => {
                let inverse = InverseOp::capture_attributes(doc, target);
                doc.add_class(target, &class_name)?;
                (DomChange::class(&selector, class_name, ClassOp::Add), inverse)
            }
            EditorAction::RemoveClass(class_name) => {
                let inverse = InverseOp::capture_attributes(doc, target);
                doc.remove_class(target, &class_name)?;
                (DomChange::class(&selector, class_name, ClassOp::Remove), inverse)
            }
        };

        change.validate()?;
        self.commit(doc, change.clone(), inverse);
        Ok(Some(change))
    }

    fn position_inverse(&self, doc: &Document, target: NodeId) -> Result<InverseOp, EditorError> {
        InverseOp::capture_position(doc, target).ok_or(EditorError::SelectionLost)
    }

    fn build_block(&self, doc: &mut Document, block: &InsertBlock) -> Result<(NodeId, String), EditorError> {
        let tag = block.tag.trim();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(EditorError::invalid(format!("bad tag name '{}'", block.tag)));
        }
        let node = doc.create_element(tag);
        if let Some(id) = block.id.as_deref().filter(|id| !id.is_empty()) {
            doc.set_attr(node, "id", id)?;
        }
        if !block.classes.is_empty() {
            doc.set_classes(node, &block.classes)?;
        }
        if !block.content.is_empty() {
            doc.set_inner_html(node, &block.content)?;
        }
        let html = doc.outer_html(node);
        doc.set_attr(node, EDITABLE_ATTR, "")?;
        Ok((node, html))
    }

    fn tag_editable_subtree(&self, doc: &mut Document, node: NodeId) -> Result<(), EditorError> {
        for child in doc.descendants(node) {
            doc.set_attr(child, EDITABLE_ATTR, "")?;
        }
        Ok(())
    }

    /// Run a toolbar button.
    pub fn toolbar_action(&mut self, doc: &mut Document, action: ToolbarAction) -> EditorResponse {
        if !self.is_active() {
            return EditorResponse::default();
        }
        let mut response = EditorResponse::consumed();
        match action {
            ToolbarAction::Undo => {
                response.changed = self.undo_last_change(doc).is_some();
            }
            ToolbarAction::Clear => {
                response.changed = !self.tracker.is_empty();
                self.clear_all(doc);
            }
            ToolbarAction::Save => self.save(),
            ToolbarAction::Exit => response.completed = self.stop(doc),
        }
        response
    }

    // ----- events -----------------------------------------------------------

    /// Route one captured event.
    pub fn handle_event(&mut self, doc: &mut Document, event: &DomEvent) -> EditorResponse {
        if !self.is_active() {
            return EditorResponse::default();
        }
        if event.kind == EventKind::KeyDown {
            return self.on_key(doc, event);
        }

        let target = event
            .target
            .or_else(|| doc.element_from_point(event.x, event.y))
            .filter(|t| doc.contains_node(*t) && doc.is_connected(*t));
        let Some(target) = target else {
            return EditorResponse::default();
        };

        if self.is_tool_node(doc, target) {
            return self.on_tool_event(doc, event, target);
        }
        let Some(target) = Some(target).filter(|t| doc.is_element(*t)).or_else(|| doc.parent_element(target)) else {
            return EditorResponse::default();
        };

        match event.kind {
            EventKind::Click | EventKind::ContextMenu => {
                if let Err(err) = self.select(doc, target) {
                    warn!(error = %err, "could not select element");
                }
                EditorResponse::consumed()
            }
            EventKind::MouseDown | EventKind::MouseUp => EditorResponse::consumed(),
            EventKind::MouseOver => {
                self.on_hover(doc, target);
                EditorResponse::default()
            }
            EventKind::MouseOut => {
                self.clear_hover(doc);
                EditorResponse::default()
            }
            _ => EditorResponse::default(),
        }
    }

    fn is_tool_node(&self, doc: &Document, node: NodeId) -> bool {
        is_extension_owned(doc, node, &self.generator.policy().reserved_prefix)
    }

    fn on_key(&mut self, doc: &mut Document, event: &DomEvent) -> EditorResponse {
        if !event.is_key("Escape") {
            return EditorResponse::default();
        }
        if self.menu.is_some() {
            self.close_menu(doc);
        } else if self.selected.is_some() {
            self.clear_selection(doc);
        } else {
            return EditorResponse {
                completed: self.stop(doc),
                ..EditorResponse::consumed()
            };
        }
        EditorResponse::consumed()
    }

    fn on_tool_event(&mut self, doc: &mut Document, event: &DomEvent, target: NodeId) -> EditorResponse {
        if event.kind != EventKind::Click {
            return EditorResponse::default();
        }
        if let Some(action) = self
            .chrome
            .as_ref()
            .and_then(|chrome| chrome.toolbar_action_at(doc, target))
        {
            return self.toolbar_action(doc, action);
        }
        let command = self.menu.as_ref().and_then(|menu| menu.command_at(doc, target));
        let Some(command) = command else {
            // Stale menu from an earlier open, or other tool furniture.
            return EditorResponse::consumed();
        };
        match command.immediate_action() {
            Some(action) => {
                let mutating = action.is_mutating();
                let mut response = EditorResponse::consumed();
                match self.apply_action(doc, action) {
                    Ok(_) => response.changed = mutating,
                    Err(err) => warn!(command = command.name(), error = %err, "menu action failed"),
                }
                if mutating {
                    self.close_menu(doc);
                }
                response
            }
            None => EditorResponse {
                input_requested: Some(command),
                ..EditorResponse::consumed()
            },
        }
    }

    fn on_hover(&mut self, doc: &mut Document, target: NodeId) {
        if self.hovered == Some(target) {
            return;
        }
        self.clear_hover(doc);
        let _ = doc.set_attr(target, HOVER_ATTR, "");
        let selector = self.generator.generate(doc, target);
        if let Some(chrome) = &self.chrome {
            if let Err(err) = chrome.show_tooltip(doc, target, &selector) {
                warn!(error = %err, "failed to show selector tooltip");
            }
        }
        self.hovered = Some(target);
    }

    fn clear_hover(&mut self, doc: &mut Document) {
        if let Some(previous) = self.hovered.take() {
            let _ = doc.remove_attr(previous, HOVER_ATTR);
        }
        if let Some(chrome) = &self.chrome {
            let _ = chrome.hide_tooltip(doc);
        }
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

/// Outer HTML of `node` without tool markers.
fn clean_outer_html(doc: &mut Document, node: NodeId) -> Result<String, EditorError> {
    let copy = doc.deep_clone(node)?;
    let mut nodes = vec![copy];
    nodes.extend(doc.descendants(copy));
    for current in nodes {
        let markers: Vec<String> = doc
            .attributes(current)
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| is_marker_attr(name))
            .collect();
        for name in markers {
            doc.remove_attr(current, &name)?;
        }
    }
    Ok(doc.outer_html(copy))
}
