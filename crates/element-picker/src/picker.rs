//! Picker state machine: Idle -> Active -> Idle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use variant_core_types::SessionId;
use variant_page_dom::{DomEvent, Document, EventKind, EventOutcome, ListenerId, NodeId};
use variant_selector::{is_extension_owned, SelectorGenerator};

use crate::errors::PickerError;
use crate::overlay::PickerOverlay;

/// Receives the chosen selector. Called at most once per session.
pub type SelectionCallback = Box<dyn FnMut(&str) + Send>;

const CAPTURED_EVENTS: [EventKind; 4] = [
    EventKind::MouseMove,
    EventKind::Click,
    EventKind::KeyDown,
    EventKind::ContextMenu,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerState {
    Idle,
    Active,
}

/// What an event did to the session, for the host to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerResponse {
    pub outcome: EventOutcome,
    /// Selector chosen by this event ("element selected" notification).
    pub selected: Option<String>,
    /// Session ended without a selection (Escape).
    pub cancelled: bool,
}

impl PickerResponse {
    fn consumed() -> Self {
        Self {
            outcome: EventOutcome::consumed(),
            ..Self::default()
        }
    }
}

/// Single-shot element picker.
///
/// While active the picker owns the page: it mounts a non-interactive
/// overlay, registers capturing listeners and highlights whatever is under
/// the pointer. The first click on a page element ends the session.
pub struct ElementPicker {
    session: SessionId,
    generator: Arc<SelectorGenerator>,
    state: PickerState,
    callback: Option<SelectionCallback>,
    overlay: Option<PickerOverlay>,
    listeners: Vec<ListenerId>,
    hovered: Option<NodeId>,
    live: Arc<AtomicBool>,
}

impl fmt::Debug for ElementPicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementPicker")
            .field("session", &self.session)
            .field("state", &self.state)
            .field("hovered", &self.hovered)
            .finish()
    }
}

impl ElementPicker {
    pub fn new(generator: Arc<SelectorGenerator>) -> Self {
        Self {
            session: SessionId::new(),
            generator,
            state: PickerState::Idle,
            callback: None,
            overlay: None,
            listeners: Vec::new(),
            hovered: None,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PickerState::Active
    }

    /// Shared liveness flag; flips to `false` when the session stops so late
    /// messages can tell they arrived after teardown.
    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }

    pub fn overlay(&self) -> Option<&PickerOverlay> {
        self.overlay.as_ref()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Owner name used for listener registrations.
    pub fn listener_owner(&self) -> String {
        format!("picker:{}", self.session)
    }

    /// Enter the active state. A second call while active is a no-op.
    pub fn start(
        &mut self,
        doc: &mut Document,
        callback: SelectionCallback,
    ) -> Result<(), PickerError> {
        if self.is_active() {
            debug!(session = %self.session, "picker already active");
            return Ok(());
        }
        let overlay = PickerOverlay::mount(doc, &self.session)?;
        let owner = self.listener_owner();
        self.listeners = CAPTURED_EVENTS
            .iter()
            .map(|kind| doc.listeners_mut().add(&owner, *kind, true))
            .collect();
        self.overlay = Some(overlay);
        self.callback = Some(callback);
        self.state = PickerState::Active;
        self.live.store(true, Ordering::SeqCst);
        info!(session = %self.session, "element picker started");
        Ok(())
    }

    /// Tear everything down. Safe to call repeatedly.
    pub fn stop(&mut self, doc: &mut Document) {
        if !self.is_active() {
            return;
        }
        if let Some(overlay) = self.overlay.take() {
            overlay.unmount(doc);
        }
        for id in self.listeners.drain(..) {
            doc.listeners_mut().remove(id);
        }
        // Anything registered under our name outside `listeners` goes too.
        doc.listeners_mut().remove_owner(&self.listener_owner());
        self.callback = None;
        self.hovered = None;
        self.state = PickerState::Idle;
        self.live.store(false, Ordering::SeqCst);
        info!(session = %self.session, "element picker stopped");
    }

    /// Cancel from outside (cancel message). The callback is not invoked.
    pub fn cancel(&mut self, doc: &mut Document) {
        if self.is_active() {
            debug!(session = %self.session, "picker cancelled");
        }
        self.stop(doc);
    }

    /// Route one captured event. Never fails: a target that vanished between
    /// frames is treated as no target.
    pub fn handle_event(&mut self, doc: &mut Document, event: &DomEvent) -> PickerResponse {
        if !self.is_active() {
            return PickerResponse::default();
        }
        match event.kind {
            EventKind::MouseMove | EventKind::MouseOver => {
                self.on_hover(doc, event);
                PickerResponse::default()
            }
            EventKind::Click => self.on_click(doc, event),
            EventKind::KeyDown if event.is_key("Escape") => {
                self.stop(doc);
                PickerResponse {
                    cancelled: true,
                    ..PickerResponse::consumed()
                }
            }
            EventKind::ContextMenu => PickerResponse::consumed(),
            _ => PickerResponse::default(),
        }
    }

    fn resolve_target(&self, doc: &Document, event: &DomEvent) -> Option<NodeId> {
        let target = event
            .target
            .or_else(|| doc.element_from_point(event.x, event.y))?;
        if !doc.contains_node(target) || !doc.is_connected(target) || !doc.is_element(target) {
            debug!(%target, "event target is no longer in the page");
            return None;
        }
        let prefix = &self.generator.policy().reserved_prefix;
        let own = self
            .overlay
            .as_ref()
            .is_some_and(|overlay| overlay.contains(doc, target));
        if own || is_extension_owned(doc, target, prefix) {
            return None;
        }
        Some(target)
    }

    fn on_hover(&mut self, doc: &mut Document, event: &DomEvent) {
        let Some(target) = self.resolve_target(doc, event) else {
            // Pointer left the page content: tool elements or empty space.
            if self.hovered.take().is_some() {
                if let Some(overlay) = &self.overlay {
                    if let Err(err) = overlay.clear_highlight(doc) {
                        warn!(error = %err, "failed to hide picker highlight");
                    }
                }
            }
            return;
        };
        if self.hovered == Some(target) {
            return;
        }
        let selector = self.generator.generate(doc, target);
        if let Some(overlay) = &self.overlay {
            if let Err(err) = overlay.highlight(doc, target, &selector) {
                warn!(error = %err, "failed to move picker highlight");
                return;
            }
        }
        self.hovered = Some(target);
    }

    fn on_click(&mut self, doc: &mut Document, event: &DomEvent) -> PickerResponse {
        let Some(target) = self.resolve_target(doc, event) else {
            return PickerResponse::consumed();
        };
        let selector = self.generator.generate(doc, target);
        if selector.is_empty() {
            return PickerResponse::consumed();
        }
        info!(session = %self.session, selector = %selector, "element selected");
        if let Some(mut callback) = self.callback.take() {
            callback(&selector);
        }
        self.stop(doc);
        PickerResponse {
            selected: Some(selector),
            ..PickerResponse::consumed()
        }
    }
}
