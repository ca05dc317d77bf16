//! The page host: owns the page, the single active-session slot, the preview
//! engine and the outbound message sender.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use variant_core_types::{DomChange, SessionId, SessionKind};
use variant_element_picker::ElementPicker;
use variant_page_dom::{DomEvent, Document, EventOutcome};
use variant_preview::{PreviewPolicy, PreviewStateManager};
use variant_selector::{SelectorGenerator, SelectorPolicy};
use variant_visual_editor::{EditorAction, EditorError, VisualEditor};

use crate::channel::PageChannel;
use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::messages::{
    FailedChange, InboundMessage, OutboundMessage, PreviewAction, DEFAULT_PREVIEW_LABEL,
};

/// Lifecycle notifications for observers of the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum HostEvent {
    SessionStarted { kind: SessionKind, session: SessionId },
    SessionEnded { kind: SessionKind, session: SessionId },
    MessageRejected { reason: String },
    DeliveryFailed { message: &'static str },
}

pub type HostEventBus = broadcast::Sender<HostEvent>;

/// The page's one interactive session, if any.
#[derive(Debug, Default)]
pub enum ActiveSession {
    #[default]
    None,
    Picker(ElementPicker),
    Editor(VisualEditor),
}

impl ActiveSession {
    pub fn kind(&self) -> Option<SessionKind> {
        match self {
            ActiveSession::None => None,
            ActiveSession::Picker(_) => Some(SessionKind::Picker),
            ActiveSession::Editor(_) => Some(SessionKind::Editor),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HostSettings {
    pub selector: SelectorPolicy,
    pub preview: PreviewPolicy,
    pub bridge: BridgeConfig,
}

/// Inputs accepted by [`PageHost::run`].
#[derive(Clone, Debug)]
pub enum HostInput {
    /// Trusted request from the extension side.
    Message(InboundMessage),
    /// Raw envelope posted on the page channel.
    PageMessage(String),
    Event(DomEvent),
    /// Editor action completed with user input (edit text, insert block).
    Action(EditorAction),
    Shutdown,
}

#[derive(Clone, Debug)]
struct RetainedStatus {
    variant_name: String,
    changes: Vec<DomChange>,
}

/// Outbound side shared with session callbacks.
#[derive(Clone)]
struct Outbox {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    retained: Arc<Mutex<Option<RetainedStatus>>>,
    retain_on_failure: bool,
    events: HostEventBus,
}

impl Outbox {
    /// Deliver `message`. A missing receiver is logged, never fatal.
    fn send(&self, message: OutboundMessage) -> bool {
        let name = message.name();
        let status = match &message {
            OutboundMessage::VisualEditorChanges { variant_name, changes }
            | OutboundMessage::VisualEditorComplete {
                variant_name,
                changes,
                ..
            } => Some(RetainedStatus {
                variant_name: variant_name.clone(),
                changes: changes.clone(),
            }),
            _ => None,
        };
        if self.tx.send(message).is_ok() {
            debug!(message = name, "message sent");
            return true;
        }
        warn!(message = name, "no receiver for outbound message");
        if self.retain_on_failure {
            if let Some(status) = status {
                *self.retained.lock() = Some(status);
            }
        }
        let _ = self.events.send(HostEvent::DeliveryFailed { message: name });
        false
    }
}

pub struct PageHost {
    doc: Document,
    session: ActiveSession,
    preview: PreviewStateManager,
    generator: Arc<SelectorGenerator>,
    channel: PageChannel,
    outbox: Outbox,
    events: HostEventBus,
}

impl PageHost {
    pub fn new(doc: Document, settings: HostSettings) -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);
        let outbox = Outbox {
            tx,
            retained: Arc::new(Mutex::new(None)),
            retain_on_failure: settings.bridge.status_on_send_failure,
            events: events.clone(),
        };
        let host = Self {
            doc,
            session: ActiveSession::None,
            preview: PreviewStateManager::new(settings.preview),
            generator: Arc::new(SelectorGenerator::new(settings.selector)),
            channel: PageChannel::new(settings.bridge.source_tag),
            outbox,
            events,
        };
        (host, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn into_document(mut self) -> Document {
        self.end_session();
        self.doc
    }

    pub fn channel(&self) -> &PageChannel {
        &self.channel
    }

    pub fn generator(&self) -> &SelectorGenerator {
        &self.generator
    }

    pub fn preview(&self) -> &PreviewStateManager {
        &self.preview
    }

    pub fn active_kind(&self) -> Option<SessionKind> {
        self.session.kind()
    }

    pub fn editor(&self) -> Option<&VisualEditor> {
        match &self.session {
            ActiveSession::Editor(editor) => Some(editor),
            _ => None,
        }
    }

    pub fn picker(&self) -> Option<&ElementPicker> {
        match &self.session {
            ActiveSession::Picker(picker) => Some(picker),
            _ => None,
        }
    }

    /// Handle a trusted request.
    pub fn handle_message(&mut self, message: InboundMessage) -> Result<(), BridgeError> {
        debug!(message = message.name(), "handling message");
        match message {
            InboundMessage::StartElementPicker { from_popup } => self.start_picker(from_popup),
            InboundMessage::CancelElementPicker => {
                self.cancel_picker();
                Ok(())
            }
            InboundMessage::StartVisualEditor {
                variant_name,
                changes,
            } => self.start_editor(variant_name, changes),
            InboundMessage::StopVisualEditor => {
                self.stop_editor();
                Ok(())
            }
            InboundMessage::GetVisualEditorStatus => {
                self.outbox.send(self.status());
                Ok(())
            }
            InboundMessage::Preview {
                action,
                changes,
                label,
            } => {
                let label = label.unwrap_or_else(|| DEFAULT_PREVIEW_LABEL.to_string());
                self.handle_preview(action, &changes, &label);
                Ok(())
            }
        }
    }

    /// Handle a raw envelope from the untrusted page channel.
    pub fn handle_page_message(&mut self, raw: &str) -> Result<(), BridgeError> {
        match self.channel.accept(raw) {
            Ok(Some(message)) => self.handle_message(message),
            Ok(None) => Ok(()),
            Err(err) => {
                let _ = self.events.send(HostEvent::MessageRejected {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Route a captured page event to the active session.
    pub fn dispatch_event(&mut self, event: &DomEvent) -> EventOutcome {
        let mut finished = None;
        let outcome = match &mut self.session {
            ActiveSession::None => EventOutcome::ignored(),
            ActiveSession::Picker(picker) => {
                let response = picker.handle_event(&mut self.doc, event);
                if !picker.is_active() {
                    finished = Some(None);
                }
                response.outcome
            }
            ActiveSession::Editor(editor) => {
                let response = editor.handle_event(&mut self.doc, event);
                if let Some(changes) = response.completed {
                    finished = Some(Some(OutboundMessage::complete(editor.variant_name(), changes)));
                }
                response.outcome
            }
        };
        if let Some(message) = finished {
            self.clear_slot();
            if let Some(message) = message {
                self.outbox.send(message);
            }
        }
        outcome
    }

    /// Run an editor action that needed input from the user.
    pub fn editor_action(&mut self, action: EditorAction) -> Result<Option<DomChange>, BridgeError> {
        match &mut self.session {
            ActiveSession::Editor(editor) => Ok(editor.apply_action(&mut self.doc, action)?),
            _ => Err(EditorError::NotStarted.into()),
        }
    }

    /// Process inputs until the inbox closes or `Shutdown` arrives, then tear
    /// the session down and hand the page back.
    pub async fn run(mut self, mut inbox: mpsc::Receiver<HostInput>) -> Document {
        info!("page host running");
        while let Some(input) = inbox.recv().await {
            let result = match input {
                HostInput::Message(message) => self.handle_message(message),
                HostInput::PageMessage(raw) => self.handle_page_message(&raw),
                HostInput::Event(event) => {
                    self.dispatch_event(&event);
                    Ok(())
                }
                HostInput::Action(action) => self.editor_action(action).map(|_| ()),
                HostInput::Shutdown => break,
            };
            if let Err(err) = result {
                warn!(error = %err, "host input failed");
            }
        }
        info!("page host stopping");
        self.into_document()
    }

    // ----- sessions ---------------------------------------------------------

    fn start_picker(&mut self, from_popup: bool) -> Result<(), BridgeError> {
        if matches!(self.session, ActiveSession::Picker(_)) {
            debug!("picker already active");
            return Ok(());
        }
        self.end_session();
        let mut picker = ElementPicker::new(Arc::clone(&self.generator));
        let outbox = self.outbox.clone();
        let live = picker.liveness();
        picker.start(
            &mut self.doc,
            Box::new(move |selector: &str| {
                if live.load(Ordering::SeqCst) {
                    outbox.send(OutboundMessage::ElementSelected {
                        selector: selector.to_string(),
                    });
                }
            }),
        )?;
        info!(session = %picker.session_id(), from_popup, "picker session started");
        self.announce_start(SessionKind::Picker, picker.session_id().clone());
        self.session = ActiveSession::Picker(picker);
        Ok(())
    }

    fn cancel_picker(&mut self) {
        let running = matches!(&self.session, ActiveSession::Picker(picker) if picker.is_active());
        if running {
            self.end_session();
        } else {
            debug!("cancel for a picker that is not running");
        }
    }

    fn start_editor(&mut self, variant_name: String, changes: Vec<DomChange>) -> Result<(), BridgeError> {
        self.end_session();
        *self.outbox.retained.lock() = None;
        let mut editor = VisualEditor::new(Arc::clone(&self.generator), variant_name.clone());
        let outbox = self.outbox.clone();
        let live = editor.liveness();
        editor.start(
            &mut self.doc,
            changes,
            Box::new(move |changes: &[DomChange]| {
                if live.load(Ordering::SeqCst) {
                    outbox.send(OutboundMessage::VisualEditorChanges {
                        variant_name: variant_name.clone(),
                        changes: changes.to_vec(),
                    });
                }
            }),
        )?;
        self.announce_start(SessionKind::Editor, editor.session_id().clone());
        self.session = ActiveSession::Editor(editor);
        Ok(())
    }

    fn stop_editor(&mut self) {
        if matches!(self.session, ActiveSession::Editor(_)) {
            self.end_session();
        } else {
            debug!("stop for an editor that is not running");
        }
    }

    /// Destroy whatever session is active. An editor flushes its final list.
    fn end_session(&mut self) {
        let session = std::mem::take(&mut self.session);
        let (kind, id, final_message) = match session {
            ActiveSession::None => return,
            ActiveSession::Picker(mut picker) => {
                picker.cancel(&mut self.doc);
                (SessionKind::Picker, picker.session_id().clone(), None)
            }
            ActiveSession::Editor(mut editor) => {
                let message = editor
                    .destroy(&mut self.doc)
                    .map(|changes| OutboundMessage::complete(editor.variant_name(), changes));
                (SessionKind::Editor, editor.session_id().clone(), message)
            }
        };
        if let Some(message) = final_message {
            self.outbox.send(message);
        }
        info!(kind = kind.name(), session = %id, "session ended");
        let _ = self.events.send(HostEvent::SessionEnded { kind, session: id });
    }

    /// Drop a session that already stopped itself.
    fn clear_slot(&mut self) {
        let session = std::mem::take(&mut self.session);
        let ended = match &session {
            ActiveSession::None => None,
            ActiveSession::Picker(picker) => Some((SessionKind::Picker, picker.session_id().clone())),
            ActiveSession::Editor(editor) => Some((SessionKind::Editor, editor.session_id().clone())),
        };
        if let Some((kind, session)) = ended {
            info!(kind = kind.name(), session = %session, "session finished");
            let _ = self.events.send(HostEvent::SessionEnded { kind, session });
        }
    }

    fn announce_start(&self, kind: SessionKind, session: SessionId) {
        let _ = self.events.send(HostEvent::SessionStarted { kind, session });
    }

    /// Current `VISUAL_EDITOR_STATUS`. After a failed delivery this still
    /// carries the last change list the editor produced.
    pub fn status(&self) -> OutboundMessage {
        if let ActiveSession::Editor(editor) = &self.session {
            return OutboundMessage::VisualEditorStatus {
                active: true,
                variant_name: Some(editor.variant_name().to_string()),
                changes: editor.changes().to_vec(),
            };
        }
        match self.outbox.retained.lock().clone() {
            Some(retained) => OutboundMessage::VisualEditorStatus {
                active: false,
                variant_name: Some(retained.variant_name),
                changes: retained.changes,
            },
            None => OutboundMessage::VisualEditorStatus {
                active: false,
                variant_name: None,
                changes: Vec::new(),
            },
        }
    }

    // ----- preview ----------------------------------------------------------

    fn handle_preview(&mut self, action: PreviewAction, changes: &[DomChange], label: &str) {
        let message = match action {
            PreviewAction::Apply => {
                let report = self.preview.apply_changes(&mut self.doc, changes, label);
                OutboundMessage::PreviewApplied {
                    label: label.to_string(),
                    applied: report.applied,
                    skipped: report.skipped,
                    failed: report
                        .failed
                        .iter()
                        .map(|(index, err)| FailedChange {
                            index: *index,
                            error: err.to_string(),
                        })
                        .collect(),
                }
            }
            PreviewAction::Remove => {
                let report = self.preview.remove_changes(&mut self.doc, label);
                OutboundMessage::PreviewRemoved {
                    label: label.to_string(),
                    restored: report.restored + report.swept,
                }
            }
        };
        self.outbox.send(message);
    }
}
