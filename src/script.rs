//! Scripted sessions: replay inbound messages and page input through a
//! [`PageHost`] and collect everything it reports back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use variant_bridge::{InboundMessage, OutboundMessage, PageHost};
use variant_page_dom::{DomError, DomEvent, EventKind, Rect};
use variant_visual_editor::EditorAction;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to parse session script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("step {step}: {selector:?} matches no element")]
    NoTarget { step: usize, selector: String },
    #[error("step {step}: {source}")]
    Dom {
        step: usize,
        #[source]
        source: DomError,
    },
}

/// One scripted step. Steps are written as single-key JSON objects, e.g.
/// `{"click": {"selector": "#cta"}}` or `{"message": {"type": "STOP_VISUAL_EDITOR"}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Trusted request from the extension side.
    Message(InboundMessage),
    /// Envelope posted on the page channel, source tag included.
    PageMessage(Value),
    /// Give an element a layout box so coordinate events can hit it.
    Layout {
        selector: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Click {
        selector: String,
    },
    /// Pointer event resolved from coordinates.
    Pointer {
        kind: EventKind,
        x: f64,
        y: f64,
    },
    Key {
        key: String,
    },
    Action(EditorAction),
}

pub fn parse_script(raw: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    Ok(serde_json::from_str(raw)?)
}

/// A step the host refused; replay carries on after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedStep {
    pub step: usize,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub messages: Vec<OutboundMessage>,
    pub rejected: Vec<RejectedStep>,
    pub final_html: String,
}

/// Run `steps` against a fresh host, end whatever session is left open and
/// drain the produced messages.
pub fn replay(
    mut host: PageHost,
    mut outbox: tokio::sync::mpsc::UnboundedReceiver<OutboundMessage>,
    steps: &[ScriptStep],
) -> Result<ReplayReport, ScriptError> {
    let mut rejected = Vec::new();

    for (step, entry) in steps.iter().enumerate() {
        debug!(step, "replaying step");
        let result = match entry {
            ScriptStep::Message(message) => host.handle_message(message.clone()).map(|_| ()),
            ScriptStep::PageMessage(envelope) => host.handle_page_message(&envelope.to_string()),
            ScriptStep::Layout {
                selector,
                x,
                y,
                width,
                height,
            } => {
                let node = locate(&host, step, selector)?;
                host.document_mut()
                    .set_layout(node, Rect::new(*x, *y, *width, *height))
                    .map_err(|source| ScriptError::Dom { step, source })?;
                Ok(())
            }
            ScriptStep::Click { selector } => {
                let node = locate(&host, step, selector)?;
                host.dispatch_event(&DomEvent::click(node));
                Ok(())
            }
            ScriptStep::Pointer { kind, x, y } => {
                host.dispatch_event(&DomEvent::pointer(*kind, None, *x, *y));
                Ok(())
            }
            ScriptStep::Key { key } => {
                host.dispatch_event(&DomEvent::key(key.as_str()));
                Ok(())
            }
            ScriptStep::Action(action) => host.editor_action(action.clone()).map(|_| ()),
        };
        if let Err(err) = result {
            warn!(step, error = %err, "step rejected");
            rejected.push(RejectedStep {
                step,
                error: err.to_string(),
            });
        }
    }

    let doc = host.into_document();
    let mut messages = Vec::new();
    while let Ok(message) = outbox.try_recv() {
        messages.push(message);
    }
    Ok(ReplayReport {
        messages,
        rejected,
        final_html: doc.to_html(),
    })
}

fn locate(
    host: &PageHost,
    step: usize,
    selector: &str,
) -> Result<variant_page_dom::NodeId, ScriptError> {
    host.document()
        .query_one(selector)
        .map_err(|source| ScriptError::Dom { step, source })?
        .ok_or_else(|| ScriptError::NoTarget {
            step,
            selector: selector.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn steps_parse_from_single_key_objects() {
        let raw = json!([
            {"message": {"type": "START_VISUAL_EDITOR", "variantName": "B"}},
            {"click": {"selector": "#cta"}},
            {"pointer": {"kind": "mousemove", "x": 4.0, "y": 5.0}},
            {"key": {"key": "Escape"}},
            {"action": {"action": "addClass", "args": "pulse"}}
        ]);
        let steps = parse_script(&raw.to_string()).unwrap();
        assert_eq!(steps.len(), 5);
        assert!(matches!(&steps[1], ScriptStep::Click { selector } if selector == "#cta"));
        assert_eq!(steps[4], ScriptStep::Action(EditorAction::AddClass("pulse".into())));
    }

    #[test]
    fn unknown_step_is_a_parse_error() {
        assert!(matches!(
            parse_script(r#"[{"teleport": {}}]"#),
            Err(ScriptError::Parse(_))
        ));
    }
}
