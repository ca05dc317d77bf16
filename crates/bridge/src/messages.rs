//! Message contracts consumed and produced by the page host.

use serde::{Deserialize, Serialize};
use variant_core_types::DomChange;

/// Label used for `PREVIEW` requests that do not name one.
pub const DEFAULT_PREVIEW_LABEL: &str = "preview";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewAction {
    Apply,
    Remove,
}

/// Requests routed to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    #[serde(rename_all = "camelCase")]
    StartElementPicker {
        #[serde(default)]
        from_popup: bool,
    },
    CancelElementPicker,
    #[serde(rename_all = "camelCase")]
    StartVisualEditor {
        variant_name: String,
        #[serde(default)]
        changes: Vec<DomChange>,
    },
    StopVisualEditor,
    GetVisualEditorStatus,
    Preview {
        action: PreviewAction,
        #[serde(default)]
        changes: Vec<DomChange>,
        #[serde(default)]
        label: Option<String>,
    },
}

impl InboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            InboundMessage::StartElementPicker { .. } => "START_ELEMENT_PICKER",
            InboundMessage::CancelElementPicker => "CANCEL_ELEMENT_PICKER",
            InboundMessage::StartVisualEditor { .. } => "START_VISUAL_EDITOR",
            InboundMessage::StopVisualEditor => "STOP_VISUAL_EDITOR",
            InboundMessage::GetVisualEditorStatus => "GET_VISUAL_EDITOR_STATUS",
            InboundMessage::Preview { .. } => "PREVIEW",
        }
    }

    /// Only preview requests may arrive over the untrusted page channel.
    pub fn allowed_from_page(&self) -> bool {
        matches!(self, InboundMessage::Preview { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedChange {
    pub index: usize,
    pub error: String,
}

/// Notifications the host sends back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    ElementSelected {
        selector: String,
    },
    #[serde(rename_all = "camelCase")]
    VisualEditorChanges {
        variant_name: String,
        changes: Vec<DomChange>,
    },
    #[serde(rename_all = "camelCase")]
    VisualEditorComplete {
        variant_name: String,
        changes: Vec<DomChange>,
        total_changes: usize,
    },
    #[serde(rename_all = "camelCase")]
    VisualEditorStatus {
        active: bool,
        variant_name: Option<String>,
        changes: Vec<DomChange>,
    },
    PreviewApplied {
        label: String,
        applied: usize,
        skipped: usize,
        failed: Vec<FailedChange>,
    },
    PreviewRemoved {
        label: String,
        restored: usize,
    },
}

impl OutboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundMessage::ElementSelected { .. } => "ELEMENT_SELECTED",
            OutboundMessage::VisualEditorChanges { .. } => "VISUAL_EDITOR_CHANGES",
            OutboundMessage::VisualEditorComplete { .. } => "VISUAL_EDITOR_COMPLETE",
            OutboundMessage::VisualEditorStatus { .. } => "VISUAL_EDITOR_STATUS",
            OutboundMessage::PreviewApplied { .. } => "PREVIEW_APPLIED",
            OutboundMessage::PreviewRemoved { .. } => "PREVIEW_REMOVED",
        }
    }

    pub fn complete(variant_name: impl Into<String>, changes: Vec<DomChange>) -> Self {
        let total_changes = changes.len();
        OutboundMessage::VisualEditorComplete {
            variant_name: variant_name.into(),
            changes,
            total_changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn inbound_wire_names() {
        let msg: InboundMessage = serde_json::from_value(json!({
            "type": "START_VISUAL_EDITOR",
            "variantName": "B",
            "changes": [{"selector": "#cta", "type": "text", "value": "Go"}]
        }))
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::StartVisualEditor {
                variant_name: "B".into(),
                changes: vec![DomChange::text("#cta", "Go")],
            }
        );

        let msg: InboundMessage =
            serde_json::from_value(json!({"type": "START_ELEMENT_PICKER"})).unwrap();
        assert_eq!(msg, InboundMessage::StartElementPicker { from_popup: false });
        assert_eq!(msg.name(), "START_ELEMENT_PICKER");
    }

    #[test]
    fn script_change_type_is_not_accepted() {
        let raw = json!({
            "type": "PREVIEW",
            "action": "apply",
            "changes": [{"selector": "body", "type": "javascript", "value": "alert(1)"}]
        });
        assert!(serde_json::from_value::<InboundMessage>(raw).is_err());
    }

    #[test]
    fn outbound_wire_shape() {
        let msg = OutboundMessage::complete("B", vec![DomChange::delete("#x")]);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "VISUAL_EDITOR_COMPLETE",
                "variantName": "B",
                "changes": [{"selector": "#x", "type": "delete"}],
                "totalChanges": 1
            })
        );
    }
}
