//! Tool-owned page furniture of an editing session: injected affordance
//! styles, the floating toolbar and the hover tooltip.

use tracing::debug;
use variant_core_types::markers::{tool_class, tool_id, EDITABLE_ATTR, HOVER_ATTR, SELECTED_ATTR};
use variant_core_types::SessionId;
use variant_page_dom::{DomResult, Document, NodeId};

use crate::actions::ToolbarAction;
use crate::errors::EditorError;

/// Attribute naming the command a tool button triggers.
pub const ACTION_ATTR: &str = "data-vstudio-action";

const TOOLBAR_STYLE: &str = "position: fixed; bottom: 16px; right: 16px; z-index: 2147483647; \
     display: flex; gap: 6px; padding: 8px; border-radius: 8px; background: #111827; \
     color: #f9fafb; font: 13px sans-serif;";

const TOOLTIP_STYLE: &str = "position: fixed; z-index: 2147483647; padding: 2px 6px; \
     background: #111827; color: #f9fafb; font: 11px monospace; pointer-events: none; \
     display: none;";

fn affordance_css() -> String {
    format!(
        "[{EDITABLE_ATTR}]:hover, [{HOVER_ATTR}] {{ outline: 1px dashed #3b82f6 !important; cursor: pointer; }}\n\
         [{SELECTED_ATTR}] {{ outline: 2px solid #2563eb !important; }}"
    )
}

pub fn count_label(count: usize) -> String {
    match count {
        1 => "1 change".to_string(),
        n => format!("{n} changes"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorChrome {
    pub style: NodeId,
    pub toolbar: NodeId,
    pub count: NodeId,
    pub tooltip: NodeId,
}

impl EditorChrome {
    pub fn mount(doc: &mut Document, session: &SessionId, changes: usize) -> Result<Self, EditorError> {
        let body = doc.body().ok_or(EditorError::NoBody)?;

        let style = doc.create_element("style");
        doc.set_attr(style, "id", &tool_id("editor-style", session))?;
        doc.set_text_content(style, &affordance_css())?;
        let style_parent = doc.head().unwrap_or(body);
        doc.append_child(style_parent, style)?;

        let toolbar = tool_node(doc, "div", "editor-toolbar", Some(session))?;
        doc.set_attr(toolbar, "style", TOOLBAR_STYLE)?;
        let count = tool_node(doc, "span", "editor-count", None)?;
        doc.set_text_content(count, &count_label(changes))?;
        doc.append_child(toolbar, count)?;
        for action in ToolbarAction::ALL {
            let button = tool_node(doc, "button", "editor-button", None)?;
            doc.set_attr(button, ACTION_ATTR, action.name())?;
            doc.set_text_content(button, action.label())?;
            doc.append_child(toolbar, button)?;
        }
        doc.append_child(body, toolbar)?;

        let tooltip = tool_node(doc, "div", "editor-tooltip", Some(session))?;
        doc.set_attr(tooltip, "style", TOOLTIP_STYLE)?;
        doc.append_child(body, tooltip)?;

        debug!(session = %session, "editor chrome mounted");
        Ok(Self {
            style,
            toolbar,
            count,
            tooltip,
        })
    }

    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        [self.style, self.toolbar, self.tooltip]
            .iter()
            .any(|owned| doc.contains(*owned, node))
    }

    pub fn refresh_count(&self, doc: &mut Document, changes: usize) -> DomResult<()> {
        doc.set_text_content(self.count, &count_label(changes))
    }

    pub fn count_text(&self, doc: &Document) -> String {
        doc.text_content(self.count)
    }

    /// Toolbar button under `node`, if any.
    pub fn toolbar_action_at(&self, doc: &Document, node: NodeId) -> Option<ToolbarAction> {
        if !doc.contains(self.toolbar, node) {
            return None;
        }
        action_name_at(doc, node, self.toolbar).and_then(|name| ToolbarAction::from_name(&name))
    }

    pub fn show_tooltip(&self, doc: &mut Document, target: NodeId, selector: &str) -> DomResult<()> {
        if let Some(rect) = doc.layout(target) {
            doc.set_style_property(self.tooltip, "left", &format!("{}px", rect.x))?;
            doc.set_style_property(
                self.tooltip,
                "top",
                &format!("{}px", (rect.y - 22.0).max(0.0)),
            )?;
        }
        doc.set_text_content(self.tooltip, selector)?;
        doc.set_style_property(self.tooltip, "display", "block")
    }

    pub fn hide_tooltip(&self, doc: &mut Document) -> DomResult<()> {
        doc.set_text_content(self.tooltip, "")?;
        doc.set_style_property(self.tooltip, "display", "none")
    }

    pub fn unmount(&self, doc: &mut Document) {
        for node in [self.style, self.toolbar, self.tooltip] {
            if let Err(err) = doc.detach(node) {
                debug!(%node, error = %err, "editor chrome element already gone");
            }
        }
    }
}

/// Create a tool-owned element. Elements given a session get a
/// session-scoped id.
pub(crate) fn tool_node(
    doc: &mut Document,
    tag: &str,
    role: &str,
    session: Option<&SessionId>,
) -> DomResult<NodeId> {
    let node = doc.create_element(tag);
    if let Some(session) = session {
        doc.set_attr(node, "id", &tool_id(role, session))?;
    }
    doc.set_attr(node, "class", &tool_class(role))?;
    Ok(node)
}

/// Nearest `ACTION_ATTR` value from `node` up to (and including) `root`.
pub(crate) fn action_name_at(doc: &Document, node: NodeId, root: NodeId) -> Option<String> {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if let Some(name) = doc.attr(current, ACTION_ATTR) {
            return Some(name.to_string());
        }
        if current == root {
            break;
        }
        cursor = doc.parent(current);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolbar_buttons_map_to_actions() {
        let mut doc = Document::new();
        let session = SessionId::new();
        let chrome = EditorChrome::mount(&mut doc, &session, 0).unwrap();
        assert_eq!(chrome.count_text(&doc), "0 changes");
        chrome.refresh_count(&mut doc, 1).unwrap();
        assert_eq!(chrome.count_text(&doc), "1 change");

        let buttons = doc.element_children(chrome.toolbar);
        let undo = buttons[1];
        let label = doc.children(undo)[0];
        assert_eq!(chrome.toolbar_action_at(&doc, label), Some(ToolbarAction::Undo));
        assert_eq!(chrome.toolbar_action_at(&doc, chrome.count), None);

        chrome.unmount(&mut doc);
        assert!(!doc.is_connected(chrome.toolbar));
        assert!(!doc.is_connected(chrome.style));
    }
}
