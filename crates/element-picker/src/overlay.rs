//! Tool-owned elements of a picking session.

use tracing::debug;
use variant_core_types::markers::{tool_class, tool_id};
use variant_core_types::SessionId;
use variant_page_dom::{Document, NodeId};

use crate::errors::PickerError;

const BANNER_TEXT: &str = "Click an element to select it. Press Esc to cancel.";

const SESSION_CSS: &str = "html, body, body * { cursor: crosshair !important; }";

const OVERLAY_STYLE: &str = "position: fixed; inset: 0; z-index: 2147483645; \
     background: rgba(59, 130, 246, 0.04); pointer-events: none;";

const BANNER_STYLE: &str = "position: fixed; top: 12px; left: 50%; transform: translateX(-50%); \
     z-index: 2147483647; padding: 8px 16px; border-radius: 6px; background: #1f2937; \
     color: #fff; font: 13px sans-serif; pointer-events: none;";

const HIGHLIGHT_STYLE: &str = "position: fixed; z-index: 2147483646; \
     border: 2px solid #3b82f6; background: rgba(59, 130, 246, 0.12); pointer-events: none; \
     display: none;";

const TOOLTIP_STYLE: &str = "position: fixed; z-index: 2147483647; padding: 2px 6px; \
     background: #111827; color: #f9fafb; font: 11px monospace; pointer-events: none; \
     display: none;";

/// Overlay, banner, highlight box, tooltip and injected `<style>` of one
/// session. Ids embed the session id so a stale overlay from an earlier
/// session is never mistaken for the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOverlay {
    pub overlay: NodeId,
    pub banner: NodeId,
    pub highlight: NodeId,
    pub tooltip: NodeId,
    pub style: NodeId,
}

impl PickerOverlay {
    pub fn mount(doc: &mut Document, session: &SessionId) -> Result<Self, PickerError> {
        let body = doc.body().ok_or(PickerError::NoBody)?;

        let overlay = tool_element(doc, "div", "picker-overlay", session, OVERLAY_STYLE)?;
        let banner = tool_element(doc, "div", "picker-banner", session, BANNER_STYLE)?;
        doc.set_text_content(banner, BANNER_TEXT)?;
        let highlight = tool_element(doc, "div", "picker-highlight", session, HIGHLIGHT_STYLE)?;
        let tooltip = tool_element(doc, "div", "picker-tooltip", session, TOOLTIP_STYLE)?;
        for node in [overlay, banner, highlight, tooltip] {
            doc.append_child(body, node)?;
        }

        let style = doc.create_element("style");
        doc.set_attr(style, "id", &tool_id("picker-style", session))?;
        doc.set_text_content(style, SESSION_CSS)?;
        let style_parent = doc.head().unwrap_or(body);
        doc.append_child(style_parent, style)?;

        debug!(session = %session, "picker overlay mounted");
        Ok(Self {
            overlay,
            banner,
            highlight,
            tooltip,
            style,
        })
    }

    pub fn nodes(&self) -> [NodeId; 5] {
        [self.overlay, self.banner, self.highlight, self.tooltip, self.style]
    }

    /// Whether `node` is (inside) one of this session's elements.
    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        self.nodes().iter().any(|owned| doc.contains(*owned, node))
    }

    /// Move the highlight box over `target` and show `selector` in the
    /// tooltip. Replaces any previous highlight.
    pub fn highlight(
        &self,
        doc: &mut Document,
        target: NodeId,
        selector: &str,
    ) -> Result<(), PickerError> {
        if let Some(rect) = doc.layout(target) {
            doc.set_style_property(self.highlight, "left", &format!("{}px", rect.x))?;
            doc.set_style_property(self.highlight, "top", &format!("{}px", rect.y))?;
            doc.set_style_property(self.highlight, "width", &format!("{}px", rect.width))?;
            doc.set_style_property(self.highlight, "height", &format!("{}px", rect.height))?;
            doc.set_style_property(self.tooltip, "left", &format!("{}px", rect.x))?;
            doc.set_style_property(
                self.tooltip,
                "top",
                &format!("{}px", (rect.y - 22.0).max(0.0)),
            )?;
        }
        doc.set_style_property(self.highlight, "display", "block")?;
        doc.set_text_content(self.tooltip, selector)?;
        doc.set_style_property(self.tooltip, "display", "block")?;
        Ok(())
    }

    pub fn clear_highlight(&self, doc: &mut Document) -> Result<(), PickerError> {
        doc.set_style_property(self.highlight, "display", "none")?;
        doc.set_style_property(self.tooltip, "display", "none")?;
        doc.set_text_content(self.tooltip, "")?;
        Ok(())
    }

    /// Detach every session element. Safe when some are already gone.
    pub fn unmount(&self, doc: &mut Document) {
        for node in self.nodes() {
            if let Err(err) = doc.detach(node) {
                debug!(%node, error = %err, "overlay element already gone");
            }
        }
    }
}

fn tool_element(
    doc: &mut Document,
    tag: &str,
    role: &str,
    session: &SessionId,
    style: &str,
) -> Result<NodeId, PickerError> {
    let node = doc.create_element(tag);
    doc.set_attr(node, "id", &tool_id(role, session))?;
    doc.set_attr(node, "class", &tool_class(role))?;
    doc.set_attr(node, "style", style)?;
    Ok(node)
}
