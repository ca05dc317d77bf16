//! Floating action menu opened on the selected element.

use tracing::debug;
use variant_core_types::SessionId;
use variant_page_dom::{DomResult, Document, NodeId};

use crate::actions::MenuCommand;
use crate::chrome::{action_name_at, tool_node, ACTION_ATTR};

const MENU_STYLE: &str = "position: fixed; z-index: 2147483647; display: flex; \
     flex-direction: column; min-width: 160px; padding: 4px; border-radius: 6px; \
     background: #fff; box-shadow: 0 4px 16px rgba(0, 0, 0, 0.2); font: 13px sans-serif;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMenu {
    pub root: NodeId,
    /// Element the menu was opened for.
    pub target: NodeId,
}

impl ActionMenu {
    /// Mount the menu next to `target`. Menu ids embed a per-open counter so
    /// a click on a menu from an earlier open is recognisable.
    pub fn open(
        doc: &mut Document,
        session: &SessionId,
        target: NodeId,
        generation: u64,
    ) -> DomResult<Self> {
        let root = tool_node(doc, "div", "editor-menu", Some(session))?;
        let id = format!("{}-{generation}", doc.attr(root, "id").unwrap_or_default());
        doc.set_attr(root, "id", &id)?;
        doc.set_attr(root, "style", MENU_STYLE)?;
        if let Some(rect) = doc.layout(target) {
            doc.set_style_property(root, "left", &format!("{}px", rect.x))?;
            doc.set_style_property(root, "top", &format!("{}px", rect.bottom() + 4.0))?;
        }
        for command in MenuCommand::ALL {
            let item = tool_node(doc, "button", "editor-menu-item", None)?;
            doc.set_attr(item, ACTION_ATTR, command.name())?;
            doc.set_text_content(item, command.label())?;
            doc.append_child(root, item)?;
        }
        if let Some(body) = doc.body() {
            doc.append_child(body, root)?;
        }
        debug!(%target, "action menu opened");
        Ok(Self { root, target })
    }

    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        doc.contains(self.root, node)
    }

    pub fn command_at(&self, doc: &Document, node: NodeId) -> Option<MenuCommand> {
        if !self.contains(doc, node) {
            return None;
        }
        action_name_at(doc, node, self.root).and_then(|name| MenuCommand::from_name(&name))
    }

    pub fn close(&self, doc: &mut Document) {
        if let Err(err) = doc.detach(self.root) {
            debug!(error = %err, "action menu already gone");
        }
    }
}
