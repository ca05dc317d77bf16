//! Inverse operations captured when a change is recorded, so undo can put
//! the live page back the way it was.

use variant_core_types::markers::is_marker_attr;
use variant_page_dom::{DomResult, Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InverseOp {
    /// Change was not made by this session (seeded); nothing to revert.
    Nothing,
    /// Restore attributes and the original child nodes.
    RestoreElement {
        node: NodeId,
        attrs: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    /// Restore attributes only (style, class, attribute, hide).
    RestoreAttributes {
        node: NodeId,
        attrs: Vec<(String, String)>,
    },
    /// Put a moved or removed node back in its old slot.
    Reinsert {
        node: NodeId,
        parent: NodeId,
        before: Option<NodeId>,
    },
    /// Take out a node the change created.
    Detach { node: NodeId },
}

impl InverseOp {
    pub fn capture_element(doc: &Document, node: NodeId) -> Self {
        InverseOp::RestoreElement {
            node,
            attrs: page_attrs(doc, node),
            children: doc.children(node).to_vec(),
        }
    }

    pub fn capture_attributes(doc: &Document, node: NodeId) -> Self {
        InverseOp::RestoreAttributes {
            node,
            attrs: page_attrs(doc, node),
        }
    }

    /// Slot of `node` right now; `None` when it has no parent.
    pub fn capture_position(doc: &Document, node: NodeId) -> Option<Self> {
        let parent = doc.parent(node)?;
        let siblings = doc.children(parent);
        let before = siblings
            .iter()
            .position(|s| *s == node)
            .and_then(|pos| siblings.get(pos + 1).copied());
        Some(InverseOp::Reinsert {
            node,
            parent,
            before,
        })
    }

    pub fn apply(&self, doc: &mut Document) -> DomResult<()> {
        match self {
            InverseOp::Nothing => Ok(()),
            InverseOp::RestoreElement {
                node,
                attrs,
                children,
            } => {
                restore_attrs(doc, *node, attrs)?;
                for child in doc.children(*node).to_vec() {
                    doc.detach(child)?;
                }
                for child in children {
                    doc.append_child(*node, *child)?;
                }
                Ok(())
            }
            InverseOp::RestoreAttributes { node, attrs } => restore_attrs(doc, *node, attrs),
            InverseOp::Reinsert {
                node,
                parent,
                before,
            } => {
                // The old next sibling may itself have moved since.
                let before = before.filter(|b| doc.parent(*b) == Some(*parent));
                doc.insert_before(*parent, *node, before)
            }
            InverseOp::Detach { node } => doc.detach(*node),
        }
    }
}

/// Attributes minus the tool's own markers.
fn page_attrs(doc: &Document, node: NodeId) -> Vec<(String, String)> {
    doc.attributes(node)
        .iter()
        .filter(|(name, _)| !is_marker_attr(name))
        .cloned()
        .collect()
}

/// Reset page attributes to `attrs`, leaving tool markers as they are now.
fn restore_attrs(doc: &mut Document, node: NodeId, attrs: &[(String, String)]) -> DomResult<()> {
    let current: Vec<String> = doc
        .attributes(node)
        .iter()
        .map(|(name, _)| name.clone())
        .filter(|name| !is_marker_attr(name))
        .collect();
    for name in current {
        doc.remove_attr(node, &name)?;
    }
    for (name, value) in attrs {
        doc.set_attr(node, name, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_element_brings_back_children() {
        let mut doc = Document::parse(r#"<p id="p" class="a">Hello <b>world</b></p>"#);
        let p = doc.query_one("#p").unwrap().unwrap();
        let inverse = InverseOp::capture_element(&doc, p);
        doc.set_text_content(p, "Bye").unwrap();
        doc.set_attr(p, "class", "b").unwrap();
        doc.set_attr(p, "data-vstudio-selected", "").unwrap();
        inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.inner_html(p).unwrap(), "Hello <b>world</b>");
        assert_eq!(doc.attr(p, "class"), Some("a"));
        assert!(doc.has_attr(p, "data-vstudio-selected"));
    }

    #[test]
    fn reinsert_restores_slot() {
        let mut doc = Document::parse("<ul><li>1</li><li>2</li><li>3</li></ul>");
        let items = doc.query_all("li").unwrap();
        let inverse = InverseOp::capture_position(&doc, items[1]).unwrap();
        doc.detach(items[1]).unwrap();
        inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.query_all("li").unwrap(), items);
    }
}
