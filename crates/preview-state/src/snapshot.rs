//! Original element state captured before a preview mutates an element.

use serde::{Deserialize, Serialize};
use variant_core_types::markers::is_marker_attr;
use variant_page_dom::{DomResult, Document, NodeId};

/// Serializable view of an element as the page had it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub text_content: String,
    pub inner_html: String,
    /// Page attributes in document order, tool markers excluded.
    pub attributes: Vec<(String, String)>,
    pub inline_style_text: String,
    pub class_list: Vec<String>,
}

impl ElementState {
    pub fn capture(doc: &Document, node: NodeId) -> DomResult<Self> {
        let attributes: Vec<(String, String)> = doc
            .attributes(node)
            .iter()
            .filter(|(name, _)| !is_marker_attr(name))
            .cloned()
            .collect();
        Ok(Self {
            text_content: doc.text_content(node),
            inner_html: doc.inner_html(node)?,
            inline_style_text: doc.attr(node, "style").unwrap_or_default().to_string(),
            class_list: doc.classes(node),
            attributes,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Put page attributes back exactly: captured ones are set, others removed.
    /// Tool markers are left for the caller to strip.
    pub fn restore_attributes(&self, doc: &mut Document, node: NodeId) -> DomResult<()> {
        let current: Vec<String> = doc
            .attributes(node)
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| !is_marker_attr(name))
            .collect();
        for name in current {
            doc.remove_attr(node, &name)?;
        }
        for (name, value) in &self.attributes {
            doc.set_attr(node, name, value)?;
        }
        Ok(())
    }

    /// Rebuild the content from serialized markup. Used when the original
    /// child nodes are not at hand.
    pub fn restore_content(&self, doc: &mut Document, node: NodeId) -> DomResult<()> {
        if doc.inner_html(node)? != self.inner_html {
            doc.set_inner_html(node, &self.inner_html)?;
        }
        Ok(())
    }
}

/// Where an element sat in the tree at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub parent: NodeId,
    pub before: Option<NodeId>,
}

impl Placement {
    pub fn capture(doc: &Document, node: NodeId) -> Option<Self> {
        let parent = doc.parent(node)?;
        let siblings = doc.children(parent);
        let before = siblings
            .iter()
            .position(|s| *s == node)
            .and_then(|pos| siblings.get(pos + 1).copied());
        Some(Self { parent, before })
    }

    pub fn holds(&self, doc: &Document, node: NodeId) -> bool {
        Self::capture(doc, node).is_some_and(|now| now == *self)
    }

    pub fn restore(&self, doc: &mut Document, node: NodeId) -> DomResult<()> {
        let before = self.before.filter(|b| doc.parent(*b) == Some(self.parent));
        doc.insert_before(self.parent, node, before)
    }
}

/// In-memory snapshot of one element under one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: ElementState,
    /// Original child nodes, reattached on revert so node identity survives.
    pub children: Vec<NodeId>,
    pub placement: Option<Placement>,
}

impl Snapshot {
    pub fn capture(doc: &Document, node: NodeId) -> DomResult<Self> {
        Ok(Self {
            state: ElementState::capture(doc, node)?,
            children: doc.children(node).to_vec(),
            placement: Placement::capture(doc, node),
        })
    }

    pub fn restore(&self, doc: &mut Document, node: NodeId) -> DomResult<()> {
        self.state.restore_attributes(doc, node)?;
        if doc.children(node) != self.children.as_slice() {
            for child in doc.children(node).to_vec() {
                doc.detach(child)?;
            }
            for child in &self.children {
                doc.append_child(node, *child)?;
            }
        }
        if let Some(placement) = self.placement {
            if !placement.holds(doc, node) {
                placement.restore(doc, node)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn state_survives_json() {
        let doc = Document::parse(r#"<p id="p" class="a b" style="color: red;">Hi <i>there</i></p>"#);
        let p = doc.query_one("#p").unwrap().unwrap();
        let state = ElementState::capture(&doc, p).unwrap();
        assert_eq!(state.text_content, "Hi there");
        assert_eq!(state.class_list, vec!["a", "b"]);
        assert_eq!(state.inline_style_text, "color: red;");
        let json = state.to_json().unwrap();
        assert!(json.contains("\"innerHtml\""));
        assert_eq!(ElementState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn markers_are_not_captured() {
        let mut doc = Document::parse(r#"<p id="p">x</p>"#);
        let p = doc.query_one("#p").unwrap().unwrap();
        doc.set_attr(p, "data-vstudio-modified", "").unwrap();
        let state = ElementState::capture(&doc, p).unwrap();
        assert_eq!(state.attributes, vec![("id".to_string(), "p".to_string())]);
    }
}
