//! HTML parsing and serialization, both through html5ever (`scraper` for
//! the tree builder, html5ever's serializer for output).

use std::io;

use ego_tree::NodeRef;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use scraper::Html;
use tracing::{debug, warn};

use crate::errors::{DomError, DomResult};
use crate::node::{Document, NodeData, NodeId};

pub(crate) const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

impl Document {
    /// Parse a full HTML document. html5ever never fails; malformed markup is
    /// recovered the way a browser would.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::bare();
        let root = doc.root;
        for child in parsed.tree.root().children() {
            if let Some(node) = doc.import_scraper_node(child) {
                // Top-level nodes are attached straight to the document node.
                let _ = doc.append_child(root, node);
            }
        }
        if doc.body().is_none() {
            debug!("parsed document has no body; rebuilding skeleton");
            let mut fresh = Document::new();
            if let Some(body) = fresh.body() {
                for node in fresh.import_fragment(html) {
                    let _ = fresh.append_child(body, node);
                }
            }
            return fresh;
        }
        doc
    }

    /// Parse an HTML fragment (body context) into detached nodes.
    pub fn import_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let parsed = Html::parse_fragment(html);
        let mut out = Vec::new();
        for child in parsed.tree.root().children() {
            match child.value() {
                scraper::Node::Element(element) if element.name() == "html" => {
                    for inner in child.children() {
                        if let Some(node) = self.import_scraper_node(inner) {
                            out.push(node);
                        }
                    }
                }
                _ => {
                    if let Some(node) = self.import_scraper_node(child) {
                        out.push(node);
                    }
                }
            }
        }
        out
    }

    fn import_scraper_node(&mut self, source: NodeRef<'_, scraper::Node>) -> Option<NodeId> {
        let data = match source.value() {
            scraper::Node::Element(element) => {
                let id = self.create_element(element.name());
                for (name, value) in element.attrs() {
                    let _ = self.set_attr(id, name, value);
                }
                id
            }
            scraper::Node::Text(text) => self.create_text(&text.text),
            scraper::Node::Comment(comment) => {
                self.push_node(NodeData::Comment(String::from(&*comment.comment)))
            }
            _ => return None,
        };
        for child in source.children() {
            if let Some(node) = self.import_scraper_node(child) {
                let _ = self.append_child(data, node);
            }
        }
        Some(data)
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>");
        out.push_str(&self.render(self.root, TraversalScope::ChildrenOnly(None)));
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        self.render(id, TraversalScope::IncludeNode)
    }

    pub fn inner_html(&self, id: NodeId) -> DomResult<String> {
        let element = self.element(id).ok_or(DomError::NotAnElement(id))?;
        // The context name switches html5ever to raw text inside script/style.
        let context = html_name(element.tag());
        Ok(self.render(id, TraversalScope::ChildrenOnly(Some(context))))
    }

    fn render(&self, id: NodeId, traversal_scope: TraversalScope) -> String {
        let mut buf = Vec::new();
        let opts = SerializeOpts {
            traversal_scope,
            ..Default::default()
        };
        if let Err(err) = serialize(&mut buf, &Subtree { doc: self, id }, opts) {
            warn!(node = %id, error = %err, "html serialization stopped early");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// A node and everything under it, as html5ever sees it.
struct Subtree<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl Serialize for Subtree<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        match traversal_scope {
            TraversalScope::IncludeNode => write_node(self.doc, self.id, serializer),
            TraversalScope::ChildrenOnly(_) => self
                .doc
                .children(self.id)
                .iter()
                .try_for_each(|child| write_node(self.doc, *child, serializer)),
        }
    }
}

fn write_node<S: Serializer>(doc: &Document, id: NodeId, serializer: &mut S) -> io::Result<()> {
    match doc.data(id) {
        Some(NodeData::Element(element)) => {
            let name = html_name(element.tag());
            let attr_names: Vec<QualName> = element
                .attrs()
                .iter()
                .map(|(key, _)| {
                    QualName::new(None, Namespace::from(""), LocalName::from(key.as_str()))
                })
                .collect();
            let attrs = attr_names
                .iter()
                .zip(element.attrs())
                .map(|(key, (_, value))| (key, value.as_str()));
            serializer.start_elem(name.clone(), attrs)?;
            for child in doc.children(id) {
                write_node(doc, *child, serializer)?;
            }
            serializer.end_elem(name)
        }
        Some(NodeData::Text(text)) => serializer.write_text(text),
        Some(NodeData::Comment(comment)) => serializer.write_comment(comment),
        Some(NodeData::Document) => doc
            .children(id)
            .iter()
            .try_for_each(|child| write_node(doc, *child, serializer)),
        None => Ok(()),
    }
}

fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_into_skeleton() {
        let doc = Document::parse("<p id=x>Hi <b>there</b></p>");
        let body = doc.body().unwrap();
        let p = doc.element_children(body)[0];
        assert_eq!(doc.attr(p, "id"), Some("x"));
        assert_eq!(doc.text_content(p), "Hi there");
        assert!(doc.head().is_some());
    }

    #[test]
    fn inner_html_round_trips() {
        let mut doc = Document::parse("<div id=a></div>");
        let div = doc.element_children(doc.body().unwrap())[0];
        doc.set_inner_html(div, "<span class=\"k\">a &amp; b</span><br>tail")
            .unwrap();
        assert_eq!(
            doc.inner_html(div).unwrap(),
            "<span class=\"k\">a &amp; b</span><br>tail"
        );
    }

    #[test]
    fn escapes_attribute_quotes() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let el = doc.create_element("div");
        doc.set_attr(el, "title", "say \"hi\"").unwrap();
        doc.append_child(body, el).unwrap();
        assert_eq!(doc.outer_html(el), "<div title=\"say &quot;hi&quot;\"></div>");
    }

    #[test]
    fn raw_text_and_void_elements_serialize_like_a_browser() {
        let mut doc = Document::parse("<div id=a></div>");
        let div = doc.element_children(doc.body().unwrap())[0];
        doc.set_inner_html(div, "<script>if (a < b && c) {}</script><img src=x><hr>")
            .unwrap();
        assert_eq!(
            doc.inner_html(div).unwrap(),
            "<script>if (a < b && c) {}</script><img src=\"x\"><hr>"
        );
        let script = doc.element_children(div)[0];
        assert_eq!(doc.inner_html(script).unwrap(), "if (a < b && c) {}");
        assert!(doc.to_html().starts_with("<!DOCTYPE html><html><head></head><body>"));
    }

    #[test]
    fn fragment_nodes_start_detached() {
        let mut doc = Document::new();
        let nodes = doc.import_fragment("<li>a</li><li>b</li>");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| !doc.is_connected(*n)));
    }
}
