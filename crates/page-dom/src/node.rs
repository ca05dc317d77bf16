//! Arena-backed document tree.
//!
//! Nodes are never freed: removing a node detaches it (its `parent` becomes
//! `None`) so ids held by sessions stay valid and can be checked with
//! [`Document::is_connected`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DomError, DomResult};
use crate::events::ListenerRegistry;
use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    pub(crate) fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(idx).1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
    pub(crate) layout: Option<Rect>,
}

/// Where to place a node relative to a reference element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjacent {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) listeners: ListenerRegistry,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with `html`, `head` and `body`.
    pub fn new() -> Self {
        let mut doc = Self::bare();
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.attach(doc.root, html, None);
        doc.attach(html, head, None);
        doc.attach(html, body, None);
        doc
    }

    pub(crate) fn bare() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
                layout: None,
            }],
            root: NodeId(0),
            listeners: ListenerRegistry::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root).into_iter().next()
    }

    pub fn head(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .into_iter()
            .find(|id| self.tag_name(*id) == Some("head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .into_iter()
            .find(|id| self.tag_name(*id) == Some("body"))
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|node| &node.data)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id).map(|node| &node.data) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.data) {
            Some(NodeData::Element(element)) => Ok(element),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag)
    }

    // ----- attributes -------------------------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|element| element.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id).map(ElementData::attrs).unwrap_or(&[])
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self.element_mut(id)?.remove_attr(name))
    }

    pub fn id_attr(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id").filter(|value| !value.is_empty())
    }

    // ----- class list -------------------------------------------------------

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.attr(id, "class")
            .map(|value| {
                let mut out: Vec<String> = Vec::new();
                for token in value.split_ascii_whitespace() {
                    if !out.iter().any(|existing| existing == token) {
                        out.push(token.to_string());
                    }
                }
                out
            })
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.attr(id, "class")
            .map(|value| value.split_ascii_whitespace().any(|c| c == class_name))
            .unwrap_or(false)
    }

    /// Returns `true` when the class was not present before.
    pub fn add_class(&mut self, id: NodeId, class_name: &str) -> DomResult<bool> {
        let mut classes = self.classes(id);
        if classes.iter().any(|c| c == class_name) {
            self.element_mut(id)?;
            return Ok(false);
        }
        classes.push(class_name.to_string());
        self.set_classes(id, &classes)?;
        Ok(true)
    }

    /// Returns `true` when the class was present.
    pub fn remove_class(&mut self, id: NodeId, class_name: &str) -> DomResult<bool> {
        let mut classes = self.classes(id);
        let before = classes.len();
        classes.retain(|c| c != class_name);
        if classes.len() == before {
            self.element_mut(id)?;
            return Ok(false);
        }
        self.set_classes(id, &classes)?;
        Ok(true)
    }

    /// Replace the class list; an empty list removes the attribute.
    pub fn set_classes(&mut self, id: NodeId, classes: &[String]) -> DomResult<()> {
        let element = self.element_mut(id)?;
        if classes.is_empty() {
            element.remove_attr("class");
        } else {
            element.set_attr("class", &classes.join(" "));
        }
        Ok(())
    }

    // ----- tree navigation --------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Parent only when it is an element (not the document node).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|parent| self.is_element(*parent))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Element ancestors from the parent upward.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_element(id);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent_element(current);
        }
        out
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|s| self.is_element(*s))
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|s| self.is_element(*s))
    }

    /// 1-based position among element siblings, as `:nth-child` counts.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.element_children(parent)
            .iter()
            .position(|s| *s == id)
            .map(|pos| pos + 1)
    }

    /// 1-based position among same-tag siblings, as `:nth-of-type` counts.
    pub fn type_index(&self, id: NodeId) -> Option<usize> {
        let tag = self.tag_name(id)?;
        let parent = self.parent(id)?;
        self.element_children(parent)
            .iter()
            .filter(|s| self.tag_name(**s) == Some(tag))
            .position(|s| *s == id)
            .map(|pos| pos + 1)
    }

    /// Number of element siblings (excluding `id`) sharing its tag.
    pub fn same_tag_siblings(&self, id: NodeId) -> usize {
        let (Some(tag), Some(parent)) = (self.tag_name(id), self.parent(id)) else {
            return 0;
        };
        self.element_children(parent)
            .iter()
            .filter(|s| **s != id && self.tag_name(**s) == Some(tag))
            .count()
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Inclusive containment check.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Topmost ancestor of a node (the document root when connected).
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Connected elements in document order.
    pub fn all_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(self.root, &mut out);
        out
    }

    /// Elements below `id` (exclusive) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.children(id) {
            self.collect_elements(*child, &mut out);
        }
        out
    }

    pub(crate) fn collect_elements(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.is_element(id) {
            out.push(id);
        }
        for child in self.children(id) {
            self.collect_elements(*child, out);
        }
    }

    // ----- construction and mutation ----------------------------------------

    pub(crate) fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
            layout: None,
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()))
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(idx) if idx <= children.len() => children.insert(idx, child),
            _ => children.push(child),
        }
    }

    /// Remove a node from its parent. A detached node is left alone.
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        if !self.contains_node(id) {
            return Err(DomError::UnknownNode(id));
        }
        if id == self.root {
            return Err(DomError::HierarchyRequest("cannot detach the document".into()));
        }
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.contains_node(parent) {
            return Err(DomError::UnknownNode(parent));
        }
        if !self.contains_node(child) {
            return Err(DomError::UnknownNode(child));
        }
        if matches!(self.nodes[parent.0].data, NodeData::Text(_) | NodeData::Comment(_)) {
            return Err(DomError::HierarchyRequest(format!(
                "{parent} cannot have children"
            )));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest(format!(
                "{child} is an ancestor of {parent}"
            )));
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.attach(parent, child, None);
        Ok(())
    }

    /// Insert `child` before `reference` (or append when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_insert(parent, child)?;
        if reference == Some(child) {
            return Ok(());
        }
        self.detach(child)?;
        let index = match reference {
            Some(reference) => Some(
                self.children(parent)
                    .iter()
                    .position(|c| *c == reference)
                    .ok_or_else(|| {
                        DomError::HierarchyRequest(format!("{reference} is not a child of {parent}"))
                    })?,
            ),
            None => None,
        };
        self.attach(parent, child, index);
        Ok(())
    }

    /// Place `node` relative to `reference`, mirroring `insertAdjacentElement`.
    pub fn insert_adjacent(
        &mut self,
        reference: NodeId,
        position: Adjacent,
        node: NodeId,
    ) -> DomResult<()> {
        match position {
            Adjacent::AfterBegin => {
                let first = self.children(reference).first().copied();
                self.insert_before(reference, node, first)
            }
            Adjacent::BeforeEnd => self.append_child(reference, node),
            Adjacent::BeforeBegin | Adjacent::AfterEnd => {
                let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
                let next = if position == Adjacent::BeforeBegin {
                    Some(reference)
                } else {
                    let siblings = self.children(parent);
                    siblings
                        .iter()
                        .position(|c| *c == reference)
                        .and_then(|pos| siblings.get(pos + 1).copied())
                };
                self.insert_before(parent, node, next)
            }
        }
    }

    /// Detached deep copy of a subtree.
    pub fn deep_clone(&mut self, id: NodeId) -> DomResult<NodeId> {
        let node = self.node(id).ok_or(DomError::UnknownNode(id))?;
        if matches!(node.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest("cannot clone the document".into()));
        }
        let data = node.data.clone();
        let layout = node.layout;
        let children = node.children.clone();
        let copy = self.push_node(data);
        self.nodes[copy.0].layout = layout;
        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.attach(copy, child_copy, None);
        }
        Ok(copy)
    }

    fn clear_children(&mut self, id: NodeId) {
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
    }

    // ----- text -------------------------------------------------------------

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element(_)) | Some(NodeData::Document) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            Some(NodeData::Comment(_)) | None => {}
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        self.element_mut(id)?;
        self.clear_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.attach(id, node, None);
        }
        Ok(())
    }

    /// Replace all children with parsed HTML. Callers feeding untrusted input
    /// must sanitize it first.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> DomResult<Vec<NodeId>> {
        self.element_mut(id)?;
        let fragment = self.import_fragment(html);
        self.clear_children(id);
        for node in &fragment {
            self.attach(id, *node, None);
        }
        Ok(fragment)
    }

    // ----- layout -----------------------------------------------------------

    pub fn layout(&self, id: NodeId) -> Option<Rect> {
        self.node(id).and_then(|node| node.layout)
    }

    pub fn set_layout(&mut self, id: NodeId, rect: Rect) -> DomResult<()> {
        let node = self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))?;
        node.layout = Some(rect);
        Ok(())
    }

    pub fn clear_layout(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.layout = None;
        }
    }
}
