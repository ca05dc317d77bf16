//! CSS selector matching for the page model.
//!
//! Selectors are parsed by the `selectors` crate with scraper's parser
//! (`scraper::selector::Parser`), so the grammar is the one scraper accepts:
//! selector lists, all combinators, attribute operators with the `i` flag
//! and the tree-structural pseudo-classes (`:nth-child`, `:not()`, `:empty`,
//! `:root` and friends). Matching runs on the arena through
//! [`ElementHandle`], which implements [`selectors::Element`].

use std::fmt;

use html5ever::Namespace;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, PseudoElement, Simple};
use scraper::error::SelectorErrorKind;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{self, MatchingContext};
use selectors::parser::ParseRelative;
use selectors::{Element, OpaqueElement};

use crate::errors::{DomError, DomResult};
use crate::html::HTML_NAMESPACE;
use crate::node::{Document, ElementData, NodeData, NodeId};

/// A parsed selector group, reusable across queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(selectors::SelectorList<Simple>);

impl SelectorList {
    pub fn parse(selector: &str) -> DomResult<Self> {
        let mut input = cssparser::ParserInput::new(selector);
        let mut parser = cssparser::Parser::new(&mut input);
        selectors::SelectorList::parse(&scraper::selector::Parser, &mut parser, ParseRelative::No)
            .map(Self)
            .map_err(|err| {
                let kind = SelectorErrorKind::from(err);
                DomError::selector(format!("{selector}: {kind}"))
            })
    }

    /// Whether `node` matches any selector of the group. Non-elements never do.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = ElementHandle::new(doc, node) else {
            return false;
        };
        let mut nth_index_cache = Default::default();
        let mut context = MatchingContext::new(
            matching::MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            matching::QuirksMode::NoQuirks,
            matching::NeedsSelectorFlags::No,
            matching::IgnoreNthChildForInvalidation::No,
        );
        self.0
            .0
            .iter()
            .any(|selector| matching::matches_selector(selector, 0, None, &element, &mut context))
    }
}

/// Borrowed view of one arena element for the `selectors` matcher.
#[derive(Clone, Copy)]
pub struct ElementHandle<'a> {
    doc: &'a Document,
    id: NodeId,
    data: &'a ElementData,
}

impl<'a> ElementHandle<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Option<Self> {
        doc.element(id).map(|data| Self { doc, id, data })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    fn wrap(&self, id: Option<NodeId>) -> Option<Self> {
        id.and_then(|id| Self::new(self.doc, id))
    }
}

impl fmt::Debug for ElementHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.data.tag(), self.id)
    }
}

impl<'a> Element for ElementHandle<'a> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.data)
    }

    fn parent_element(&self) -> Option<Self> {
        self.wrap(self.doc.parent_element(self.id))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.wrap(self.doc.previous_element_sibling(self.id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.wrap(self.doc.next_element_sibling(self.id))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.wrap(self.doc.element_children(self.id).first().copied())
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        &*name.0 == self.data.tag()
    }

    fn has_namespace(&self, namespace: &Namespace) -> bool {
        &**namespace == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data.tag() == other.data.tag()
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&Namespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        // Arena attributes carry no namespace.
        if matches!(*ns, NamespaceConstraint::Specific(url) if !url.is_empty()) {
            return false;
        }
        self.data
            .attrs()
            .iter()
            .any(|(key, value)| key.as_str() == &*local_name.0 && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: matching::ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.data.tag(), "a" | "area" | "link") && self.data.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.data.tag() == "slot"
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data
            .attr("id")
            .map_or(false, |value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data.attr("class").map_or(false, |value| {
            value
                .split_ascii_whitespace()
                .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
        })
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self.doc.children(self.id).iter().any(|child| match self.doc.data(*child) {
            Some(NodeData::Element(_)) => true,
            Some(NodeData::Text(text)) => !text.is_empty(),
            _ => false,
        })
    }

    fn is_root(&self) -> bool {
        self.doc
            .parent(self.id)
            .map_or(false, |parent| matches!(self.doc.data(parent), Some(NodeData::Document)))
    }
}

// ----- document queries ------------------------------------------------------

impl Document {
    /// All connected elements matching `selector`, in document order.
    pub fn query_all(&self, selector: &str) -> DomResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .all_elements()
            .into_iter()
            .filter(|node| list.matches(self, *node))
            .collect())
    }

    pub fn query_one(&self, selector: &str) -> DomResult<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .all_elements()
            .into_iter()
            .find(|node| list.matches(self, *node)))
    }

    /// Matches among the descendants of `scope` (which may be detached).
    pub fn query_all_within(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|node| list.matches(self, *node))
            .collect())
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> DomResult<bool> {
        Ok(SelectorList::parse(selector)?.matches(self, node))
    }
}

// ----- serialization helpers -------------------------------------------------

/// Escape an identifier for use after `#` or `.` (CSSOM `CSS.escape`).
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());
    for (idx, &ch) in chars.iter().enumerate() {
        let code = ch as u32;
        if ch == '\0' {
            out.push('\u{fffd}');
        } else if (0x1..=0x1f).contains(&code)
            || code == 0x7f
            || (idx == 0 && ch.is_ascii_digit())
            || (idx == 1 && ch.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if idx == 0 && ch == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

/// Quote an attribute value for use inside `[name="..."]`.
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
