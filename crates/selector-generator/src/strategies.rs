//! Selector generation strategies
//!
//! One strategy per tier, tried in [`SelectorTier::fallback_chain`] order:
//! 1. Id - document-unique `#id`
//! 2. Class - `tag.c1.c2` over non-tool classes
//! 3. Robust - stable signals widened with ancestor context
//! 4. Path - `tag:nth-child(n)` walk towards `<body>`
//! 5. Absolute - full `nth-of-type` chain, unverified

use std::collections::VecDeque;

use tracing::{debug, warn};
use variant_page_dom::{css_escape, css_string, Document, NodeId};

use crate::errors::SelectorError;
use crate::heuristics::{is_generated_value, is_stable_class};
use crate::types::{SelectorPolicy, SelectorTier};

/// Read-only view a strategy works against.
pub struct GenerationContext<'a> {
    pub doc: &'a Document,
    pub policy: &'a SelectorPolicy,
}

impl<'a> GenerationContext<'a> {
    pub fn new(doc: &'a Document, policy: &'a SelectorPolicy) -> Self {
        Self { doc, policy }
    }

    /// Accept `candidate` only if it matches exactly `target` in the live page.
    pub fn verify(&self, candidate: &str, target: NodeId) -> Result<(), SelectorError> {
        let matches = self.doc.query_all(candidate)?;
        match matches.as_slice() {
            [only] if *only == target => Ok(()),
            [_] => Err(SelectorError::Mismatch {
                selector: candidate.to_string(),
            }),
            _ => Err(SelectorError::Ambiguous {
                selector: candidate.to_string(),
                count: matches.len(),
            }),
        }
    }

    fn tag(&self, node: NodeId) -> String {
        self.doc.tag_name(node).unwrap_or("*").to_string()
    }

    /// Own classes minus tool classes, in attribute order.
    fn page_classes(&self, node: NodeId) -> Vec<String> {
        self.doc
            .classes(node)
            .into_iter()
            .filter(|c| !c.starts_with(&self.policy.reserved_prefix))
            .collect()
    }

    fn stable_classes(&self, node: NodeId) -> Vec<String> {
        self.doc
            .classes(node)
            .into_iter()
            .filter(|c| is_stable_class(c, &self.policy.reserved_prefix))
            .collect()
    }

    fn is_body_or_root(&self, node: NodeId) -> bool {
        matches!(self.doc.tag_name(node), Some("body") | Some("html") | None)
    }

    fn nth_child_segment(&self, node: NodeId) -> String {
        let tag = self.tag(node);
        match self.doc.child_index(node) {
            Some(index) => format!("{tag}:nth-child({index})"),
            None => tag,
        }
    }

    /// Stable signals of an element in priority order, each a compound
    /// selector usable on its own.
    fn signals(&self, node: NodeId) -> Vec<String> {
        let doc = self.doc;
        let tag = self.tag(node);
        let mut out = Vec::new();

        for name in &self.policy.stable_attributes {
            let Some(value) = doc.attr(node, name).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let fragment = format!("[{}={}]", css_escape(name), css_string(value));
            if name.starts_with("data-") {
                out.push(fragment);
            } else {
                out.push(format!("{tag}{fragment}"));
            }
        }

        if let (Some(role), Some(label)) = (doc.attr(node, "role"), doc.attr(node, "aria-label")) {
            if !role.is_empty() && !label.is_empty() {
                out.push(format!(
                    "{tag}[role={}][aria-label={}]",
                    css_string(role),
                    css_string(label)
                ));
            }
        }

        let marker_prefix = self.policy.marker_attr_prefix();
        for (name, value) in doc.attributes(node) {
            if !name.starts_with("data-")
                || name.starts_with(&marker_prefix)
                || self.policy.stable_attributes.contains(name)
            {
                continue;
            }
            if value.is_empty() {
                out.push(format!("{tag}[{}]", css_escape(name)));
            } else if !is_generated_value(value) {
                out.push(format!("{tag}[{}={}]", css_escape(name), css_string(value)));
            }
        }

        let classes = self.stable_classes(node);
        if !classes.is_empty() {
            out.push(format!("{tag}{}", class_suffix(&classes)));
        }
        out
    }

    /// How an ancestor is written inside a robust-tier prefix.
    fn ancestor_segment(&self, node: NodeId) -> String {
        if let Some(id) = self.doc.id_attr(node) {
            let candidate = format!("#{}", css_escape(id));
            if self.doc.query_all(&candidate).map(|m| m.len() == 1).unwrap_or(false) {
                return candidate;
            }
        }
        self.signals(node)
            .into_iter()
            .next()
            .unwrap_or_else(|| self.nth_child_segment(node))
    }
}

fn class_suffix(classes: &[String]) -> String {
    classes.iter().map(|c| format!(".{}", css_escape(c))).collect()
}

/// One tier of the generator.
pub trait Strategy: Send + Sync {
    /// Produce a selector for `target` or explain why this tier cannot.
    fn generate(&self, ctx: &GenerationContext<'_>, target: NodeId) -> Result<String, SelectorError>;

    fn tier(&self) -> SelectorTier;

    fn name(&self) -> &'static str {
        self.tier().name()
    }
}

pub struct IdStrategy;

impl Strategy for IdStrategy {
    fn generate(&self, ctx: &GenerationContext<'_>, target: NodeId) -> Result<String, SelectorError> {
        let id = ctx
            .doc
            .id_attr(target)
            .filter(|id| !id.starts_with(&ctx.policy.reserved_prefix))
            .ok_or(SelectorError::NoCandidate {
                tier: self.name(),
                node: target,
            })?;
        let candidate = format!("#{}", css_escape(id));
        ctx.verify(&candidate, target)?;
        Ok(candidate)
    }

    fn tier(&self) -> SelectorTier {
        SelectorTier::Id
    }
}

pub struct ClassStrategy;

impl Strategy for ClassStrategy {
    fn generate(&self, ctx: &GenerationContext<'_>, target: NodeId) -> Result<String, SelectorError> {
        let classes = ctx.page_classes(target);
        if classes.is_empty() {
            return Err(SelectorError::NoCandidate {
                tier: self.name(),
                node: target,
            });
        }
        let candidate = format!("{}{}", ctx.tag(target), class_suffix(&classes));
        ctx.verify(&candidate, target)?;
        Ok(candidate)
    }

    fn tier(&self) -> SelectorTier {
        SelectorTier::Class
    }
}

pub struct RobustStrategy;

impl Strategy for RobustStrategy {
    fn generate(&self, ctx: &GenerationContext<'_>, target: NodeId) -> Result<String, SelectorError> {
        let signals = ctx.signals(target);
        if signals.is_empty() {
            return Err(SelectorError::NoCandidate {
                tier: self.name(),
                node: target,
            });
        }

        // Ancestors below <body>, nearest first.
        let ancestors: Vec<NodeId> = ctx
            .doc
            .ancestors(target)
            .into_iter()
            .take_while(|a| !ctx.is_body_or_root(*a))
            .take(ctx.policy.max_ancestor_depth)
            .collect();
        let segments: Vec<String> = ancestors.iter().map(|a| ctx.ancestor_segment(*a)).collect();

        let mut last_error = None;
        for signal in &signals {
            for depth in 0..=segments.len() {
                let candidate = if depth == 0 {
                    signal.clone()
                } else {
                    let mut prefix: Vec<&str> =
                        segments[..depth].iter().rev().map(String::as_str).collect();
                    prefix.push(signal);
                    prefix.join(" > ")
                };
                match ctx.verify(&candidate, target) {
                    Ok(()) => return Ok(candidate),
                    Err(err) => {
                        debug!(candidate = %candidate, error = %err, "robust candidate rejected");
                        last_error = Some(err);
                    }
                }
            }
        }
        Err(last_error.unwrap_or(SelectorError::NoCandidate {
            tier: self.name(),
            node: target,
        }))
    }

    fn tier(&self) -> SelectorTier {
        SelectorTier::Robust
    }
}

pub struct PathStrategy;

impl Strategy for PathStrategy {
    fn generate(&self, ctx: &GenerationContext<'_>, target: NodeId) -> Result<String, SelectorError> {
        let mut segments: VecDeque<String> = VecDeque::new();
        let mut cursor = Some(target);
        let mut last_error = None;

        while let Some(current) = cursor.filter(|c| !ctx.is_body_or_root(*c)) {
            let segment = if ctx.doc.same_tag_siblings(current) > 0 {
                ctx.nth_child_segment(current)
            } else {
                ctx.tag(current)
            };
            segments.push_front(segment);
            let candidate = segments.iter().map(String::as_str).collect::<Vec<_>>().join(" > ");
            match ctx.verify(&candidate, target) {
                Ok(()) => return Ok(candidate),
                Err(err) => last_error = Some(err),
            }
            cursor = ctx.doc.parent_element(current);
        }

        if cursor.is_some_and(|c| ctx.doc.tag_name(c) == Some("body")) && !segments.is_empty() {
            segments.push_front("body".to_string());
            let candidate = segments.iter().map(String::as_str).collect::<Vec<_>>().join(" > ");
            match ctx.verify(&candidate, target) {
                Ok(()) => return Ok(candidate),
                Err(err) => last_error = Some(err),
            }
        }

        Err(last_error.unwrap_or(SelectorError::NoCandidate {
            tier: self.name(),
            node: target,
        }))
    }

    fn tier(&self) -> SelectorTier {
        SelectorTier::Path
    }
}

pub struct AbsoluteStrategy;

impl AbsoluteStrategy {
    /// `nth-of-type` chain from the topmost element ancestor (the `html`
    /// element for connected nodes) down to `target`.
    pub fn chain(doc: &Document, target: NodeId) -> String {
        let mut path: Vec<NodeId> = doc.ancestors(target);
        path.reverse();
        path.push(target);
        path.iter()
            .map(|node| {
                let tag = doc.tag_name(*node).unwrap_or("*");
                let top_level = doc.parent_element(*node).is_none();
                match doc.type_index(*node) {
                    Some(index) if !top_level && tag != "body" && tag != "head" => {
                        format!("{tag}:nth-of-type({index})")
                    }
                    _ => tag.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl Strategy for AbsoluteStrategy {
    fn generate(&self, ctx: &GenerationContext<'_>, target: NodeId) -> Result<String, SelectorError> {
        let chain = Self::chain(ctx.doc, target);
        warn!(selector = %chain, "falling back to absolute selector path");
        Ok(chain)
    }

    fn tier(&self) -> SelectorTier {
        SelectorTier::Absolute
    }
}

/// Strategy implementing `tier`.
pub fn strategy_for(tier: SelectorTier) -> Box<dyn Strategy> {
    match tier {
        SelectorTier::Id => Box::new(IdStrategy),
        SelectorTier::Class => Box::new(ClassStrategy),
        SelectorTier::Robust => Box::new(RobustStrategy),
        SelectorTier::Path => Box::new(PathStrategy),
        SelectorTier::Absolute => Box::new(AbsoluteStrategy),
    }
}
