//! HTML sanitizer for `html` and `insert` change values.
//!
//! Markup is parsed into a scratch document, never executed: blocked
//! elements are dropped with their content, event-handler attributes are
//! removed and URL attributes pointing at script schemes are cleared.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use variant_page_dom::{Document, NodeId};

static SCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(javascript|vbscript|livescript):").expect("valid scheme regex"));

static SAFE_DATA_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^data:image/(png|gif|jpe?g|webp|avif|bmp);").expect("valid data url regex")
});

const BLOCKED_ELEMENTS: [&str; 10] = [
    "script", "iframe", "frame", "frameset", "object", "embed", "applet", "base", "meta", "link",
];

const URL_ATTRIBUTES: [&str; 8] = [
    "href",
    "src",
    "action",
    "formaction",
    "xlink:href",
    "poster",
    "background",
    "lowsrc",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub removed_elements: usize,
    pub removed_attributes: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self.removed_elements == 0 && self.removed_attributes == 0
    }
}

/// True for attribute names that run script when the page handles events.
pub fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.get(..2).is_some_and(|head| head.eq_ignore_ascii_case("on"))
}

/// True when `value` of a URL attribute would execute script or embed a
/// document.
pub fn is_unsafe_url(value: &str) -> bool {
    // Browsers ignore whitespace and control characters inside the scheme.
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();
    if SCRIPT_SCHEME.is_match(&compact) {
        return true;
    }
    let is_data = compact
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"));
    is_data && !SAFE_DATA_URL.is_match(&compact)
}

/// Whether setting `name="value"` on an element is safe.
pub fn is_safe_attribute(name: &str, value: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if is_event_handler(&name) || name == "srcdoc" {
        return false;
    }
    !(URL_ATTRIBUTES.contains(&name.as_str()) && is_unsafe_url(value))
}

/// Clean markup and return it re-serialized.
pub fn sanitize_html(html: &str) -> String {
    let mut scratch = Document::new();
    let Some(container) = scratch.body() else {
        return String::new();
    };
    for node in scratch.import_fragment(html) {
        let _ = scratch.append_child(container, node);
    }
    let report = sanitize_subtree(&mut scratch, container);
    if !report.is_clean() {
        debug!(
            removed_elements = report.removed_elements,
            removed_attributes = report.removed_attributes,
            "sanitized html value"
        );
    }
    scratch.inner_html(container).unwrap_or_default()
}

/// Clean every element below `root` in place.
pub fn sanitize_subtree(doc: &mut Document, root: NodeId) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    for node in doc.descendants(root) {
        if !doc.contains(root, node) {
            // Inside a subtree that was already dropped.
            continue;
        }
        let blocked = doc
            .tag_name(node)
            .is_some_and(|tag| BLOCKED_ELEMENTS.contains(&tag));
        if blocked {
            if doc.detach(node).is_ok() {
                report.removed_elements += 1;
            }
            continue;
        }
        let unsafe_attrs: Vec<String> = doc
            .attributes(node)
            .iter()
            .filter(|(name, value)| !is_safe_attribute(name, value))
            .map(|(name, _)| name.clone())
            .collect();
        for name in unsafe_attrs {
            if doc.remove_attr(node, &name).is_ok() {
                report.removed_attributes += 1;
            }
        }
    }
    report
}
