//! Tool-owned element detection.
//!
//! Every picker/editor listener checks this before touching page content so
//! the tool never selects, highlights or edits its own overlay elements.

use variant_page_dom::{Document, NodeId};

/// `true` when `node` or any ancestor carries an id or class starting with
/// `reserved_prefix`. Text nodes are judged by their parent.
pub fn is_extension_owned(doc: &Document, node: NodeId, reserved_prefix: &str) -> bool {
    let mut cursor = if doc.is_element(node) {
        Some(node)
    } else {
        doc.parent_element(node)
    };
    while let Some(current) = cursor {
        if doc
            .attr(current, "id")
            .is_some_and(|id| id.starts_with(reserved_prefix))
        {
            return true;
        }
        if doc
            .classes(current)
            .iter()
            .any(|class_name| class_name.starts_with(reserved_prefix))
        {
            return true;
        }
        cursor = doc.parent_element(current);
    }
    false
}
