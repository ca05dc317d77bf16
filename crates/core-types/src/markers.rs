//! Names the tool writes into host pages. Revert must recognise every one of
//! them, so they are defined once here.

/// Class and id prefix identifying tool-owned elements.
pub const RESERVED_PREFIX: &str = "vstudio-";

/// Prefix shared by every marker attribute.
pub const MARKER_ATTR_PREFIX: &str = "data-vstudio-";

/// Set on elements mutated by a preview.
pub const MODIFIED_ATTR: &str = "data-vstudio-modified";

/// Preview label (experiment/variant) that owns the element's mutation.
pub const LABEL_ATTR: &str = "data-vstudio-experiment";

/// JSON-serialized original element state, written on first capture.
pub const ORIGINAL_ATTR: &str = "data-vstudio-original";

/// Set on elements created by a preview (`insert`, `duplicate`).
pub const INSERTED_ATTR: &str = "data-vstudio-inserted";

/// Editor affordance: element may be hovered and selected.
pub const EDITABLE_ATTR: &str = "data-vstudio-editable";

/// Editor affordance: element under the pointer.
pub const HOVER_ATTR: &str = "data-vstudio-hover";

/// Editor affordance: currently selected element.
pub const SELECTED_ATTR: &str = "data-vstudio-selected";

/// Marker attributes stripped by a preview revert.
pub const PREVIEW_MARKERS: [&str; 4] = [MODIFIED_ATTR, LABEL_ATTR, ORIGINAL_ATTR, INSERTED_ATTR];

/// Session affordance attributes stripped when an editor stops.
pub const EDITOR_MARKERS: [&str; 3] = [EDITABLE_ATTR, HOVER_ATTR, SELECTED_ATTR];

pub fn is_marker_attr(name: &str) -> bool {
    name.starts_with(MARKER_ATTR_PREFIX)
}

pub fn is_reserved_class(class_name: &str) -> bool {
    class_name.starts_with(RESERVED_PREFIX)
}

/// Element id for a tool-owned element of one session.
pub fn tool_id(role: &str, session: &crate::SessionId) -> String {
    format!("{RESERVED_PREFIX}{role}-{}", session.short())
}

/// Class name for a tool-owned element role.
pub fn tool_class(role: &str) -> String {
    format!("{RESERVED_PREFIX}{role}")
}
