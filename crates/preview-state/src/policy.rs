use serde::{Deserialize, Serialize};

/// Knobs of the preview engine, loaded from the `preview` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewPolicy {
    /// Strip scripts, event handlers and script URLs from `html`/`insert`
    /// values and refuse unsafe `attribute` changes.
    pub sanitize_html: bool,
    /// Write the serialized original state onto the element on first capture,
    /// so a different manager instance can still revert it.
    pub write_original_data: bool,
    /// Preview `delete` as `display: none` instead of removing the element.
    pub mimic_delete: bool,
}

impl Default for PreviewPolicy {
    fn default() -> Self {
        Self {
            sanitize_html: true,
            write_original_data: true,
            mimic_delete: true,
        }
    }
}
