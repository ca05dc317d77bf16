use thiserror::Error;
use variant_element_picker::PickerError;
use variant_preview::PreviewError;
use variant_visual_editor::EditorError;

/// Errors surfaced by the bridge.
#[derive(Clone, Debug, Error)]
pub enum BridgeError {
    #[error("message could not be decoded: {0}")]
    Malformed(String),
    #[error("{0} is not accepted over the page channel")]
    WrongContext(&'static str),
    #[error("host is shut down")]
    ChannelClosed,
    #[error("picker error: {0}")]
    Picker(#[from] PickerError),
    #[error("editor error: {0}")]
    Editor(#[from] EditorError),
    #[error("preview error: {0}")]
    Preview(#[from] PreviewError),
}

impl BridgeError {
    /// Rejections of the message itself, as opposed to failures while
    /// handling a valid one.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BridgeError::Malformed(_) | BridgeError::WrongContext(_))
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Malformed(err.to_string())
    }
}
