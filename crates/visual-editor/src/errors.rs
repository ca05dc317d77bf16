//! Error types for the visual editor

use thiserror::Error;
use variant_core_types::ChangeError;
use variant_page_dom::DomError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Operation needs a started session
    #[error("visual editor is not running")]
    NotStarted,

    /// Action needs a selected element
    #[error("no element is selected")]
    NoSelection,

    /// Selected element was removed from the page
    #[error("selected element is no longer in the page")]
    SelectionLost,

    /// Page has no `<body>` to mount the toolbar on
    #[error("page has no body element")]
    NoBody,

    /// Action cannot apply to the current selection
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("change rejected: {0}")]
    Change(#[from] ChangeError),

    #[error("page error: {0}")]
    Dom(#[from] DomError),
}

impl EditorError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidAction(reason.into())
    }

    /// Whether the session can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EditorError::NotStarted | EditorError::NoBody)
    }
}
