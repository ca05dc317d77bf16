//! Error types for the element picker

use thiserror::Error;
use variant_page_dom::DomError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PickerError {
    /// Page has no `<body>` to mount the overlay on
    #[error("page has no body element")]
    NoBody,

    #[error("page error: {0}")]
    Dom(#[from] DomError),
}
