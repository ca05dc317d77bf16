//! Error types for preview application

use thiserror::Error;
use variant_core_types::ChangeError;
use variant_page_dom::DomError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// Preview label is empty
    #[error("preview label must not be empty")]
    EmptyLabel,

    /// Change selector does not parse
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: DomError },

    /// Move destination did not match any element
    #[error("move target '{selector}' matched nothing")]
    MissingTarget { selector: String },

    /// Change was refused by the sanitizer policy
    #[error("unsafe change rejected: {0}")]
    Unsafe(String),

    #[error("malformed change: {0}")]
    Change(#[from] ChangeError),

    #[error("page error: {0}")]
    Dom(#[from] DomError),
}

impl PreviewError {
    pub fn invalid_selector(selector: impl Into<String>, reason: DomError) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason,
        }
    }

    pub fn missing_target(selector: impl Into<String>) -> Self {
        Self::MissingTarget {
            selector: selector.into(),
        }
    }

    /// Failures that depend on the current page and may succeed against a
    /// later state of it.
    pub fn is_retryable(&self) -> bool {
        match self {
            PreviewError::MissingTarget { .. } => true,
            PreviewError::Dom(err) => err.is_stale_node(),
            _ => false,
        }
    }
}
