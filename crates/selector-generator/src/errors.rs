//! Error types for selector generation

use thiserror::Error;
use variant_page_dom::{DomError, NodeId};

/// Failure of a single generation tier. These never leave
/// [`SelectorGenerator::generate`](crate::SelectorGenerator::generate); the
/// generator logs them and moves on to the next tier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Tier has nothing to offer for this element
    #[error("tier '{tier}' has no candidate for {node}")]
    NoCandidate { tier: &'static str, node: NodeId },

    /// Candidate matches more than one element
    #[error("selector '{selector}' matches {count} elements")]
    Ambiguous { selector: String, count: usize },

    /// Candidate matches exactly one element, but not the target
    #[error("selector '{selector}' resolves to a different element")]
    Mismatch { selector: String },

    /// Candidate could not be parsed by the page's selector engine
    #[error("invalid candidate: {0}")]
    Invalid(#[from] DomError),

    /// Generation policy is unusable
    #[error("invalid selector policy: {0}")]
    Policy(String),
}

impl SelectorError {
    /// Whether a later tier may still succeed for the same element.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SelectorError::Policy(_))
    }
}
