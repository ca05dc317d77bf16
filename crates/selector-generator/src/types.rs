//! Core types for selector generation

use serde::{Deserialize, Serialize};
use variant_core_types::markers::RESERVED_PREFIX;

use crate::errors::SelectorError;

/// Generation tiers, strongest first.
///
/// - Id: document-unique `#id`
/// - Class: `tag.c1.c2` over the element's own (non-tool) classes
/// - Robust: stable signal attributes/classes, widened with ancestor context
/// - Path: `tag:nth-child(n)` segments walked up towards `<body>`
/// - Absolute: full `nth-of-type` chain, accepted unverified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorTier {
    Id,
    Class,
    Robust,
    Path,
    Absolute,
}

impl SelectorTier {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorTier::Id => "id",
            SelectorTier::Class => "class",
            SelectorTier::Robust => "robust",
            SelectorTier::Path => "path",
            SelectorTier::Absolute => "absolute",
        }
    }

    /// All tiers in fallback order.
    pub fn fallback_chain() -> Vec<SelectorTier> {
        vec![
            SelectorTier::Id,
            SelectorTier::Class,
            SelectorTier::Robust,
            SelectorTier::Path,
            SelectorTier::Absolute,
        ]
    }

    /// The last tier is accepted without re-checking uniqueness.
    pub fn is_degraded(&self) -> bool {
        matches!(self, SelectorTier::Absolute)
    }
}

/// Result of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSelector {
    pub selector: String,
    pub tier: SelectorTier,
    /// `true` when the selector was re-checked against the live page and
    /// matched exactly the target.
    pub verified: bool,
}

/// Tunables for the robust tier and tool-element exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorPolicy {
    /// Maximum number of ancestor levels the robust tier prefixes.
    pub max_ancestor_depth: usize,
    /// Attributes treated as stable signals, in priority order.
    pub stable_attributes: Vec<String>,
    /// Class/id prefix of tool-owned elements.
    pub reserved_prefix: String,
}

impl Default for SelectorPolicy {
    fn default() -> Self {
        Self {
            max_ancestor_depth: 8,
            stable_attributes: ["data-testid", "data-test", "data-cy", "data-qa", "name", "aria-label"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reserved_prefix: RESERVED_PREFIX.to_string(),
        }
    }
}

impl SelectorPolicy {
    pub fn with_max_ancestor_depth(mut self, depth: usize) -> Self {
        self.max_ancestor_depth = depth;
        self
    }

    /// Prefix of the marker attributes the tool writes (`data-<prefix>`).
    pub fn marker_attr_prefix(&self) -> String {
        format!("data-{}", self.reserved_prefix)
    }

    pub fn validate(&self) -> Result<(), SelectorError> {
        if self.reserved_prefix.trim().is_empty() {
            return Err(SelectorError::Policy("reserved_prefix must not be empty".into()));
        }
        if !(1..=32).contains(&self.max_ancestor_depth) {
            return Err(SelectorError::Policy(format!(
                "max_ancestor_depth must be within 1..=32, got {}",
                self.max_ancestor_depth
            )));
        }
        if self.stable_attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(SelectorError::Policy("stable_attributes contains an empty name".into()));
        }
        Ok(())
    }
}
