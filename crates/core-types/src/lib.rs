//! Shared primitives for the variant-studio editing core.
//!
//! Everything that crosses a crate or context boundary lives here: the
//! `DomChange` wire schema, the ordered change set with its merge rule, session
//! identifiers and the DOM marker names written into pages.

pub mod change;
pub mod changeset;
pub mod markers;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use change::{ChangeError, ChangeKind, ChangeValue, ClassOp, DomChange, InsertPosition};
pub use changeset::{ChangeSet, UpsertOutcome};

/// Identity of one picker or editor session. Overlay ids are derived from it so
/// a re-entrant event can tell its own overlay apart from a stale one.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Short form used inside element ids.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which kind of interactive session currently owns the page.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Picker,
    Editor,
}

impl SessionKind {
    pub fn name(&self) -> &'static str {
        match self {
            SessionKind::Picker => "picker",
            SessionKind::Editor => "editor",
        }
    }
}
