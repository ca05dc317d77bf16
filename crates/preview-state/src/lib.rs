//! Preview engine: applies `DomChange` batches to a page under a label and
//! reverts them exactly.
//!
//! The engine does not care how a change list was authored. Original element
//! state is captured lazily, once per element no matter how many labels touch
//! it, and also written onto the element as JSON so a revert can recover
//! elements this instance never saw. `html` and `insert` values go through [`sanitize_html`] before
//! they reach the page.

pub mod errors;
pub mod manager;
pub mod policy;
pub mod sanitize;
pub mod snapshot;

pub use errors::PreviewError;
pub use manager::{ApplyReport, ChangeOutcome, PreviewStateManager, RemoveReport};
pub use policy::PreviewPolicy;
pub use sanitize::{is_safe_attribute, sanitize_html, SanitizeReport};
pub use snapshot::{ElementState, Placement, Snapshot};
