//! Variant Studio page model.
//!
//! An owned, in-memory stand-in for the live page the visual tools work on:
//! an arena DOM parsed with `scraper`, CSS selector matching through the
//! `selectors` crate, inline style helpers, host-supplied layout boxes for
//! hit-testing and a registry of the listeners each tool session has attached.

pub mod errors;
pub mod events;
pub mod geometry;
pub mod html;
pub mod node;
pub mod selector;
pub mod style;

pub use errors::{DomError, DomResult};
pub use events::{DomEvent, EventKind, EventOutcome, Listener, ListenerId, ListenerRegistry};
pub use geometry::Rect;
pub use node::{Adjacent, Document, ElementData, NodeData, NodeId};
pub use selector::{css_escape, css_string, ElementHandle, SelectorList};
pub use style::{parse_declarations, serialize_declarations};
