//! Unique selector generation for interactively chosen elements.
//!
//! Tiers are tried strongest first and every candidate is re-verified against
//! the live page:
//! - unique `#id`
//! - `tag.class` over the element's own classes
//! - stable signal attributes, widened with ancestor context
//! - `nth-child` path towards `<body>`
//! - absolute `nth-of-type` chain (degraded, unverified)
//!
//! The crate also owns the "extension-owned element" predicate every
//! interactive listener consults before acting on page content.

pub mod errors;
pub mod generator;
pub mod heuristics;
pub mod ownership;
pub mod strategies;
pub mod types;

pub use errors::SelectorError;
pub use generator::{generate_selector, SelectorGenerator};
pub use heuristics::{is_generated_token, is_generated_value, is_stable_class};
pub use ownership::is_extension_owned;
pub use strategies::{GenerationContext, Strategy};
pub use types::{GeneratedSelector, SelectorPolicy, SelectorTier};
