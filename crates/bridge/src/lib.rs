//! Coordination layer for variant-studio.
//!
//! [`PageHost`] plays the content-script and page contexts at once: it owns
//! the page, allows exactly one picker or editor session at a time (a new
//! start destroys the previous session first), runs previews, and reports
//! back through an unbounded tokio channel. Requests arriving over the page
//! channel must carry the configured source tag and may only ask for
//! previews.

pub mod channel;
pub mod config;
pub mod errors;
pub mod host;
pub mod messages;

pub use channel::{PageChannel, PageEnvelope};
pub use config::{BridgeConfig, DEFAULT_SOURCE_TAG};
pub use errors::BridgeError;
pub use host::{ActiveSession, HostEvent, HostEventBus, HostInput, HostSettings, PageHost};
pub use messages::{
    FailedChange, InboundMessage, OutboundMessage, PreviewAction, DEFAULT_PREVIEW_LABEL,
};
