//! variant-studio library
//!
//! Exposes configuration and scripted-session replay for the CLI and for
//! integration testing.

pub mod config;
pub mod script;

pub use config::{Config, ConfigError};
pub use script::{parse_script, replay, RejectedStep, ReplayReport, ScriptError, ScriptStep};
