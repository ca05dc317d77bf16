use clap::Subcommand;

use super::config::ConfigArgs;
use super::preview::PreviewArgs;
use super::selector::SelectorArgs;
use super::session::SessionArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Generate a unique selector for an element of a saved page
    Selector(SelectorArgs),

    /// Apply a change list to a saved page under a preview label
    Preview(PreviewArgs),

    /// Replay a scripted picker/editor session against a saved page
    Session(SessionArgs),

    /// Inspect variant-studio configuration
    Config(ConfigArgs),

    /// Show version and build information
    Info,
}
