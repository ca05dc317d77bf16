use super::config::cmd_config;
use super::env::CliArgs;
use super::info::cmd_info;
use super::preview::cmd_preview;
use super::selector::cmd_selector;
use super::session::cmd_session;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Selector(args) => cmd_selector(args, ctx).await,
        Commands::Preview(args) => cmd_preview(args, ctx).await,
        Commands::Session(args) => cmd_session(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Info => cmd_info(ctx).await,
    }
}
