use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;
use variant_bridge::PageHost;
use variant_page_dom::Document;
use variant_studio::{parse_script, replay, ReplayReport};

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct SessionArgs {
    /// Saved page to load
    #[arg(long, value_name = "FILE")]
    pub html: PathBuf,

    /// JSON array of script steps (messages, clicks, keys, editor actions)
    #[arg(long, value_name = "FILE")]
    pub script: PathBuf,
}

pub async fn cmd_session(args: SessionArgs, ctx: &CliContext) -> Result<()> {
    let raw_html = fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;
    let raw_script = fs::read_to_string(&args.script)
        .await
        .with_context(|| format!("reading {}", args.script.display()))?;
    let steps = parse_script(&raw_script)
        .with_context(|| format!("loading {}", args.script.display()))?;

    let (host, outbox) = PageHost::new(Document::parse(&raw_html), ctx.host_settings());
    let report = replay(host, outbox, &steps)?;
    ctx.output().emit(&report, render_human)
}

fn render_human(report: &ReplayReport) -> String {
    let mut lines = Vec::new();
    for message in &report.messages {
        let body = serde_json::to_string(message).unwrap_or_else(|_| message.name().to_string());
        lines.push(format!("<- {}", body));
    }
    for rejected in &report.rejected {
        lines.push(format!("!! step {}: {}", rejected.step, rejected.error));
    }
    lines.push(String::new());
    lines.push(report.final_html.clone());
    lines.join("\n")
}
