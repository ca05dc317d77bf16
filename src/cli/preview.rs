use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};
use variant_bridge::{FailedChange, DEFAULT_PREVIEW_LABEL};
use variant_core_types::DomChange;
use variant_page_dom::Document;
use variant_preview::PreviewStateManager;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct PreviewArgs {
    /// Saved page to load
    #[arg(long, value_name = "FILE")]
    pub html: PathBuf,

    /// JSON array of DOM changes
    #[arg(long, value_name = "FILE")]
    pub changes: PathBuf,

    /// Preview label the changes are applied under
    #[arg(long, default_value = DEFAULT_PREVIEW_LABEL)]
    pub label: String,

    /// Remove the preview again and check the page is restored exactly
    #[arg(long)]
    pub revert: bool,

    /// Write the previewed page to FILE (relative paths land in `output_dir`)
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
struct PreviewOutput {
    label: String,
    applied: usize,
    skipped: usize,
    failed: Vec<FailedChange>,
    html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    restored: Option<bool>,
}

pub async fn cmd_preview(args: PreviewArgs, ctx: &CliContext) -> Result<()> {
    let raw_html = fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;
    let raw_changes = fs::read_to_string(&args.changes)
        .await
        .with_context(|| format!("reading {}", args.changes.display()))?;
    let changes: Vec<DomChange> = serde_json::from_str(&raw_changes)
        .with_context(|| format!("parsing change list {}", args.changes.display()))?;

    let mut doc = Document::parse(&raw_html);
    let original = doc.to_html();
    let mut manager = PreviewStateManager::new(ctx.config().preview.clone());

    let report = manager.apply_changes(&mut doc, &changes, &args.label);
    let html = doc.to_html();
    for (index, err) in &report.failed {
        warn!(index, error = %err, "change failed");
    }

    if let Some(out) = &args.out {
        let target = resolve_output(&ctx.config().output_dir, out);
        write_output(&target, &html).await?;
        info!(path = %target.display(), "wrote previewed page");
    }

    let restored = if args.revert {
        let removed = manager.remove_changes(&mut doc, &args.label);
        info!(?removed, "preview removed");
        Some(doc.to_html() == original)
    } else {
        None
    };

    let output = PreviewOutput {
        label: args.label,
        applied: report.applied,
        skipped: report.skipped,
        failed: report
            .failed
            .iter()
            .map(|(index, err)| FailedChange {
                index: *index,
                error: err.to_string(),
            })
            .collect(),
        html,
        restored,
    };
    ctx.output().emit(&output, render_human)?;

    if output.restored == Some(false) {
        bail!("removing preview {:?} did not restore the original page", output.label);
    }
    Ok(())
}

fn render_human(output: &PreviewOutput) -> String {
    let mut lines = vec![format!(
        "preview {:?}: {} applied, {} skipped, {} failed",
        output.label,
        output.applied,
        output.skipped,
        output.failed.len()
    )];
    for failed in &output.failed {
        lines.push(format!("  change #{}: {}", failed.index, failed.error));
    }
    match output.restored {
        Some(true) => lines.push("revert: original page restored".to_string()),
        Some(false) => lines.push("revert: page differs from the original".to_string()),
        None => {}
    }
    lines.push(String::new());
    lines.push(output.html.clone());
    lines.join("\n")
}

fn resolve_output(output_dir: &Path, out: &Path) -> PathBuf {
    if out.is_absolute() {
        out.to_path_buf()
    } else {
        output_dir.join(out)
    }
}

async fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
