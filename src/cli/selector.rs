use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::fs;
use tracing::info;
use variant_page_dom::Document;
use variant_selector::{SelectorGenerator, SelectorTier};

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct SelectorArgs {
    /// Saved page to load
    #[arg(long, value_name = "FILE")]
    pub html: PathBuf,

    /// CSS selector locating the element to describe
    #[arg(long, value_name = "CSS")]
    pub target: String,

    /// Which match of `--target` to use when it matches several elements
    #[arg(long, default_value_t = 0)]
    pub index: usize,
}

#[derive(Serialize)]
struct SelectorReport {
    selector: String,
    tier: SelectorTier,
    verified: bool,
    matches: usize,
}

pub async fn cmd_selector(args: SelectorArgs, ctx: &CliContext) -> Result<()> {
    let raw = fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;
    let doc = Document::parse(&raw);

    let matches = doc
        .query_all(&args.target)
        .with_context(|| format!("invalid --target selector {:?}", args.target))?;
    let Some(&node) = matches.get(args.index) else {
        bail!(
            "{:?} matched {} element(s); index {} is out of range",
            args.target,
            matches.len(),
            args.index
        );
    };

    let generator = SelectorGenerator::new(ctx.config().selector.clone());
    let Some(generated) = generator.generate_detailed(&doc, node) else {
        bail!("no selector could be generated for {:?}", args.target);
    };
    info!(selector = %generated.selector, tier = generated.tier.name(), "generated selector");

    let report = SelectorReport {
        selector: generated.selector,
        tier: generated.tier,
        verified: generated.verified,
        matches: matches.len(),
    };
    ctx.output().emit(&report, |report| {
        let note = if report.verified { "" } else { " (unverified)" };
        format!("{}\n  tier: {}{}", report.selector, report.tier.name(), note)
    })
}
