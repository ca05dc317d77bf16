use anyhow::Result;
use serde::Serialize;

use super::context::CliContext;

#[derive(Serialize)]
struct BuildInfo {
    version: &'static str,
    build_date: &'static str,
    git_hash: &'static str,
    git_branch: &'static str,
    config_path: String,
    source_tag: String,
}

pub async fn cmd_info(ctx: &CliContext) -> Result<()> {
    let info = BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_date: env!("BUILD_DATE"),
        git_hash: env!("GIT_HASH"),
        git_branch: env!("GIT_BRANCH"),
        config_path: ctx.config_path().display().to_string(),
        source_tag: ctx.config().bridge.source_tag.clone(),
    };
    ctx.output().emit(&info, |info| {
        format!(
            "variant-studio {}\n  built:   {}\n  commit:  {} ({})\n  config:  {}\n  channel: {}",
            info.version,
            info.build_date,
            info.git_hash,
            info.git_branch,
            info.config_path,
            info.source_tag
        )
    })
}
