//! variant-studio - visual DOM editing for A/B test variants
//!
//! Command line front end over the selector generator, the preview engine and
//! the page host.

mod cli;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cli::app::run().await
}
