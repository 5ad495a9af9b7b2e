use anyhow::Result;
use clap::Args;
use equityscope_lib::CachedClient;

use crate::output::{build_market_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct MarketsArgs {}

pub fn run(_args: &MarketsArgs, client: &CachedClient, format: &OutputFormat) -> Result<()> {
    let markets = client.catalog().markets();
    match format {
        OutputFormat::Json => print_json(&markets),
        _ => print_rows(&build_market_rows(markets), format)?,
    }
    Ok(())
}
