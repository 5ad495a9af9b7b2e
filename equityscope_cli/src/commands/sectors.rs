use anyhow::Result;
use clap::Args;
use equityscope_lib::sector::list_sectors;
use equityscope_lib::CachedClient;

use crate::output::{build_sector_count_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct SectorsArgs {
    /// Market key or name (see `equityscope markets`)
    #[arg(long, default_value = "sp500")]
    pub market: String,
}

pub async fn run(args: &SectorsArgs, client: &CachedClient, format: &OutputFormat) -> Result<()> {
    let report = super::fetch_market_metrics(client, &args.market).await?;
    let sectors = list_sectors(&report.rows);

    if sectors.is_empty() {
        eprintln!("No sector data available for {}.", args.market);
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_json(&sectors),
        _ => print_rows(&build_sector_count_rows(&sectors), format)?,
    }
    Ok(())
}
