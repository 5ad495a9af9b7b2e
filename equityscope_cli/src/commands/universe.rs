use anyhow::Result;
use clap::Args;
use equityscope_lib::CachedClient;

use crate::output::{build_symbol_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct UniverseArgs {
    /// Market key or name (see `equityscope markets`)
    #[arg(long, default_value = "sp500")]
    pub market: String,
}

pub async fn run(args: &UniverseArgs, client: &CachedClient, format: &OutputFormat) -> Result<()> {
    let symbols = client.load_universe(&args.market).await?;
    match format {
        OutputFormat::Json => print_json(&*symbols),
        _ => print_rows(&build_symbol_rows(&symbols), format)?,
    }
    eprintln!("{} symbols", symbols.len());
    Ok(())
}
