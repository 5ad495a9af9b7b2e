//! CLI subcommand implementations.

pub mod markets;
pub mod sector;
pub mod sectors;
pub mod ticker;
pub mod universe;

use std::sync::Arc;

use anyhow::Result;
use equityscope_lib::{CachedClient, FetchReport, TickerMetrics};
use indicatif::{ProgressBar, ProgressStyle};

use crate::output::print_skipped;

/// Loads the universe of `market` and fetches its metrics table with a
/// progress bar on stderr.
pub async fn fetch_market_metrics(
    client: &CachedClient,
    market: &str,
) -> Result<Arc<FetchReport<TickerMetrics>>> {
    let universe = client.load_universe(market).await?;

    let pb = ProgressBar::new(universe.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
    )?);
    pb.set_message("fetching snapshots...");

    let mut failed = 0usize;
    let report = client
        .fetch_metrics(&universe, |progress| {
            if !progress.ok {
                failed += 1;
            }
            pb.set_message(format!("{} ({} failed)", progress.symbol, failed));
            pb.inc(1);
        })
        .await;

    pb.finish_and_clear();
    print_skipped(&report.skipped, report.attempted());
    Ok(report)
}
