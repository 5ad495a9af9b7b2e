use anyhow::Result;
use clap::Args;
use equityscope_lib::sector::{
    build_sector_table, column_stats, quartile_stats, suggest_sectors, MetricColumn, SectorRow,
};
use equityscope_lib::validation::validate_sector;
use equityscope_lib::{BoxStats, Bounds, CachedClient, RangeFilter};
use serde::Serialize;

use crate::output::{
    build_column_stats_rows, build_quartile_stats_rows, build_sector_table_rows, print_heading,
    print_json, print_rows, OutputFormat,
};

#[derive(Args)]
pub struct SectorArgs {
    /// Market key or name (see `equityscope markets`)
    #[arg(long, default_value = "sp500")]
    pub market: String,

    /// Sector label, matched exactly (see `equityscope sectors`)
    #[arg(long)]
    pub sector: String,

    /// Minimum trailing P/E (inclusive)
    #[arg(long)]
    pub pe_min: Option<f64>,

    /// Maximum trailing P/E (inclusive)
    #[arg(long)]
    pub pe_max: Option<f64>,

    /// Minimum ROE in percent
    #[arg(long)]
    pub roe_min: Option<f64>,

    /// Maximum ROE in percent
    #[arg(long)]
    pub roe_max: Option<f64>,

    /// Minimum dividend yield in percent
    #[arg(long)]
    pub yield_min: Option<f64>,

    /// Maximum dividend yield in percent
    #[arg(long)]
    pub yield_max: Option<f64>,

    /// Minimum market cap in billions
    #[arg(long)]
    pub mcap_min: Option<f64>,

    /// Maximum market cap in billions
    #[arg(long)]
    pub mcap_max: Option<f64>,

    /// Also print five-number summaries per column and P/E per quartile
    #[arg(long)]
    pub stats: bool,
}

#[derive(Serialize)]
struct ColumnSummary {
    column: &'static str,
    stats: Option<BoxStats>,
}

#[derive(Serialize)]
struct SectorReport<'a> {
    rows: &'a [SectorRow],
    stats: Vec<ColumnSummary>,
}

impl SectorArgs {
    fn range_filter(&self) -> Result<RangeFilter> {
        Ok(RangeFilter {
            pe: Bounds::new(self.pe_min, self.pe_max)?,
            roe: Bounds::new(self.roe_min, self.roe_max)?,
            dividend_yield: Bounds::new(self.yield_min, self.yield_max)?,
            market_cap_bn: Bounds::new(self.mcap_min, self.mcap_max)?,
        })
    }
}

pub async fn run(args: &SectorArgs, client: &CachedClient, format: &OutputFormat) -> Result<()> {
    let sector = validate_sector(&args.sector)?;
    let filter = args.range_filter()?;

    let report = super::fetch_market_metrics(client, &args.market).await?;
    let table = build_sector_table(&report.rows, &sector);

    if table.is_empty() {
        eprintln!("No data for sector '{}' after cleaning.", sector);
        let suggestions = suggest_sectors(&report.rows, &sector);
        if !suggestions.is_empty() {
            eprintln!("Did you mean: {}?", suggestions.join(", "));
        }
        return Ok(());
    }

    let rows = filter.apply(&table);
    if rows.is_empty() {
        let extent = RangeFilter::extent(&table);
        eprintln!("No rows of '{}' fall within the given ranges.", sector);
        for column in MetricColumn::ALL {
            let b = extent.bounds(column);
            if let (Some(lo), Some(hi)) = (b.lo, b.hi) {
                eprintln!("  {}: {:.2} to {:.2}", column.label(), lo, hi);
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            if args.stats {
                let stats = column_stats(&rows)
                    .into_iter()
                    .map(|(column, stats)| ColumnSummary {
                        column: column.label(),
                        stats,
                    })
                    .collect();
                print_json(&SectorReport { rows: &rows, stats });
            } else {
                print_json(&rows);
            }
        }
        _ => {
            print_rows(&build_sector_table_rows(&rows), format)?;
            if args.stats && *format != OutputFormat::Csv {
                print_heading("Summary", format);
                print_rows(&build_column_stats_rows(&column_stats(&rows)), format)?;
                print_heading("P/E by quartile", format);
                let by_quartile = quartile_stats(&rows, MetricColumn::TrailingPe);
                print_rows(
                    &build_quartile_stats_rows(MetricColumn::TrailingPe, &by_quartile),
                    format,
                )?;
            }
        }
    }

    if !filter.is_unbounded() {
        eprintln!("{} of {} rows within range", rows.len(), table.len());
    }
    Ok(())
}
