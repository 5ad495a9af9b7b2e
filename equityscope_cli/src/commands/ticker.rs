use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use equityscope_lib::validation::parse_date;
use equityscope_lib::{CachedClient, TickerDetail};

use crate::output::{
    build_dividend_rows, build_info_rows, build_price_rows, print_heading, print_json, print_rows,
    OutputFormat,
};

#[derive(Args)]
pub struct TickerArgs {
    /// Ticker symbol
    #[arg(default_value = "AAPL")]
    pub symbol: String,

    /// Start of the price window, YYYY-MM-DD (inclusive)
    #[arg(long, default_value = "2020-01-01")]
    pub from: String,

    /// End of the price window, YYYY-MM-DD (exclusive, default today)
    #[arg(long)]
    pub to: Option<String>,

    /// Show only the last N history rows (0 shows all)
    #[arg(long, default_value = "20")]
    pub rows: usize,
}

impl TickerArgs {
    fn window(&self) -> Result<(NaiveDate, NaiveDate)> {
        let start = parse_date(&self.from)?;
        let end = match &self.to {
            Some(to) => parse_date(to)?,
            None => Utc::now().date_naive(),
        };
        Ok((start, end))
    }
}

/// Keeps the last `rows` history entries; zero keeps everything.
fn tail_history(detail: &mut TickerDetail, rows: usize) {
    if rows > 0 && detail.history.len() > rows {
        let cut = detail.history.len() - rows;
        detail.history.drain(..cut);
    }
}

pub async fn run(args: &TickerArgs, client: &CachedClient, format: &OutputFormat) -> Result<()> {
    let (start, end) = args.window()?;
    let mut detail = client.ticker_detail(&args.symbol, start, end).await?;
    let symbol = detail.profile.symbol.clone();
    let total_bars = detail.history.len();
    tail_history(&mut detail, args.rows);

    match format {
        OutputFormat::Json => print_json(&detail),
        // CSV carries a single table: the price history.
        OutputFormat::Csv => {
            if detail.history.is_empty() {
                eprintln!("No price history for {} between {} and {}.", symbol, start, end);
            } else {
                print_rows(&build_price_rows(&detail.history), format)?;
            }
        }
        OutputFormat::Table | OutputFormat::Markdown => {
            print_heading("Company", format);
            print_rows(&build_info_rows(&detail.profile, &detail.summary), format)?;

            print_heading(
                &format!("Price history ({} of {} rows)", detail.history.len(), total_bars),
                format,
            );
            if detail.history.is_empty() {
                println!("No price history for {} between {} and {}.", symbol, start, end);
            } else {
                print_rows(&build_price_rows(&detail.history), format)?;
            }

            print_heading("Dividend history", format);
            if detail.dividends.is_empty() {
                println!("No dividend history available for {}.", symbol);
            } else {
                print_rows(&build_dividend_rows(&detail.dividends), format)?;
            }
        }
    }
    Ok(())
}
