use anyhow::Result;
use equityscope_lib::detail::{or_na, CompanyProfile, DividendRow, DividendSummary, HistoryRow};
use equityscope_lib::fetch::SkippedSymbol;
use equityscope_lib::sector::{MetricColumn, Quartile, SectorCount, SectorRow};
use equityscope_lib::{BoxStats, Market};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
pub struct MarketRow {
    #[tabled(rename = "Key")]
    #[serde(rename = "Key")]
    key: String,
    #[tabled(rename = "Market")]
    #[serde(rename = "Market")]
    name: String,
    #[tabled(rename = "Symbol Column")]
    #[serde(rename = "Symbol Column")]
    symbol_column: String,
    #[tabled(rename = "Source")]
    #[serde(rename = "Source")]
    csv_url: String,
}

#[derive(Tabled, Serialize)]
pub struct SymbolRow {
    #[tabled(rename = "#")]
    #[serde(rename = "#")]
    position: usize,
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
}

#[derive(Tabled, Serialize)]
pub struct SectorCountRow {
    #[tabled(rename = "Sector")]
    #[serde(rename = "Sector")]
    sector: String,
    #[tabled(rename = "Tickers")]
    #[serde(rename = "Tickers")]
    count: usize,
}

#[derive(Tabled, Serialize)]
pub struct SectorTableRow {
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "P/E")]
    #[serde(rename = "P/E")]
    trailing_pe: String,
    #[tabled(rename = "ROE %")]
    #[serde(rename = "ROE %")]
    roe: String,
    #[tabled(rename = "Div Yield %")]
    #[serde(rename = "Div Yield %")]
    dividend_yield: String,
    #[tabled(rename = "Market Cap (B)")]
    #[serde(rename = "Market Cap (B)")]
    market_cap_bn: String,
    #[tabled(rename = "Quartile")]
    #[serde(rename = "Quartile")]
    quartile: String,
}

#[derive(Tabled, Serialize)]
pub struct StatsRow {
    #[tabled(rename = "Series")]
    #[serde(rename = "Series")]
    series: String,
    #[tabled(rename = "Count")]
    #[serde(rename = "Count")]
    count: usize,
    #[tabled(rename = "Min")]
    #[serde(rename = "Min")]
    min: String,
    #[tabled(rename = "Q1")]
    #[serde(rename = "Q1")]
    q1: String,
    #[tabled(rename = "Median")]
    #[serde(rename = "Median")]
    median: String,
    #[tabled(rename = "Q3")]
    #[serde(rename = "Q3")]
    q3: String,
    #[tabled(rename = "Max")]
    #[serde(rename = "Max")]
    max: String,
}

#[derive(Tabled, Serialize)]
pub struct PriceRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Open")]
    #[serde(rename = "Open")]
    open: String,
    #[tabled(rename = "High")]
    #[serde(rename = "High")]
    high: String,
    #[tabled(rename = "Low")]
    #[serde(rename = "Low")]
    low: String,
    #[tabled(rename = "Close")]
    #[serde(rename = "Close")]
    close: String,
    #[tabled(rename = "Adj Close")]
    #[serde(rename = "Adj Close")]
    adj_close: String,
    #[tabled(rename = "Volume")]
    #[serde(rename = "Volume")]
    volume: u64,
    #[tabled(rename = "MA50")]
    #[serde(rename = "MA50")]
    ma50: String,
    #[tabled(rename = "MA200")]
    #[serde(rename = "MA200")]
    ma200: String,
}

#[derive(Tabled, Serialize)]
pub struct DividendHistoryRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Dividend")]
    #[serde(rename = "Dividend")]
    amount: String,
    #[tabled(rename = "Change %")]
    #[serde(rename = "Change %")]
    pct_change: String,
}

#[derive(Tabled, Serialize)]
pub struct InfoRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

// -- Row builders --

pub fn build_market_rows(markets: &[Market]) -> Vec<MarketRow> {
    markets
        .iter()
        .map(|m| MarketRow {
            key: m.key.clone(),
            name: m.name.clone(),
            symbol_column: m.symbol_column.clone(),
            csv_url: m.csv_url.clone(),
        })
        .collect()
}

pub fn build_symbol_rows(symbols: &[String]) -> Vec<SymbolRow> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, s)| SymbolRow {
            position: i + 1,
            symbol: s.clone(),
        })
        .collect()
}

pub fn build_sector_count_rows(counts: &[SectorCount]) -> Vec<SectorCountRow> {
    counts
        .iter()
        .map(|c| SectorCountRow {
            sector: c.sector.clone(),
            count: c.count,
        })
        .collect()
}

pub fn build_sector_table_rows(rows: &[SectorRow]) -> Vec<SectorTableRow> {
    rows.iter()
        .map(|r| SectorTableRow {
            symbol: r.symbol.clone(),
            name: r.name.clone().unwrap_or_default(),
            trailing_pe: fmt2(r.trailing_pe),
            roe: fmt2(r.roe_pct),
            dividend_yield: fmt2(r.dividend_yield_pct),
            market_cap_bn: fmt2(r.market_cap_bn),
            quartile: r.quartile.to_string(),
        })
        .collect()
}

fn stats_row(series: String, stats: Option<&BoxStats>) -> StatsRow {
    StatsRow {
        series,
        count: stats.map_or(0, |s| s.count),
        min: fmt_opt(stats.map(|s| s.min)),
        q1: fmt_opt(stats.map(|s| s.q1)),
        median: fmt_opt(stats.map(|s| s.median)),
        q3: fmt_opt(stats.map(|s| s.q3)),
        max: fmt_opt(stats.map(|s| s.max)),
    }
}

pub fn build_column_stats_rows(stats: &[(MetricColumn, Option<BoxStats>)]) -> Vec<StatsRow> {
    stats
        .iter()
        .map(|(col, s)| stats_row(col.label().to_string(), s.as_ref()))
        .collect()
}

pub fn build_quartile_stats_rows(
    column: MetricColumn,
    stats: &[(Quartile, BoxStats)],
) -> Vec<StatsRow> {
    stats
        .iter()
        .map(|(q, s)| stats_row(format!("{} {}", column.label(), q), Some(s)))
        .collect()
}

pub fn build_price_rows(rows: &[HistoryRow]) -> Vec<PriceRow> {
    rows.iter()
        .map(|r| PriceRow {
            date: r.bar.date.to_string(),
            open: fmt2(r.bar.open),
            high: fmt2(r.bar.high),
            low: fmt2(r.bar.low),
            close: fmt2(r.bar.close),
            adj_close: fmt2(r.bar.adj_close),
            volume: r.bar.volume,
            ma50: fmt_opt(r.ma50),
            ma200: fmt_opt(r.ma200),
        })
        .collect()
}

pub fn build_dividend_rows(rows: &[DividendRow]) -> Vec<DividendHistoryRow> {
    rows.iter()
        .map(|r| DividendHistoryRow {
            date: r.date.to_string(),
            amount: fmt2(r.amount),
            pct_change: fmt_change(r.pct_change),
        })
        .collect()
}

pub fn build_info_rows(profile: &CompanyProfile, summary: &DividendSummary) -> Vec<InfoRow> {
    let row = |field: &str, value: String| InfoRow {
        field: field.to_string(),
        value,
    };
    vec![
        row("Symbol", profile.symbol.clone()),
        row("Name", or_na(profile.name.as_deref())),
        row("Sector", or_na(profile.sector.as_deref())),
        row("Industry", or_na(profile.industry.as_deref())),
        row("Ex-Dividend Date", or_na(summary.ex_dividend_date)),
        row("Dividend Yield %", fmt_opt(summary.dividend_yield_pct)),
        row("Payout Ratio %", fmt_opt(summary.payout_ratio_pct)),
        row(
            "Last Dividend",
            or_na(summary.last_dividend.as_ref().map(|d| fmt2(d.amount))),
        ),
        row(
            "Last Dividend Date",
            or_na(summary.last_dividend.as_ref().map(|d| d.date)),
        ),
    ]
}

// -- Rendering --

/// Prints rows as a table, markdown table or CSV. JSON is handled by the
/// caller with [`print_json`] on the library types.
pub fn print_rows<T: Tabled + Serialize>(rows: &[T], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => print_csv(rows),
        OutputFormat::Markdown => {
            println!("{}", render_markdown(rows));
            Ok(())
        }
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", Table::new(rows));
            Ok(())
        }
    }
}

pub fn render_markdown<T: Tabled>(rows: &[T]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    table.to_string()
}

pub fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Section heading for multi-table views. Markdown gets a `##` header.
pub fn print_heading(title: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Markdown => println!("\n## {}\n", title),
        _ => println!("\n{}", title),
    }
}

pub fn print_skipped(skipped: &[SkippedSymbol], attempted: usize) {
    if !skipped.is_empty() {
        eprintln!(
            "Skipped {} of {} symbols (no data or fetch error)",
            skipped.len(),
            attempted
        );
    }
}

fn fmt2(value: f64) -> String {
    format!("{:.2}", value)
}

/// Signed percent change, flagged ▲ for increases and ▼ for cuts.
fn fmt_change(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => format!("+{} ▲", fmt2(v)),
        Some(v) if v < 0.0 => format!("{} ▼", fmt2(v)),
        other => fmt_opt(other.map(f64::abs)),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    or_na(value.map(fmt2))
}
