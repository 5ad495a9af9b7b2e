//! Per-ticker metrics row built from a company snapshot.

use equityscope_api::types::QuoteSummary;
use serde::Serialize;

/// One row of the bulk metrics table. Any field but `symbol` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerMetrics {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub trailing_pe: Option<f64>,
    /// Return on equity in percent.
    pub roe_pct: Option<f64>,
    /// Dividend yield in percent.
    pub dividend_yield_pct: Option<f64>,
    pub market_cap: Option<f64>,
}

impl TickerMetrics {
    /// Builds a row from a snapshot. ROE and yield arrive as fractions and
    /// are stored as percentages.
    pub fn from_summary(symbol: &str, summary: &QuoteSummary) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: summary.display_name(),
            sector: summary.sector(),
            trailing_pe: summary.trailing_pe(),
            roe_pct: summary.return_on_equity().map(|v| v * 100.0),
            dividend_yield_pct: summary.dividend_yield().map(|v| v * 100.0),
            market_cap: summary.market_cap(),
        }
    }

    /// Empty row, used by tests and as a builder base.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: None,
            sector: None,
            trailing_pe: None,
            roe_pct: None,
            dividend_yield_pct: None,
            market_cap: None,
        }
    }
}
