//! Single-ticker detail: company profile, dividend summary, price history
//! with moving averages and dividend history with period-over-period change.

use chrono::NaiveDate;
use equityscope_api::types::QuoteSummary;
use serde::Serialize;

use crate::indicators::{pct_change, round2, sma, MA_LONG, MA_SHORT};
use crate::yahoo::{Dividend, PriceBar};

/// Display value for any missing metadata field.
pub const NOT_AVAILABLE: &str = "N/A";

/// Render an optional value, falling back to [`NOT_AVAILABLE`].
pub fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastDividend {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Dividend facts shown next to the history. Missing values are not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendSummary {
    pub ex_dividend_date: Option<NaiveDate>,
    pub dividend_yield_pct: Option<f64>,
    pub payout_ratio_pct: Option<f64>,
    pub last_dividend: Option<LastDividend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub pct_change: Option<f64>,
}

/// Everything the ticker view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerDetail {
    pub profile: CompanyProfile,
    pub summary: DividendSummary,
    pub history: Vec<HistoryRow>,
    pub dividends: Vec<DividendRow>,
}

impl TickerDetail {
    /// Combines the snapshot with history and dividends already clipped and
    /// sorted by the price source.
    pub fn assemble(
        symbol: &str,
        snapshot: &QuoteSummary,
        bars: Vec<PriceBar>,
        dividends: &[Dividend],
    ) -> Self {
        Self {
            profile: CompanyProfile::from_summary(symbol, snapshot),
            summary: DividendSummary::build(snapshot, dividends),
            history: build_history_rows(bars),
            dividends: build_dividend_rows(dividends),
        }
    }
}

impl CompanyProfile {
    pub fn from_summary(symbol: &str, summary: &QuoteSummary) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: summary.display_name(),
            sector: summary.sector(),
            industry: summary.industry(),
        }
    }
}

impl DividendSummary {
    /// Yield and payout ratio arrive as fractions and are shown in percent.
    pub fn build(summary: &QuoteSummary, dividends: &[Dividend]) -> Self {
        Self {
            ex_dividend_date: summary.ex_dividend_date(),
            dividend_yield_pct: summary.dividend_yield().map(|v| round2(v * 100.0)),
            payout_ratio_pct: summary.payout_ratio().map(|v| round2(v * 100.0)),
            last_dividend: dividends.last().map(|d| LastDividend {
                date: d.date,
                amount: d.amount,
            }),
        }
    }
}

/// Attach MA50 and MA200 over closing prices to each bar.
pub fn build_history_rows(bars: Vec<PriceBar>) -> Vec<HistoryRow> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ma50 = sma(&closes, MA_SHORT);
    let ma200 = sma(&closes, MA_LONG);
    bars.into_iter()
        .zip(ma50.into_iter().zip(ma200))
        .map(|(bar, (ma50, ma200))| HistoryRow { bar, ma50, ma200 })
        .collect()
}

/// Dividend rows with amounts rounded to 2 decimals. Percent change is
/// computed on the unrounded amounts.
pub fn build_dividend_rows(dividends: &[Dividend]) -> Vec<DividendRow> {
    let amounts: Vec<f64> = dividends.iter().map(|d| d.amount).collect();
    dividends
        .iter()
        .zip(pct_change(&amounts))
        .map(|(d, pct_change)| DividendRow {
            date: d.date,
            amount: round2(d.amount),
            pct_change,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = date("2020-01-02");
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar {
                date: start + Duration::days(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                adj_close: *c,
                volume: 100,
            })
            .collect()
    }

    fn dividend(s: &str, amount: f64) -> Dividend {
        Dividend {
            date: date(s),
            amount,
        }
    }

    #[test]
    fn test_short_window_has_no_moving_averages() {
        let closes: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        let rows = build_history_rows(bars(&closes));
        assert_eq!(rows.len(), 30);
        assert!(rows.iter().all(|r| r.ma50.is_none() && r.ma200.is_none()));
    }

    #[test]
    fn test_ma50_defined_once_window_is_full() {
        let closes: Vec<f64> = (1..=60).map(|v| v as f64).collect();
        let rows = build_history_rows(bars(&closes));
        assert!(rows[..49].iter().all(|r| r.ma50.is_none()));
        // mean of 1..=50
        assert_eq!(rows[49].ma50, Some(25.5));
        // mean of 11..=60
        assert_eq!(rows[59].ma50, Some(35.5));
        assert!(rows.iter().all(|r| r.ma200.is_none()));
    }

    #[test]
    fn test_ma200() {
        let closes = vec![2.0; 210];
        let rows = build_history_rows(bars(&closes));
        assert!(rows[198].ma200.is_none());
        assert_eq!(rows[199].ma200, Some(2.0));
        assert_eq!(rows[209].ma200, Some(2.0));
    }

    #[test]
    fn test_dividend_rows_pct_change() {
        let rows = build_dividend_rows(&[
            dividend("2023-08-11", 0.24),
            dividend("2023-11-10", 0.24),
            dividend("2024-02-09", 0.25),
            dividend("2024-05-10", 0.2),
        ]);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].pct_change, None);
        assert_eq!(rows[1].pct_change, Some(0.0));
        assert_eq!(rows[2].pct_change, Some(4.17));
        assert_eq!(rows[3].pct_change, Some(-20.0));
    }

    #[test]
    fn test_dividend_amount_rounded_after_change() {
        let rows = build_dividend_rows(&[dividend("2020-02-07", 0.1925), dividend("2020-05-08", 0.205)]);
        assert_eq!(rows[0].amount, 0.19);
        // (0.205 - 0.1925) / 0.1925
        assert_eq!(rows[1].pct_change, Some(6.49));
    }

    #[test]
    fn test_empty_dividends() {
        assert!(build_dividend_rows(&[]).is_empty());
        let summary = DividendSummary::build(&QuoteSummary::default(), &[]);
        assert_eq!(summary.last_dividend, None);
        assert_eq!(or_na(summary.ex_dividend_date), "N/A");
        assert_eq!(or_na(summary.dividend_yield_pct), "N/A");
        assert_eq!(or_na(summary.payout_ratio_pct), "N/A");
    }

    #[test]
    fn test_dividend_summary_from_snapshot() {
        let snapshot: QuoteSummary = serde_json::from_value(serde_json::json!({
            "price": { "longName": "Apple Inc." },
            "summaryProfile": { "sector": "Technology", "industry": "Consumer Electronics" },
            "summaryDetail": {
                "dividendYield": { "raw": 0.0044 },
                "payoutRatio": { "raw": 0.1476 },
                "exDividendDate": { "raw": 1731024000 }
            }
        }))
        .unwrap();
        let dividends = vec![dividend("2024-08-12", 0.25), dividend("2024-11-08", 0.25)];
        let summary = DividendSummary::build(&snapshot, &dividends);
        assert_eq!(summary.ex_dividend_date, Some(date("2024-11-08")));
        assert_eq!(summary.dividend_yield_pct, Some(0.44));
        assert_eq!(summary.payout_ratio_pct, Some(14.76));
        assert_eq!(
            summary.last_dividend,
            Some(LastDividend {
                date: date("2024-11-08"),
                amount: 0.25
            })
        );

        let profile = CompanyProfile::from_summary("AAPL", &snapshot);
        assert_eq!(profile.name.as_deref(), Some("Apple Inc."));
        assert_eq!(or_na(profile.industry.as_deref()), "Consumer Electronics");
    }

    #[test]
    fn test_assemble_short_window_from_chart_rows() {
        use crate::yahoo::{bars_from_quotes, dividends_from_events, QuoteRow};

        let response: equityscope_api::types::QuoteSummaryResponse =
            serde_json::from_str(include_str!("../tests/fixtures/quote_summary_aapl.json"))
                .unwrap();
        let snapshot = response.quote_summary.result.unwrap().remove(0);

        // 30 daily rows starting 2024-01-02 14:30 UTC.
        let first = 1_704_205_800i64;
        let quotes = (0..30).map(|i| QuoteRow {
            timestamp: first + i * 86_400,
            open: 180.0,
            high: 182.0,
            low: 179.0,
            close: 180.0 + i as f64,
            adj_close: 180.0 + i as f64,
            volume: 1_000_000,
        });
        let start = date("2024-01-02");
        let end = date("2024-01-31");
        let bars = bars_from_quotes(quotes, start, end).unwrap();
        let dividends =
            dividends_from_events(vec![(1_707_489_000, 0.24), (1_715_347_800, 0.25)]).unwrap();

        let detail = TickerDetail::assemble("AAPL", &snapshot, bars, &dividends);
        assert_eq!(detail.profile.symbol, "AAPL");
        assert_eq!(detail.profile.sector.as_deref(), Some("Technology"));
        // [start, end) keeps 2024-01-02 ..= 2024-01-30.
        assert_eq!(detail.history.len(), 29);
        assert_eq!(detail.history[0].bar.date, start);
        assert!(detail
            .history
            .iter()
            .all(|r| r.ma50.is_none() && r.ma200.is_none()));
        assert_eq!(detail.dividends.len(), 2);
        assert_eq!(detail.dividends[1].pct_change, Some(4.17));
        assert_eq!(
            detail.summary.last_dividend,
            Some(LastDividend {
                date: date("2024-05-10"),
                amount: 0.25
            })
        );
    }
}
