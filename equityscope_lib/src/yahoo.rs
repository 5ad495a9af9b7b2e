//! Yahoo Finance chart client for daily price history and dividend events.
//!
//! Wraps `yahoo_finance_api::YahooConnector` and converts its quotes into
//! date-keyed [`PriceBar`] and [`Dividend`] rows.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

/// Earliest date requested when loading the full dividend record.
const DIVIDEND_EPOCH: (i32, u32, u32) = (1970, 1, 1);

/// Errors from Yahoo Finance operations.
#[derive(Error, Debug)]
pub enum YahooError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error(transparent)]
    Upstream(#[from] yahoo_finance_api::YahooError),
}

/// One trading day of price history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// One dividend payment event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dividend {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Convert chrono::NaiveDate to time::OffsetDateTime at UTC midnight.
pub fn date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, YahooError> {
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| YahooError::InvalidDate(date.to_string()))?;

    OffsetDateTime::from_unix_timestamp(datetime.and_utc().timestamp())
        .map_err(|_| YahooError::InvalidDate(date.to_string()))
}

/// Convert a unix timestamp in seconds to its UTC calendar date.
pub fn timestamp_to_date(timestamp: i64) -> Result<NaiveDate, YahooError> {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| YahooError::InvalidDate(timestamp.to_string()))
}

/// Daily quote fields as the chart endpoint reports them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteRow {
    /// Unix seconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Dated bars in `[start, end)`, see [`finalize_bars`].
pub fn bars_from_quotes<I>(
    quotes: I,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceBar>, YahooError>
where
    I: IntoIterator<Item = QuoteRow>,
{
    let bars = quotes
        .into_iter()
        .map(|q| {
            Ok(PriceBar {
                date: timestamp_to_date(q.timestamp)?,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                adj_close: q.adj_close,
                volume: q.volume,
            })
        })
        .collect::<Result<Vec<_>, YahooError>>()?;
    Ok(finalize_bars(bars, start, end))
}

/// Dividend rows from `(unix seconds, amount)` events, see [`finalize_dividends`].
pub fn dividends_from_events<I>(events: I) -> Result<Vec<Dividend>, YahooError>
where
    I: IntoIterator<Item = (i64, f64)>,
{
    let dividends = events
        .into_iter()
        .map(|(timestamp, amount)| {
            Ok(Dividend {
                date: timestamp_to_date(timestamp)?,
                amount,
            })
        })
        .collect::<Result<Vec<_>, YahooError>>()?;
    Ok(finalize_dividends(dividends))
}

/// Sorts bars by date, keeps the last bar seen for a repeated date, drops
/// bars outside `[start, end)` and bars without a finite close.
pub fn finalize_bars(mut bars: Vec<PriceBar>, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    bars.retain(|b| b.date >= start && b.date < end && b.close.is_finite());
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Sorts dividend events by date and drops non-finite amounts.
pub fn finalize_dividends(mut dividends: Vec<Dividend>) -> Vec<Dividend> {
    dividends.retain(|d| d.amount.is_finite());
    dividends.sort_by_key(|d| d.date);
    dividends.dedup_by(|b, a| a.date == b.date);
    dividends
}

/// Yahoo Finance chart client.
pub struct YahooClient {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooClient {
    /// Create a new YahooClient with default configuration.
    pub fn new() -> Result<Self, YahooError> {
        Ok(Self {
            connector: yahoo_finance_api::YahooConnector::new()?,
        })
    }

    /// Daily bars for `symbol` from `start` up to but excluding `end`.
    ///
    /// A symbol with no data in the window yields an empty vector.
    pub async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, YahooError> {
        if start > end {
            return Err(YahooError::InvalidDate(format!("{} is after {}", start, end)));
        }
        let from = date_to_offset_datetime(start)?;
        let to = date_to_offset_datetime(end)?;

        let response = self.connector.get_quote_history(symbol, from, to).await?;
        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::debug!("No quotes for {} in {}..{}: {}", symbol, start, end, e);
                return Ok(Vec::new());
            }
        };

        let rows = quotes.iter().map(|q| QuoteRow {
            timestamp: q.timestamp as i64,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            adj_close: q.adjclose,
            volume: q.volume as u64,
        });
        bars_from_quotes(rows, start, end)
    }

    /// Every dividend event on record for `symbol`, oldest first.
    pub async fn get_dividends(&self, symbol: &str) -> Result<Vec<Dividend>, YahooError> {
        let (y, m, d) = DIVIDEND_EPOCH;
        let epoch = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| YahooError::InvalidDate(format!("{}-{}-{}", y, m, d)))?;
        let from = date_to_offset_datetime(epoch)?;
        let to = date_to_offset_datetime(Utc::now().date_naive() + Duration::days(1))?;

        let response = self
            .connector
            .get_quote_history_interval(symbol, from, to, "1mo")
            .await?;
        let events = match response.dividends() {
            Ok(events) => events,
            Err(e) => {
                tracing::debug!("No dividend events for {}: {}", symbol, e);
                return Ok(Vec::new());
            }
        };

        dividends_from_events(events.iter().map(|e| (e.date as i64, e.amount)))
    }
}
