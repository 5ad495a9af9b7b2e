//! Memoizing, retrying facade over the snapshot API and the price history source.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use equityscope_api::types::QuoteSummary;
use equityscope_api::{Client, SummaryQuery};
use rand::Rng;

use crate::cache::MemoryCache;
use crate::config::Config;
use crate::detail::TickerDetail;
use crate::error::EquityScopeError;
use crate::fetch::{fetch_all, FetchOptions, FetchProgress, FetchReport};
use crate::market::{normalize_symbol, Market, MarketCatalog};
use crate::metrics::TickerMetrics;
use crate::validation::{validate_date_range, validate_symbol};
use crate::yahoo::YahooClient;

/// Backoff schedule for transient snapshot failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.retry_max,
            base_delay_ms: config.retry_base_ms,
            max_delay_ms: config.retry_max_ms,
        }
    }

    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(30) as u32;
        let exp = 1u64 << shift;
        let base = self
            .base_delay_ms
            .saturating_mul(exp)
            .min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}

async fn with_retry<T, F, Fut>(
    cfg: RetryConfig,
    label: &str,
    mut f: F,
) -> Result<T, EquityScopeError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, EquityScopeError>>,
{
    let mut attempt = 0usize;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt > cfg.max_retries || !is_retryable(&err) {
                    return Err(err);
                }
                let delay = cfg.delay_for_attempt(attempt);
                tracing::warn!(
                    "{} request failed (attempt {}/{}), retrying in {:.1}s",
                    label,
                    attempt,
                    cfg.max_retries,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn is_retryable(err: &EquityScopeError) -> bool {
    match err {
        EquityScopeError::Api(api_err) => match api_err {
            equityscope_api::Error::RequestFailed => true,
            equityscope_api::Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        },
        _ => false,
    }
}

async fn fetch_snapshot(
    api: &Client,
    retry: RetryConfig,
    query: &SummaryQuery,
) -> Result<QuoteSummary, EquityScopeError> {
    with_retry(retry, &query.symbol, move || async move {
        api.get_quote_summary(query)
            .await
            .map_err(EquityScopeError::from)
    })
    .await
}

/// Client used by every front-end command.
///
/// Universes are memoized by market key and metrics tables by the exact
/// ticker list. Entries expire after the configured TTL.
pub struct CachedClient {
    api: Arc<Client>,
    yahoo: YahooClient,
    catalog: MarketCatalog,
    retry: RetryConfig,
    fetch_options: FetchOptions,
    universes: MemoryCache<Arc<Vec<String>>>,
    metrics: MemoryCache<Arc<FetchReport<TickerMetrics>>>,
}

impl CachedClient {
    pub fn from_config(config: &Config) -> Result<Self, EquityScopeError> {
        Ok(Self {
            api: Arc::new(Client::with_options(
                &config.base_url,
                &config.session_url,
                config.request_timeout(),
            )?),
            yahoo: YahooClient::new()?,
            catalog: config.catalog()?,
            retry: RetryConfig::from_config(config),
            fetch_options: FetchOptions {
                concurrency: config.concurrency,
                timeout: config.fetch_timeout(),
            },
            universes: MemoryCache::new(config.cache_ttl()),
            metrics: MemoryCache::new(config.cache_ttl()),
        })
    }

    pub fn catalog(&self) -> &MarketCatalog {
        &self.catalog
    }

    /// Looks a market up by key or display name.
    pub fn market(&self, name: &str) -> Result<&Market, EquityScopeError> {
        self.catalog
            .find(name)
            .map_err(|e| EquityScopeError::InvalidInput(e.to_string()))
    }

    /// Normalized ticker symbols of a market, in constituent-list order.
    ///
    /// Download and parse failures propagate; they are not retried.
    pub async fn load_universe(&self, market: &str) -> Result<Arc<Vec<String>>, EquityScopeError> {
        let market = self.market(market)?;
        if let Some(cached) = self.universes.get(&market.key) {
            tracing::debug!("Universe cache hit for {}", market.key);
            return Ok(cached);
        }

        let raw = self
            .api
            .get_constituents(&market.csv_url, &market.symbol_column)
            .await?;
        let symbols: Vec<String> = raw
            .iter()
            .filter_map(|s| normalize_symbol(s, market.suffix.as_deref()))
            .collect();
        tracing::info!("Loaded {} symbols for {}", symbols.len(), market.name);

        let symbols = Arc::new(symbols);
        self.universes.set(market.key.clone(), Arc::clone(&symbols));
        Ok(symbols)
    }

    /// Snapshot for one symbol with transient failures retried.
    pub async fn get_snapshot(&self, symbol: &str) -> Result<QuoteSummary, EquityScopeError> {
        let symbol = validate_symbol(symbol)?;
        fetch_snapshot(&self.api, self.retry, &SummaryQuery::new(&symbol)).await
    }

    /// Metrics rows for `symbols`, failures skipped, in input order.
    pub async fn fetch_metrics<P>(
        &self,
        symbols: &[String],
        on_progress: P,
    ) -> Arc<FetchReport<TickerMetrics>>
    where
        P: FnMut(FetchProgress<'_>),
    {
        let key = symbols.join(",");
        if let Some(cached) = self.metrics.get(&key) {
            tracing::debug!("Metrics cache hit for {} symbols", symbols.len());
            return cached;
        }

        let api = Arc::clone(&self.api);
        let retry = self.retry;
        let report = fetch_all(
            symbols,
            self.fetch_options,
            move |symbol: String| {
                let api = Arc::clone(&api);
                async move {
                    let query = SummaryQuery::new(&symbol);
                    let summary = fetch_snapshot(&api, retry, &query).await?;
                    Ok(TickerMetrics::from_summary(&symbol, &summary))
                }
            },
            on_progress,
        )
        .await;

        let report = Arc::new(report);
        self.metrics.set(key, Arc::clone(&report));
        report
    }

    /// Company info, dividend summary, price history in `[start, end)` and
    /// the full dividend record of one symbol.
    ///
    /// An inverted range is rejected before any request is made.
    pub async fn ticker_detail(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TickerDetail, EquityScopeError> {
        let symbol = validate_symbol(symbol)?;
        validate_date_range(start, end)?;

        let snapshot = self.get_snapshot(&symbol).await?;
        let bars = self.yahoo.get_history(&symbol, start, end).await?;
        let dividends = self.yahoo.get_dividends(&symbol).await?;
        tracing::debug!(
            "{}: {} bars, {} dividend events",
            symbol,
            bars.len(),
            dividends.len()
        );

        Ok(TickerDetail::assemble(&symbol, &snapshot, bars, &dividends))
    }

    /// Drops every memoized universe and metrics table.
    pub fn clear_cache(&self) {
        self.universes.clear();
        self.metrics.clear();
    }
}
