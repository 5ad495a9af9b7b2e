//! Library layer for EquityScope: market universes, memoized bulk metrics,
//! the sector valuation pipeline and single-ticker detail.
//!
//! Wraps the `equityscope_api` crate with an in-memory TTL cache, retries,
//! a bounded fetch pool and input validation.

pub mod cache;
pub mod client;
pub mod config;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod indicators;
pub mod market;
pub mod metrics;
pub mod sector;
pub mod stats;
pub mod validation;
pub mod yahoo;

pub use equityscope_api;
pub use equityscope_api::types;

pub use client::{CachedClient, RetryConfig};
pub use config::Config;
pub use detail::{TickerDetail, NOT_AVAILABLE};
pub use error::EquityScopeError;
pub use fetch::{FetchOptions, FetchProgress, FetchReport, SkippedSymbol};
pub use filter::{Bounds, RangeFilter};
pub use market::{Market, MarketCatalog};
pub use metrics::TickerMetrics;
pub use sector::{build_sector_table, list_sectors, MetricColumn, Quartile, SectorRow};
pub use stats::BoxStats;
