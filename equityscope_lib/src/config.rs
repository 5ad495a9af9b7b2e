//! Runtime configuration: defaults, optional TOML file, environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::EquityScopeError;
use crate::market::{Market, MarketCatalog};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_PATH_ENV: &str = "EQUITYSCOPE_CONFIG";

/// Upper bound on snapshot requests in flight.
pub const MAX_CONCURRENCY: usize = 256;

/// Tunables for fetching and memoization.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the company snapshot API.
    pub base_url: String,
    /// Page visited for the provider session cookie.
    pub session_url: String,
    /// Snapshot requests in flight during a bulk fetch.
    pub concurrency: usize,
    /// HTTP timeout of a single request.
    pub request_timeout_secs: u64,
    /// Upper bound for one symbol in a bulk fetch, retries included.
    pub fetch_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub retry_max: usize,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    /// Extra or replacement markets, merged over the built-in catalogue.
    pub markets: Vec<Market>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".to_string(),
            session_url: "https://fc.yahoo.com".to_string(),
            concurrency: 8,
            request_timeout_secs: 10,
            fetch_timeout_secs: 15,
            cache_ttl_secs: 300,
            retry_max: 2,
            retry_base_ms: 500,
            retry_max_ms: 5000,
            markets: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, EquityScopeError> {
        toml::from_str(content).map_err(|e| EquityScopeError::Config(e.to_string()))
    }

    /// Loads the config file at `path` (or `$EQUITYSCOPE_CONFIG`), falling back
    /// to defaults when neither is set, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, EquityScopeError> {
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(&p).map_err(|e| {
                    EquityScopeError::Config(format!("cannot read {}: {}", p.display(), e))
                })?;
                tracing::debug!("Loaded config from {}", p.display());
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `EQUITYSCOPE_*` overrides. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("EQUITYSCOPE_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(url) = lookup("EQUITYSCOPE_SESSION_URL").filter(|v| !v.trim().is_empty()) {
            self.session_url = url;
        }
        override_parsed(&lookup, "EQUITYSCOPE_CONCURRENCY", &mut self.concurrency);
        override_parsed(
            &lookup,
            "EQUITYSCOPE_REQUEST_TIMEOUT_SECS",
            &mut self.request_timeout_secs,
        );
        override_parsed(
            &lookup,
            "EQUITYSCOPE_FETCH_TIMEOUT_SECS",
            &mut self.fetch_timeout_secs,
        );
        override_parsed(&lookup, "EQUITYSCOPE_CACHE_TTL_SECS", &mut self.cache_ttl_secs);
        override_parsed(&lookup, "EQUITYSCOPE_RETRY_MAX", &mut self.retry_max);
        override_parsed(&lookup, "EQUITYSCOPE_RETRY_BASE_MS", &mut self.retry_base_ms);
        override_parsed(&lookup, "EQUITYSCOPE_RETRY_MAX_MS", &mut self.retry_max_ms);
    }

    pub fn validate(&self) -> Result<(), EquityScopeError> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(EquityScopeError::Config(format!(
                "concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }
        if self.fetch_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(EquityScopeError::Config(
                "timeouts must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in catalogue with this config's markets merged in.
    pub fn catalog(&self) -> Result<MarketCatalog, EquityScopeError> {
        let mut catalog =
            MarketCatalog::builtin().map_err(|e| EquityScopeError::Config(e.to_string()))?;
        catalog.merge(self.markets.clone());
        Ok(catalog)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(val) = lookup(key).and_then(|v| v.trim().parse::<T>().ok()) {
        *target = val;
    }
}
