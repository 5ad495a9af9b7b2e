//! Market catalogue: the enumerated set of exchanges/indices a universe can
//! be loaded from.
//!
//! The built-in catalogue is embedded at compile time from
//! `seed_data/markets.yml`; the config file may add or replace entries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for catalogue operations.
#[derive(Error, Debug)]
pub enum MarketCatalogError {
    #[error("Unknown market '{name}'{}", format_suggestions(.suggestions))]
    UnknownMarket {
        name: String,
        suggestions: Vec<String>,
    },
    #[error("Failed to parse market catalogue YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate market key: {0}")]
    DuplicateKey(String),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// One selectable market and the CSV its symbols come from.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Market {
    /// Short identifier used on the command line (e.g. `sp500`).
    pub key: String,
    /// Display name (e.g. `USA S&P 500`).
    pub name: String,
    pub csv_url: String,
    #[serde(default = "default_symbol_column")]
    pub symbol_column: String,
    /// Provider suffix appended to every symbol (e.g. `.L` for London).
    #[serde(default)]
    pub suffix: Option<String>,
}

fn default_symbol_column() -> String {
    "Symbol".to_string()
}

#[derive(Deserialize, Debug)]
struct MarketFile {
    markets: Vec<Market>,
}

/// Ordered list of markets with lookup by key or display name.
#[derive(Debug, Clone)]
pub struct MarketCatalog {
    markets: Vec<Market>,
}

/// Minimum Jaro-Winkler similarity for a name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

impl MarketCatalog {
    /// Parses and validates a catalogue from YAML content.
    pub fn from_yaml(yaml_content: &str) -> Result<Self, MarketCatalogError> {
        let file: MarketFile = serde_yml::from_str(yaml_content)?;
        let mut seen = HashSet::new();
        for market in &file.markets {
            if !seen.insert(market.key.to_lowercase()) {
                return Err(MarketCatalogError::DuplicateKey(market.key.clone()));
            }
        }
        Ok(Self {
            markets: file.markets,
        })
    }

    /// The catalogue embedded in the binary.
    pub fn builtin() -> Result<Self, MarketCatalogError> {
        Self::from_yaml(include_str!("../../seed_data/markets.yml"))
    }

    /// Adds `extra` markets; an entry whose key already exists replaces it in place.
    pub fn merge(&mut self, extra: Vec<Market>) {
        for market in extra {
            match self
                .markets
                .iter_mut()
                .find(|m| m.key.eq_ignore_ascii_case(&market.key))
            {
                Some(existing) => *existing = market,
                None => self.markets.push(market),
            }
        }
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    /// Looks a market up by key or display name, case-insensitively.
    pub fn find(&self, name: &str) -> Result<&Market, MarketCatalogError> {
        let needle = name.trim();
        self.markets
            .iter()
            .find(|m| m.key.eq_ignore_ascii_case(needle) || m.name.eq_ignore_ascii_case(needle))
            .ok_or_else(|| MarketCatalogError::UnknownMarket {
                name: name.to_string(),
                suggestions: self.suggest(needle),
            })
    }

    fn suggest(&self, needle: &str) -> Vec<String> {
        let needle = needle.to_lowercase();
        let mut scored: Vec<(f64, &Market)> = self
            .markets
            .iter()
            .map(|m| {
                let by_key = strsim::jaro_winkler(&needle, &m.key.to_lowercase());
                let by_name = strsim::jaro_winkler(&needle, &m.name.to_lowercase());
                (by_key.max(by_name), m)
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, m)| m.key.clone()).collect()
    }
}

/// Normalizes an exchange ticker for the data provider.
///
/// Trims and upper-cases, replaces share-class dots with dashes
/// (`BRK.B` -> `BRK-B`) and appends the market suffix. Returns `None` for
/// blank input.
pub fn normalize_symbol(raw: &str, suffix: Option<&str>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.to_uppercase();
    let base = match suffix {
        Some(s) if !s.is_empty() && upper.ends_with(&s.to_uppercase()) => {
            &upper[..upper.len() - s.len()]
        }
        _ => upper.as_str(),
    };
    let mut symbol = base.replace('.', "-");
    if let Some(suffix) = suffix {
        symbol.push_str(suffix);
    }
    Some(symbol)
}
