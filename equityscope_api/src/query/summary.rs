//! Query builder for the company snapshot (`quoteSummary`) endpoint.

use std::fmt;

use url::Url;

use super::Query;

/// A data module of the snapshot endpoint. Each module is a group of fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryModule {
    /// Display names, market capitalization, currency.
    Price,
    /// Sector and industry classification.
    SummaryProfile,
    /// Valuation and dividend fields (trailing P/E, yield, payout, ex-date).
    SummaryDetail,
    /// Profitability fields (return on equity).
    FinancialData,
}

impl fmt::Display for SummaryModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SummaryModule::Price => "price",
            SummaryModule::SummaryProfile => "summaryProfile",
            SummaryModule::SummaryDetail => "summaryDetail",
            SummaryModule::FinancialData => "financialData",
        };
        write!(f, "{}", s)
    }
}

/// All modules needed to build a metrics row and the dividend summary.
pub const DEFAULT_MODULES: &[SummaryModule] = &[
    SummaryModule::Price,
    SummaryModule::SummaryProfile,
    SummaryModule::SummaryDetail,
    SummaryModule::FinancialData,
];

/// Snapshot request for a single symbol.
#[derive(Clone, Debug)]
pub struct SummaryQuery {
    pub symbol: String,
    pub modules: Vec<SummaryModule>,
}

impl SummaryQuery {
    /// Creates a query for `symbol` requesting every default module.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            modules: DEFAULT_MODULES.to_vec(),
        }
    }

    /// Replaces the requested modules. Duplicates are dropped, first occurrence wins.
    pub fn with_modules(mut self, modules: &[SummaryModule]) -> Self {
        self.modules.clear();
        for module in modules {
            if !self.modules.contains(module) {
                self.modules.push(*module);
            }
        }
        self
    }
}

impl Query for SummaryQuery {
    fn path_segments(&self) -> Vec<String> {
        vec![
            "v10".to_string(),
            "finance".to_string(),
            "quoteSummary".to_string(),
            self.symbol.clone(),
        ]
    }

    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if !self.modules.is_empty() {
            let modules = self
                .modules
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(",");
            url.query_pairs_mut().append_pair("modules", &modules);
        }
        url
    }
}
