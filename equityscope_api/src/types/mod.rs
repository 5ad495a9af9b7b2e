mod summary;
pub use self::summary::{
    FinancialData, PriceModule, ProviderError, QuoteSummary, QuoteSummaryEnvelope,
    QuoteSummaryResponse, RawValue, SummaryDetail, SummaryProfile,
};

mod constituents;
pub use self::constituents::parse_symbols;
