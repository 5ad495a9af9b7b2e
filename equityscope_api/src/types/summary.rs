//! Company snapshot types returned by the `quoteSummary` endpoint.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level response body.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummaryEnvelope,
}

/// Result list plus optional provider error. Exactly one of the two is
/// normally populated.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuoteSummaryEnvelope {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummary>>,
    #[serde(default)]
    pub error: Option<ProviderError>,
}

/// Error object embedded in the response body.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProviderError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One company snapshot. Every module is optional; the provider omits
/// modules it has no data for (funds have no `financialData`, for example).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    #[serde(default)]
    pub price: Option<PriceModule>,
    #[serde(default)]
    pub summary_profile: Option<SummaryProfile>,
    #[serde(default)]
    pub summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    pub financial_data: Option<FinancialData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub market_cap: RawValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryProfile {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetail {
    #[serde(default, rename = "trailingPE")]
    pub trailing_pe: RawValue,
    #[serde(default)]
    pub dividend_yield: RawValue,
    #[serde(default)]
    pub payout_ratio: RawValue,
    /// Unix seconds.
    #[serde(default)]
    pub ex_dividend_date: RawValue,
    #[serde(default)]
    pub market_cap: RawValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    /// Fraction, e.g. 1.47 for 147 %.
    #[serde(default)]
    pub return_on_equity: RawValue,
}

/// Numeric field in the provider's `{"raw": 1.5, "fmt": "1.50"}` shape.
///
/// Missing fields arrive as `{}`. A textual `raw` such as `"Infinity"`
/// parses to the matching float; any other text becomes `None`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RawValue {
    #[serde(default, deserialize_with = "deserialize_raw")]
    pub raw: Option<f64>,
    #[serde(default)]
    pub fmt: Option<String>,
}

impl RawValue {
    pub fn value(&self) -> Option<f64> {
        self.raw
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRepr {
    Number(f64),
    Text(String),
}

fn deserialize_raw<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<RawRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(RawRepr::Number(n)) => Some(n),
        Some(RawRepr::Text(s)) => match s.trim() {
            "Infinity" | "inf" => Some(f64::INFINITY),
            "-Infinity" | "-inf" => Some(f64::NEG_INFINITY),
            "NaN" => Some(f64::NAN),
            other => other.parse::<f64>().ok(),
        },
        None => None,
    })
}

impl QuoteSummary {
    /// Short display name, falling back to the long name.
    pub fn display_name(&self) -> Option<String> {
        let price = self.price.as_ref()?;
        price
            .short_name
            .clone()
            .or_else(|| price.long_name.clone())
            .filter(|n| !n.trim().is_empty())
    }

    pub fn sector(&self) -> Option<String> {
        self.summary_profile
            .as_ref()
            .and_then(|p| p.sector.clone())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn industry(&self) -> Option<String> {
        self.summary_profile
            .as_ref()
            .and_then(|p| p.industry.clone())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn trailing_pe(&self) -> Option<f64> {
        self.summary_detail.as_ref()?.trailing_pe.value()
    }

    pub fn return_on_equity(&self) -> Option<f64> {
        self.financial_data.as_ref()?.return_on_equity.value()
    }

    pub fn dividend_yield(&self) -> Option<f64> {
        self.summary_detail.as_ref()?.dividend_yield.value()
    }

    pub fn payout_ratio(&self) -> Option<f64> {
        self.summary_detail.as_ref()?.payout_ratio.value()
    }

    /// Market cap from the price module, or from the detail module when the
    /// price module lacks it.
    pub fn market_cap(&self) -> Option<f64> {
        self.price
            .as_ref()
            .and_then(|p| p.market_cap.value())
            .or_else(|| self.summary_detail.as_ref()?.market_cap.value())
    }

    /// Ex-dividend date as a UTC calendar date.
    pub fn ex_dividend_date(&self) -> Option<NaiveDate> {
        let secs = self.summary_detail.as_ref()?.ex_dividend_date.value()?;
        if !secs.is_finite() {
            return None;
        }
        DateTime::from_timestamp(secs as i64, 0).map(|dt| dt.date_naive())
    }
}
