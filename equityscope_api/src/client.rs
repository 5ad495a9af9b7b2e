//! HTTP client for the company snapshot endpoint and constituent lists.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::Mutex;
use url::Url;

use crate::{
    query::{Query, SummaryQuery},
    types::{parse_symbols, QuoteSummary, QuoteSummaryResponse},
    user_agent::get_user_agent,
    Error,
};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_SESSION_URL: &str = "https://fc.yahoo.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const CRUMB_PATH: [&str; 3] = ["v1", "test", "getcrumb"];

/// HTTP client for the market data provider.
///
/// Holds one connection pool with a cookie store. Snapshot requests need a
/// session cookie plus the crumb issued for it; both are obtained on first
/// use and renewed once when the provider rejects the crumb.
pub struct Client {
    /// Base URL for the API. Defaults to `https://query2.finance.yahoo.com`.
    base_api_url: String,
    /// Page whose response sets the session cookie.
    session_url: String,
    http: reqwest::Client,
    crumb: Mutex<Option<String>>,
}

impl Client {
    /// Creates a new client pointing at the production API.
    pub fn new() -> Result<Self, Error> {
        Self::with_options(DEFAULT_BASE_URL, DEFAULT_SESSION_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a new client with a custom base URL that also serves the
    /// session cookie. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_options(base_url, base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a new client with custom API and session URLs and a
    /// per-request timeout.
    pub fn with_options(
        base_url: &str,
        session_url: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            session_url: session_url.to_string(),
            http,
            crumb: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn api_url(&self, segments: &[String]) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_api_url).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                tracing::error!("Base URL cannot carry a path: {}", self.base_api_url);
                Error::RequestFailed
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_url(&self, query: &impl Query) -> Result<Url, Error> {
        let url = self.api_url(&query.path_segments())?;
        Ok(query.add_to_url(&url))
    }

    async fn get_text(&self, url: Url) -> Result<(StatusCode, String), Error> {
        let resp = self
            .http
            .get(url)
            .header("user-agent", get_user_agent())
            .header("accept", "application/json, text/csv, text/plain, */*")
            .header("accept-language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;
        Ok((status, body))
    }

    /// Visits the session page for its cookie, then asks for a crumb.
    ///
    /// The session page may answer with any status; only the cookie matters.
    async fn fetch_crumb(&self) -> Result<String, Error> {
        let session = Url::parse(&self.session_url).map_err(|e| {
            tracing::error!("Invalid session URL {}: {}", self.session_url, e);
            Error::RequestFailed
        })?;
        let (status, _) = self.get_text(session).await?;
        tracing::debug!("Session page answered {}", status);

        let crumb_segments: Vec<String> = CRUMB_PATH.iter().map(|s| s.to_string()).collect();
        let (status, body) = self.get_text(self.api_url(&crumb_segments)?).await?;
        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Crumb request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let crumb = body.trim();
        if crumb.is_empty() || crumb.contains(char::is_whitespace) || crumb.contains('<') {
            return Err(Error::Session(format!(
                "unexpected crumb response: {}",
                truncate_body(crumb)
            )));
        }
        tracing::debug!("Obtained provider crumb");
        Ok(crumb.to_string())
    }

    /// The cached crumb, fetching one first if there is none.
    async fn crumb(&self) -> Result<String, Error> {
        let mut slot = self.crumb.lock().await;
        if let Some(crumb) = slot.as_ref() {
            return Ok(crumb.clone());
        }
        let crumb = self.fetch_crumb().await?;
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    /// Replaces `rejected` with a new crumb. If another request already
    /// replaced it, that crumb is reused.
    async fn refresh_crumb(&self, rejected: &str) -> Result<String, Error> {
        let mut slot = self.crumb.lock().await;
        if let Some(current) = slot.as_ref().filter(|c| c.as_str() != rejected) {
            return Ok(current.clone());
        }
        *slot = None;
        let crumb = self.fetch_crumb().await?;
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    /// Fetches the company snapshot for one symbol.
    ///
    /// A 401 renews the session and repeats the request once. A 404, or a
    /// 200 whose result list is empty, maps to [`Error::NotFound`].
    pub async fn get_quote_summary(&self, query: &SummaryQuery) -> Result<QuoteSummary, Error> {
        let url = self.get_url(query)?;
        let crumb = self.crumb().await?;
        let (mut status, mut body) = self.get_text(with_crumb(&url, &crumb)).await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Crumb rejected for {}, renewing session", query.symbol);
            let crumb = self.refresh_crumb(&crumb).await?;
            (status, body) = self.get_text(with_crumb(&url, &crumb)).await?;
        }

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("No snapshot for {}", query.symbol);
            return Err(Error::NotFound(query.symbol.clone()));
        }

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let parsed = serde_json::from_str::<QuoteSummaryResponse>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::RequestFailed
        })?;

        parsed
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| Error::NotFound(query.symbol.clone()))
    }

    /// Downloads a constituent CSV and returns the cells of `symbol_column`.
    ///
    /// `csv_url` is absolute; it does not go through the API base URL.
    pub async fn get_constituents(
        &self,
        csv_url: &str,
        symbol_column: &str,
    ) -> Result<Vec<String>, Error> {
        let url = Url::parse(csv_url).map_err(|e| {
            tracing::error!("Invalid constituent URL {}: {}", csv_url, e);
            Error::RequestFailed
        })?;
        let (status, body) = self.get_text(url).await?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Constituent list failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        parse_symbols(&body, symbol_column)
    }
}

fn with_crumb(url: &Url, crumb: &str) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut().append_pair("crumb", crumb);
    url
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_body_untouched() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_long_body() {
        let body = "x".repeat(2500);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
        assert_eq!(out.len(), 2000 + "...[truncated]".len());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(1500);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
    }

    #[test]
    fn crumb_is_appended_after_modules() {
        let url = Url::parse("https://example.com/v10/finance/quoteSummary/AAPL?modules=price")
            .unwrap();
        assert_eq!(
            with_crumb(&url, "a/b.c").as_str(),
            "https://example.com/v10/finance/quoteSummary/AAPL?modules=price&crumb=a%2Fb.c"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = Client::with_base_url("http://localhost:1234/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}
