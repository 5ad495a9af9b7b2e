use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::EquityScopeError;

pub const MAX_SYMBOL_LENGTH: usize = 20;
pub const MAX_SECTOR_LENGTH: usize = 60;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[\^A-Z0-9][A-Z0-9.\-=^]*$").expect("symbol pattern compiles")
    })
}

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, EquityScopeError> {
    if input.len() > max_len {
        return Err(EquityScopeError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(EquityScopeError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a ticker symbol typed by the user: trimmed, upper-cased, and
/// restricted to the characters the provider uses (`BRK-B`, `^GSPC`, `EURUSD=X`, `VOD.L`).
pub fn validate_symbol(input: &str) -> Result<String, EquityScopeError> {
    let upper = sanitize_text(input, MAX_SYMBOL_LENGTH)?.to_uppercase();
    if symbol_pattern().is_match(&upper) {
        Ok(upper)
    } else {
        Err(EquityScopeError::InvalidInput(format!(
            "'{}' is not a valid ticker symbol",
            input.trim()
        )))
    }
}

/// Validate a sector label: strip control characters, trim, cap the length.
/// Case is preserved since sector matching is exact.
pub fn validate_sector(input: &str) -> Result<String, EquityScopeError> {
    sanitize_text(input, MAX_SECTOR_LENGTH)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, EquityScopeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        EquityScopeError::InvalidInput(format!("'{}' is not a YYYY-MM-DD date", input.trim()))
    })
}

/// Validate that `start <= end`.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), EquityScopeError> {
    if start > end {
        return Err(EquityScopeError::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}
