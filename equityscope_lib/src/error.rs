//! Error types for the library layer.

use std::fmt;

use crate::yahoo::YahooError;

/// Errors produced by the library layer, wrapping upstream API errors
/// and adding configuration and input validation failures.
#[derive(Debug)]
pub enum EquityScopeError {
    /// An error from the snapshot/constituent API client.
    Api(equityscope_api::Error),
    /// An error from the price history source.
    Yahoo(YahooError),
    /// The configuration file or environment could not be used.
    Config(String),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for EquityScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Yahoo(e) => write!(f, "Price history error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for EquityScopeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Yahoo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<equityscope_api::Error> for EquityScopeError {
    fn from(e: equityscope_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<YahooError> for EquityScopeError {
    fn from(e: YahooError) -> Self {
        Self::Yahoo(e)
    }
}
