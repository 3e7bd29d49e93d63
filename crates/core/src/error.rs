//! Error types for market data access.
//!
//! Every fetch against the exchange resolves to one of these kinds. Callers
//! decide retry policy; [`MarketDataError::is_transient`] and
//! [`MarketDataError::retry_delay_secs`] help them classify.

use thiserror::Error;

/// Errors that can occur when fetching market data.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Network or transport failure reaching the data source.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Payload does not match the expected shape or a numeric field did not parse.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The source reports the instrument does not exist or is not tradable.
    #[error("unknown instrument: {symbol}")]
    UnknownInstrument {
        /// The rejected symbol.
        symbol: String,
    },

    /// Request weight limit hit.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Any other non-success HTTP status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error body returned by the source.
        message: String,
    },
}

impl MarketDataError {
    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Creates an unknown instrument error.
    pub fn unknown_instrument(symbol: impl Into<String>) -> Self {
        Self::UnknownInstrument {
            symbol: symbol.into(),
        }
    }

    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Returns true if repeating the same request later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::SourceUnavailable(_) | Self::RateLimited { .. } => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            Self::MalformedResponse(_) | Self::UnknownInstrument { .. } => false,
        }
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            Self::SourceUnavailable(_) => Some(1),
            Self::Api { status_code, .. } if *status_code >= 500 => Some(2),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if err.is_timeout() {
            Self::SourceUnavailable(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::SourceUnavailable(format!("connection failed: {err}"))
        } else {
            Self::SourceUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Result type alias for market data operations.
pub type Result<T> = std::result::Result<T, MarketDataError>;
