//! Core `QuoteSource` trait and its error type.

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// QuoteError
// ---------------------------------------------------------------------------

/// Errors that can occur while looking up a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete in time.
    #[error("quote request timed out")]
    Timeout,

    /// The server answered with a non-success status code.
    #[error("quote server returned HTTP {0}")]
    Status(u16),

    /// The response body could not be parsed.
    #[error("failed to parse quote response: {0}")]
    Parse(String),

    /// The response parsed but carried no price.
    #[error("quote response contained no price")]
    MissingPrice,
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            QuoteError::Timeout
        } else if let Some(status) = e.status() {
            QuoteError::Status(status.as_u16())
        } else {
            QuoteError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// QuoteSource trait
// ---------------------------------------------------------------------------

/// Async trait for anything that can price a ticker.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn QuoteSource>` between the poll loop and the UI.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Current price of `ticker`.
    async fn fetch_price(&self, ticker: &str) -> Result<f64, QuoteError>;

    /// Whether `ticker` names a listed instrument.
    async fn ticker_exists(&self, ticker: &str) -> Result<bool, QuoteError>;
}
