//! Time-bounded, failure-folding wrapper around any [`QuoteSource`].
//!
//! The poll loop must never wait on the network longer than a fixed bound and
//! must never see an error it has to handle differently from "no price".
//! [`BoundedQuotes`] applies `tokio::time::timeout` to each call and turns
//! every failure into `None` / `false`, logging the cause.

use std::sync::Arc;
use std::time::Duration;

use crate::quote::source::QuoteSource;

/// A [`QuoteSource`] with per-call deadlines and no error path.
#[derive(Clone)]
pub struct BoundedQuotes {
    inner: Arc<dyn QuoteSource>,
    fetch_timeout: Duration,
    check_timeout: Duration,
}

impl BoundedQuotes {
    pub fn new(inner: Arc<dyn QuoteSource>, fetch_timeout: Duration, check_timeout: Duration) -> Self {
        Self {
            inner,
            fetch_timeout,
            check_timeout,
        }
    }

    /// Price of `ticker`, or `None` on any error or timeout.
    pub async fn price(&self, ticker: &str) -> Option<f64> {
        match tokio::time::timeout(self.fetch_timeout, self.inner.fetch_price(ticker)).await {
            Ok(Ok(price)) => Some(price),
            Ok(Err(e)) => {
                log::warn!("quote: price lookup for {ticker} failed: {e}");
                None
            }
            Err(_) => {
                log::warn!(
                    "quote: price lookup for {ticker} exceeded {:?}",
                    self.fetch_timeout
                );
                None
            }
        }
    }

    /// Whether `ticker` exists; `false` on any error or timeout.
    pub async fn exists(&self, ticker: &str) -> bool {
        match tokio::time::timeout(self.check_timeout, self.inner.ticker_exists(ticker)).await {
            Ok(Ok(exists)) => exists,
            Ok(Err(e)) => {
                log::warn!("quote: existence check for {ticker} failed: {e}");
                false
            }
            Err(_) => {
                log::warn!(
                    "quote: existence check for {ticker} exceeded {:?}",
                    self.check_timeout
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
