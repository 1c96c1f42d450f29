//! Quote source module.
//!
//! This module provides:
//! * [`QuoteSource`]: async trait implemented by every price backend.
//! * [`YahooQuotes`]: HTTP backend for the Yahoo Finance chart endpoint.
//! * [`BoundedQuotes`]: wraps any source with timeouts and folds every
//!   failure into "absent" / "does not exist".
//! * [`QuoteError`]: error variants for quote lookups.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stock_speaker::config::QuoteConfig;
//! use stock_speaker::quote::{BoundedQuotes, YahooQuotes};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = Arc::new(YahooQuotes::from_config(&QuoteConfig::default()));
//!     let quotes = BoundedQuotes::new(source, Duration::from_secs(10), Duration::from_secs(5));
//!
//!     if quotes.exists("AAPL").await {
//!         println!("{:?}", quotes.price("AAPL").await);
//!     }
//! }
//! ```

pub mod bounded;
pub mod source;
pub mod yahoo;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use bounded::BoundedQuotes;
pub use source::{QuoteError, QuoteSource};
pub use yahoo::YahooQuotes;
