//! Polling engine: sample a quote on a timer and hand utterances to speech.
//!
//! # Architecture
//!
//! ```text
//! UI thread ──ControlCommand (mpsc)──▶ run_controller()   ← tokio task
//!                                          │ owns Poller
//!                                          ▼
//!                                   PollerHandle::spawn
//!                                          │ CancellationToken + JoinHandle
//!                                          ▼
//!                                   PollLoop::run()       ← tokio task
//!                                     ├─ ConfigCell::snapshot   (per tick)
//!                                     ├─ BoundedQuotes          (timeouts)
//!                                     ├─ SpeechQueue::enqueue   (non-blocking)
//!                                     └─ Status ──(unbounded mpsc)──▶ UI
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stock_speaker::config::{AppConfig, PollConfig};
//! use stock_speaker::poller::Poller;
//! use stock_speaker::quote::YahooQuotes;
//! use stock_speaker::speech::{default_factory, SpeechDispatcher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let speech = SpeechDispatcher::start(default_factory(&config.speech)).unwrap();
//!     let source = Arc::new(YahooQuotes::from_config(&config.quote));
//!
//!     let (mut poller, mut status_rx) = Poller::new(source, speech.queue(), config.poller);
//!     poller.start(PollConfig::new("AAPL", 30)).unwrap();
//!
//!     while let Some(status) = status_rx.recv().await {
//!         println!("{}", status.describe());
//!     }
//! }
//! ```

pub mod control;
pub mod error;
pub mod format;
pub mod handle;
pub mod runner;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use control::{run_controller, ControlCommand};
pub use error::PollError;
pub use format::{format_price, format_utterance, DigitMask};
pub use handle::{Poller, PollerHandle};
pub use state::{ConfigCell, PollState, Status};
