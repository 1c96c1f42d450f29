//! Observable status, loop-private state, and the shared config cell.
//!
//! [`Status`] is the only thing the poller tells the outside world besides
//! what it says out loud.  [`PollState`] never leaves the loop task.
//! [`ConfigCell`] is the one piece of memory both sides touch: the controller
//! replaces the whole [`PollConfig`], the loop clones it once per tick.

use std::sync::{Mutex, PoisonError};

use crate::config::PollConfig;

use super::error::PollError;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome of the latest tick, as seen by the UI.
///
/// ```text
/// Idle ──start──▶ Checking ──exists──▶ Priced ◀──next tick──┐
///                    │                   │                   │
///                    └─not found─▶ Error ┴──fetch failed─────┘
/// any ──stop──▶ Idle
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// No loop is running.
    Idle,
    /// Verifying that the ticker exists.
    Checking(String),
    /// A price was fetched and queued for speech.
    Priced {
        ticker: String,
        price: f64,
        display: String,
    },
    /// Something went wrong this tick; the loop carries on.
    Error(PollError),
}

impl Status {
    /// Short label for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Idle => "Idle",
            Status::Checking(_) => "Checking",
            Status::Priced { .. } => "Priced",
            Status::Error(_) => "Error",
        }
    }

    /// One-line text for display.
    ///
    /// ```
    /// use stock_speaker::poller::Status;
    ///
    /// let status = Status::Priced { ticker: "AAPL".into(), price: 1.0, display: "$1.00".into() };
    /// assert_eq!(status.describe(), "AAPL: $1.00");
    /// ```
    pub fn describe(&self) -> String {
        match self {
            Status::Idle => "Stopped".into(),
            Status::Checking(ticker) => format!("Checking if {ticker} is a valid ticker..."),
            Status::Priced {
                ticker, display, ..
            } => format!("{ticker}: {display}"),
            Status::Error(e) => e.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Idle
    }
}

// ---------------------------------------------------------------------------
// PollState
// ---------------------------------------------------------------------------

/// Bookkeeping owned by the loop task alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    /// Ticker that last passed the existence check.
    pub last_valid_ticker: Option<String>,
    /// Interval that last passed validation; quoted when a later one fails.
    pub last_valid_interval: Option<u64>,
    /// Ticks since the existence check last ran.
    pub ticks_since_check: u32,
    /// Whether a speech-device failure has already been reported.
    pub speech_reported: bool,
}

impl PollState {
    /// Whether `ticker` must go through the existence check this tick.
    ///
    /// `recheck_every` of `0` means only re-check when the ticker changes.
    pub fn needs_check(&self, ticker: &str, recheck_every: u32) -> bool {
        if self.last_valid_ticker.as_deref() != Some(ticker) {
            return true;
        }
        recheck_every > 0 && self.ticks_since_check >= recheck_every
    }
}

// ---------------------------------------------------------------------------
// ConfigCell
// ---------------------------------------------------------------------------

/// Write-replace / snapshot-read holder for the live [`PollConfig`].
#[derive(Debug)]
pub struct ConfigCell(Mutex<PollConfig>);

impl ConfigCell {
    pub fn new(config: PollConfig) -> Self {
        Self(Mutex::new(config))
    }

    /// A private copy, immune to later replacement.
    pub fn snapshot(&self) -> PollConfig {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Swap in a whole new config.
    pub fn replace(&self, config: PollConfig) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn default_status_is_idle() {
        assert_eq!(Status::default(), Status::Idle);
    }

    #[test]
    fn labels() {
        assert_eq!(Status::Idle.label(), "Idle");
        assert_eq!(Status::Checking("A".into()).label(), "Checking");
        assert_eq!(
            Status::Error(PollError::FetchFailed("A".into())).label(),
            "Error"
        );
    }

    #[test]
    fn error_description_uses_display() {
        let status = Status::Error(PollError::TickerNotFound("ZZZZ".into()));
        assert!(status.is_error());
        assert_eq!(status.describe(), "ticker ZZZZ was not found");
    }

    #[test]
    fn new_ticker_needs_check() {
        let state = PollState::default();
        assert!(state.needs_check("AAPL", 0));
    }

    #[test]
    fn cached_ticker_skips_check_unless_periodic() {
        let state = PollState {
            last_valid_ticker: Some("AAPL".into()),
            ticks_since_check: 3,
            ..PollState::default()
        };
        assert!(!state.needs_check("AAPL", 0));
        assert!(!state.needs_check("AAPL", 4));
        assert!(state.needs_check("AAPL", 3));
        assert!(state.needs_check("MSFT", 0));
    }

    #[test]
    fn snapshot_is_not_affected_by_later_replace() {
        let cell = Arc::new(ConfigCell::new(PollConfig::new("AAPL", 5)));
        let snap = cell.snapshot();
        cell.replace(PollConfig::new("MSFT", 1));

        assert_eq!(snap.ticker, "AAPL");
        assert_eq!(cell.snapshot().ticker, "MSFT");
    }
}
