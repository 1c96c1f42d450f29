//! Error taxonomy of the polling engine.
//!
//! `InvalidConfig` and `AlreadyRunning` are returned synchronously from
//! commands.  The rest only ever travel inside [`Status::Error`]: the loop
//! absorbs them and keeps going.
//!
//! [`Status::Error`]: super::Status::Error

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Empty ticker or non-positive interval.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start` was called while a loop is active.
    #[error("poller is already running")]
    AlreadyRunning,

    /// The existence check said no, or could not be completed.
    #[error("ticker {0} was not found")]
    TickerNotFound(String),

    /// No price could be fetched for this ticker.
    #[error("failed to fetch price for {0}")]
    FetchFailed(String),

    /// The speech device never came up; prices are shown but not spoken.
    #[error("speech device unavailable: {0}")]
    SpeechDeviceUnavailable(String),
}
