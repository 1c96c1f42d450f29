//! The poll loop: one fetch-and-speak cycle per interval.
//!
//! # Tick
//!
//! ```text
//! snapshot config
//!   ├─ interval invalid ─▶ Error(InvalidConfig)   ─▶ wait retry_delay
//!   ├─ ticker invalid   ─▶ Error(InvalidConfig)   ─▶ wait retry_delay
//!   ├─ ticker new / recheck due
//!   │     Checking ─▶ exists? ── no ─▶ Error(TickerNotFound) ─▶ wait retry_delay
//!   ├─ price? ── none ─▶ Error(FetchFailed) ─▶ wait interval
//!   └─ Priced ─▶ enqueue utterance (never waits for speech) ─▶ wait interval
//! ```
//!
//! Cancellation is checked before each tick and raced against the wait; a
//! tick that is already talking to the quote source finishes first, which
//! bounds shutdown latency by the quote timeouts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::PollerSettings;
use crate::quote::BoundedQuotes;
use crate::speech::{SpeechError, SpeechQueue, UtteranceRequest};

use super::error::PollError;
use super::format::{format_price, format_utterance};
use super::state::{ConfigCell, PollState, Status};

/// Everything the loop task owns.
pub(crate) struct PollLoop {
    config: Arc<ConfigCell>,
    quotes: BoundedQuotes,
    speech: SpeechQueue,
    status_tx: mpsc::UnboundedSender<Status>,
    settings: PollerSettings,
    state: PollState,
}

impl PollLoop {
    pub(crate) fn new(
        config: Arc<ConfigCell>,
        quotes: BoundedQuotes,
        speech: SpeechQueue,
        status_tx: mpsc::UnboundedSender<Status>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            config,
            quotes,
            speech,
            status_tx,
            settings,
            state: PollState::default(),
        }
    }

    /// Tick until `cancel` fires.
    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        log::info!("poller: loop started");

        while !cancel.is_cancelled() {
            let pause = self.tick().await;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        log::info!("poller: loop stopped");
    }

    /// Run one tick and return how long to wait before the next one.
    async fn tick(&mut self) -> Duration {
        let snapshot = self.config.snapshot();
        let retry = self.settings.retry_delay();

        if let Err(e) = snapshot.validate_interval() {
            let e = match (e, self.state.last_valid_interval) {
                (PollError::InvalidConfig(reason), Some(last)) => {
                    PollError::InvalidConfig(format!("{reason} (last valid: {last}s)"))
                }
                (e, _) => e,
            };
            self.emit(Status::Error(e));
            return retry;
        }
        self.state.last_valid_interval = Some(snapshot.interval_secs);

        if let Err(e) = snapshot.validate_ticker() {
            self.emit(Status::Error(e));
            return retry;
        }
        let ticker = snapshot.normalized_ticker();

        if self
            .state
            .needs_check(&ticker, self.settings.recheck_every_ticks)
        {
            self.emit(Status::Checking(ticker.clone()));
            if !self.quotes.exists(&ticker).await {
                self.state.last_valid_ticker = None;
                self.emit(Status::Error(PollError::TickerNotFound(ticker)));
                return retry;
            }
            log::debug!("poller: {ticker} verified");
            self.state.last_valid_ticker = Some(ticker.clone());
            self.state.ticks_since_check = 0;
        }
        self.state.ticks_since_check = self.state.ticks_since_check.saturating_add(1);

        let interval = snapshot.interval();

        let Some(price) = self.quotes.price(&ticker).await else {
            self.emit(Status::Error(PollError::FetchFailed(ticker)));
            return interval;
        };

        let display = format_price(price);
        let text = format_utterance(&display, snapshot.digit_mask.as_ref());

        self.emit(Status::Priced {
            ticker,
            price,
            display,
        });

        if !text.is_empty() {
            self.dispatch(UtteranceRequest::new(text, snapshot.voice_id));
        }

        interval
    }

    fn dispatch(&mut self, request: UtteranceRequest) {
        match self.speech.enqueue(request) {
            Ok(()) => {}
            Err(SpeechError::Unavailable(reason)) => {
                if !self.state.speech_reported {
                    self.state.speech_reported = true;
                    self.emit(Status::Error(PollError::SpeechDeviceUnavailable(reason)));
                }
            }
            Err(e) => log::warn!("poller: utterance dropped: {e}"),
        }
    }

    fn emit(&self, status: Status) {
        match &status {
            Status::Error(e) => log::warn!("poller: {e}"),
            other => log::debug!("poller: {}", other.describe()),
        }
        // Nobody listening is fine; the loop only stops through cancel.
        let _ = self.status_tx.send(status);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
