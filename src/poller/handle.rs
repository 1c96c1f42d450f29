//! Start / stop / reconfigure the poll loop.
//!
//! [`PollerHandle`] is the running loop: it owns the cancellation token and
//! the task's join handle, and is consumed by [`PollerHandle::stop`].
//! [`Poller`] is the controller-facing wrapper that holds at most one handle,
//! which is what makes `start` reject a second loop and `stop` idempotent.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{PollConfig, PollerSettings};
use crate::quote::{BoundedQuotes, QuoteSource};
use crate::speech::SpeechQueue;

use super::error::PollError;
use super::runner::PollLoop;
use super::state::{ConfigCell, Status};

// ---------------------------------------------------------------------------
// PollerHandle
// ---------------------------------------------------------------------------

/// A running poll loop.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    config: Arc<ConfigCell>,
}

impl PollerHandle {
    /// Validate `config` and spawn the loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`PollError::InvalidConfig`]: nothing is spawned.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(
        config: PollConfig,
        quotes: BoundedQuotes,
        speech: SpeechQueue,
        status_tx: mpsc::UnboundedSender<Status>,
        settings: PollerSettings,
    ) -> Result<Self, PollError> {
        config.validate()?;

        let cell = Arc::new(ConfigCell::new(config));
        let cancel = CancellationToken::new();
        let poll = PollLoop::new(Arc::clone(&cell), quotes, speech, status_tx, settings);
        let task = tokio::spawn(poll.run(cancel.clone()));

        Ok(Self {
            cancel,
            task,
            config: cell,
        })
    }

    /// Replace the config after validating it.  Takes effect next tick.
    pub fn update_config(&self, config: PollConfig) -> Result<(), PollError> {
        config.validate()?;
        self.config.replace(config);
        Ok(())
    }

    /// Replace the config without validating it.
    ///
    /// Mirrors a form whose fields the loop reads every tick: whatever the
    /// user has typed is used, and the loop reports it if it is unusable.
    pub fn edit_config(&self, config: PollConfig) {
        self.config.replace(config);
    }

    /// Current config.
    pub fn config(&self) -> PollConfig {
        self.config.snapshot()
    }

    /// `true` once the loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the loop to finish its current tick and exit, then wait for it.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::error!("poller: loop task ended abnormally: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Controller-side owner of at most one running loop.
pub struct Poller {
    quotes: BoundedQuotes,
    speech: SpeechQueue,
    status_tx: mpsc::UnboundedSender<Status>,
    settings: PollerSettings,
    active: Option<PollerHandle>,
}

impl Poller {
    /// Build a poller and the receiving end of its status stream.
    pub fn new(
        source: Arc<dyn QuoteSource>,
        speech: SpeechQueue,
        settings: PollerSettings,
    ) -> (Self, mpsc::UnboundedReceiver<Status>) {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let quotes = BoundedQuotes::new(source, settings.fetch_timeout(), settings.check_timeout());
        let poller = Self {
            quotes,
            speech,
            status_tx,
            settings,
            active: None,
        };
        (poller, status_rx)
    }

    /// Whether a loop is currently running.
    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start polling.  Returns immediately.
    ///
    /// # Errors
    ///
    /// * [`PollError::AlreadyRunning`]: a loop is active.
    /// * [`PollError::InvalidConfig`]: nothing changes.
    pub fn start(&mut self, config: PollConfig) -> Result<(), PollError> {
        if self.is_running() {
            return Err(PollError::AlreadyRunning);
        }
        let handle = PollerHandle::spawn(
            config,
            self.quotes.clone(),
            self.speech.clone(),
            self.status_tx.clone(),
            self.settings.clone(),
        )?;
        log::info!("poller: started for {}", handle.config().normalized_ticker());
        self.active = Some(handle);
        Ok(())
    }

    /// Stop polling and wait for the loop to exit.  A no-op when idle.
    ///
    /// Returns whether a loop was stopped; only then is `Idle` emitted.
    pub async fn stop(&mut self) -> bool {
        let Some(handle) = self.active.take() else {
            return false;
        };
        handle.stop().await;
        self.report(Status::Idle);
        true
    }

    /// Validate and apply a new config to the running loop.
    ///
    /// When idle, only validates.
    pub fn update_config(&self, config: PollConfig) -> Result<(), PollError> {
        match &self.active {
            Some(handle) => handle.update_config(config),
            None => config.validate(),
        }
    }

    /// Unvalidated live edit; see [`PollerHandle::edit_config`].
    pub fn edit_config(&self, config: PollConfig) {
        if let Some(handle) = &self.active {
            handle.edit_config(config);
        }
    }

    /// Push a status onto the stream on the loop's behalf.
    pub(crate) fn report(&self, status: Status) {
        let _ = self.status_tx.send(status);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
