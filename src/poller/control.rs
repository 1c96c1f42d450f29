//! Command loop between a synchronous front end and the [`Poller`].
//!
//! The egui thread must never block on `stop()`, so it only ever
//! `try_send`s a [`ControlCommand`]; this task owns the [`Poller`] and awaits
//! on its behalf.  Rejected commands come back as [`Status::Error`] on the
//! same stream the loop reports on.

use tokio::sync::mpsc;

use crate::config::PollConfig;

use super::handle::Poller;
use super::state::Status;

/// Commands from the front end.
///
/// `Idle` on the status stream is the acknowledgement of a `Stop`; nothing
/// else emits it while the controller is serving commands.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Start polling with this config.
    Start(PollConfig),
    /// Stop polling; returns once the loop has exited.
    Stop,
    /// Validated config replacement.
    UpdateConfig(PollConfig),
    /// Unvalidated live edit (form fields as typed).
    EditConfig(PollConfig),
}

/// Serve `commands` until the sender side is dropped, then stop polling.
pub async fn run_controller(mut poller: Poller, mut commands: mpsc::Receiver<ControlCommand>) {
    while let Some(command) = commands.recv().await {
        log::debug!("poller: command {command:?}");
        let outcome = match command {
            ControlCommand::Start(config) => poller.start(config),
            ControlCommand::Stop => {
                // Every Stop is answered with exactly one Idle.
                if !poller.stop().await {
                    poller.report(Status::Idle);
                }
                Ok(())
            }
            ControlCommand::UpdateConfig(config) => poller.update_config(config),
            ControlCommand::EditConfig(config) => {
                poller.edit_config(config);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            log::warn!("poller: command rejected: {e}");
            poller.report(Status::Error(e));
        }
    }

    log::info!("poller: command channel closed, stopping");
    poller.stop().await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollerSettings;
    use crate::poller::error::PollError;
    use crate::poller::testing::{next_settled, recording_dispatcher, FakeQuotes};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn commands_drive_the_poller_and_rejections_become_status() {
        let source = Arc::new(FakeQuotes::new(&["AAPL"], Some(42.0)));
        let (dispatcher, _spoken) = recording_dispatcher();
        let (poller, mut status_rx) =
            Poller::new(source, dispatcher.queue(), PollerSettings::default());
        let (tx, rx) = mpsc::channel(8);
        let controller = tokio::spawn(run_controller(poller, rx));

        tx.send(ControlCommand::Start(PollConfig::new("AAPL", 5)))
            .await
            .unwrap();
        assert!(matches!(
            next_settled(&mut status_rx).await,
            Status::Priced { .. }
        ));

        tx.send(ControlCommand::Start(PollConfig::new("AAPL", 5)))
            .await
            .unwrap();
        assert_eq!(
            next_settled(&mut status_rx).await,
            Status::Error(PollError::AlreadyRunning)
        );

        tx.send(ControlCommand::UpdateConfig(PollConfig::new("", 5)))
            .await
            .unwrap();
        assert!(matches!(
            next_settled(&mut status_rx).await,
            Status::Error(PollError::InvalidConfig(_))
        ));

        tx.send(ControlCommand::Stop).await.unwrap();
        assert_eq!(next_settled(&mut status_rx).await, Status::Idle);

        drop(tx);
        controller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_channel_stops_the_loop() {
        let source = Arc::new(FakeQuotes::new(&["AAPL"], Some(42.0)));
        let (dispatcher, _spoken) = recording_dispatcher();
        let (poller, mut status_rx) =
            Poller::new(source, dispatcher.queue(), PollerSettings::default());
        let (tx, rx) = mpsc::channel(8);
        let controller = tokio::spawn(run_controller(poller, rx));

        tx.send(ControlCommand::Start(PollConfig::new("AAPL", 5)))
            .await
            .unwrap();
        assert!(matches!(
            next_settled(&mut status_rx).await,
            Status::Priced { .. }
        ));

        drop(tx);
        controller.await.unwrap();
        assert_eq!(next_settled(&mut status_rx).await, Status::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_idle_is_still_acknowledged() {
        let source = Arc::new(FakeQuotes::new(&["AAPL"], Some(42.0)));
        let (dispatcher, _spoken) = recording_dispatcher();
        let (poller, mut status_rx) =
            Poller::new(source, dispatcher.queue(), PollerSettings::default());
        let (tx, rx) = mpsc::channel(8);
        let controller = tokio::spawn(run_controller(poller, rx));

        tx.send(ControlCommand::Stop).await.unwrap();
        tx.send(ControlCommand::Stop).await.unwrap();
        assert_eq!(next_settled(&mut status_rx).await, Status::Idle);
        assert_eq!(next_settled(&mut status_rx).await, Status::Idle);

        drop(tx);
        controller.await.unwrap();
        assert!(status_rx.try_recv().is_err());
    }
}
