//! Single-consumer speech dispatcher.
//!
//! ```text
//! Poller ──enqueue──▶ unbounded FIFO ──blocking_recv──▶ "speech-dispatcher" thread
//!                                                         │
//!                                                         ├─ factory() once → device
//!                                                         ├─ Readiness::publish
//!                                                         └─ device.speak(..)  one at a time
//! ```
//!
//! The worker owns the device outright, so utterances can never overlap no
//! matter how many [`SpeechQueue`] clones exist.  [`SpeechRequest::Shutdown`]
//! is the only way to stop it; requests queued before the sentinel are still
//! spoken.

use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use super::device::{DeviceFactory, SpeechError};
use super::ready::{DeviceState, Readiness};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One thing to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceRequest {
    pub text: String,
    pub voice_id: Option<String>,
}

impl UtteranceRequest {
    pub fn new(text: impl Into<String>, voice_id: Option<String>) -> Self {
        Self {
            text: text.into(),
            voice_id,
        }
    }
}

/// Queue entry consumed by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechRequest {
    Utterance(UtteranceRequest),
    /// Release the device and exit the worker.
    Shutdown,
}

// ---------------------------------------------------------------------------
// SpeechQueue  (producer side)
// ---------------------------------------------------------------------------

/// Cheap, cloneable producer handle.  Enqueueing never blocks.
#[derive(Debug, Clone)]
pub struct SpeechQueue {
    tx: mpsc::UnboundedSender<SpeechRequest>,
    ready: Arc<Readiness>,
}

impl SpeechQueue {
    /// Queue `request` behind anything already waiting.
    ///
    /// # Errors
    ///
    /// * [`SpeechError::Unavailable`]: the device failed to initialise; the
    ///   request is dropped.
    /// * [`SpeechError::Closed`]: the dispatcher has shut down.
    pub fn enqueue(&self, request: UtteranceRequest) -> Result<(), SpeechError> {
        if let Some(reason) = self.ready.failure() {
            return Err(SpeechError::Unavailable(reason));
        }
        self.tx
            .send(SpeechRequest::Utterance(request))
            .map_err(|_| SpeechError::Closed)
    }

    /// Device readiness, shared with the worker.
    pub fn readiness(&self) -> &Readiness {
        &self.ready
    }
}

// ---------------------------------------------------------------------------
// SpeechDispatcher  (owner side)
// ---------------------------------------------------------------------------

/// Owns the worker thread.  Create once per process.
#[derive(Debug)]
pub struct SpeechDispatcher {
    queue: SpeechQueue,
    worker: Option<JoinHandle<()>>,
}

impl SpeechDispatcher {
    /// Spawn the worker thread.  The device is built lazily on that thread.
    ///
    /// # Errors
    ///
    /// [`SpeechError::Init`] if the OS refuses to create the thread.
    pub fn start(factory: DeviceFactory) -> Result<Self, SpeechError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let ready = Arc::new(Readiness::new());
        let worker_ready = Arc::clone(&ready);

        let worker = std::thread::Builder::new()
            .name("speech-dispatcher".into())
            .spawn(move || run_worker(factory, rx, &worker_ready))
            .map_err(|e| SpeechError::Init(format!("cannot spawn speech thread: {e}")))?;

        Ok(Self {
            queue: SpeechQueue { tx, ready },
            worker: Some(worker),
        })
    }

    /// A producer handle for the poller.
    pub fn queue(&self) -> SpeechQueue {
        self.queue.clone()
    }

    /// Enqueue the sentinel and wait for the worker to drain and exit.
    pub fn shutdown(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        // Fails only if the worker already exited after a failed init.
        let _ = self.queue.tx.send(SpeechRequest::Shutdown);
        if worker.join().is_err() {
            log::error!("speech: worker thread panicked");
        }
    }
}

impl Drop for SpeechDispatcher {
    fn drop(&mut self) {
        self.finish();
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

fn run_worker(
    factory: DeviceFactory,
    mut rx: mpsc::UnboundedReceiver<SpeechRequest>,
    ready: &Readiness,
) {
    let mut device = match factory() {
        Ok(device) => device,
        Err(e) => {
            log::error!("speech: {e}; utterances will be dropped");
            ready.publish(DeviceState::Failed(e.to_string()));
            return;
        }
    };

    let voices = device.voices();
    log::info!("speech: device ready ({} voices)", voices.len());
    ready.publish(DeviceState::Ready(voices));

    while let Some(request) = rx.blocking_recv() {
        match request {
            SpeechRequest::Utterance(utterance) => {
                log::debug!("speech: speaking {:?}", utterance.text);
                if let Err(e) = device.speak(&utterance.text, utterance.voice_id.as_deref()) {
                    log::warn!("speech: {e}");
                }
            }
            SpeechRequest::Shutdown => break,
        }
    }

    drop(device);
    log::info!("speech: worker stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::device::{SpeechDevice, Voice};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// What a recording device saw: text, voice, enter, exit.
    type Log = Arc<Mutex<Vec<(String, Option<String>, Instant, Instant)>>>;

    /// Sleeps for `busy` per utterance and records the span.
    struct RecordingDevice {
        log: Log,
        busy: Duration,
    }

    impl SpeechDevice for RecordingDevice {
        fn voices(&self) -> Vec<Voice> {
            vec![Voice::new("v1", "Voice One"), Voice::new("v2", "Voice Two")]
        }

        fn speak(&mut self, text: &str, voice_id: Option<&str>) -> Result<(), SpeechError> {
            let entered = Instant::now();
            std::thread::sleep(self.busy);
            self.log.lock().unwrap().push((
                text.to_string(),
                voice_id.map(str::to_string),
                entered,
                Instant::now(),
            ));
            Ok(())
        }
    }

    fn recording(busy: Duration) -> (DeviceFactory, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let device_log = Arc::clone(&log);
        let factory: DeviceFactory = Box::new(move || {
            Ok(Box::new(RecordingDevice {
                log: device_log,
                busy,
            }) as Box<dyn SpeechDevice>)
        });
        (factory, log)
    }

    #[test]
    fn utterances_never_overlap_and_keep_fifo_order() {
        let (factory, log) = recording(Duration::from_millis(30));
        let dispatcher = SpeechDispatcher::start(factory).unwrap();

        // Two producers hammering the same queue.
        let handles: Vec<_> = (0..2)
            .map(|p| {
                let queue = dispatcher.queue();
                std::thread::spawn(move || {
                    for i in 0..3 {
                        queue
                            .enqueue(UtteranceRequest::new(format!("p{p}-{i}"), None))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        dispatcher.shutdown();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 6);
        for pair in log.windows(2) {
            assert!(pair[1].2 >= pair[0].3, "utterances overlapped");
        }
        // Per-producer order is preserved.
        for p in 0..2 {
            let spoken: Vec<_> = log
                .iter()
                .map(|e| e.0.clone())
                .filter(|t| t.starts_with(&format!("p{p}-")))
                .collect();
            assert_eq!(spoken, vec![format!("p{p}-0"), format!("p{p}-1"), format!("p{p}-2")]);
        }
    }

    #[test]
    fn voice_id_reaches_the_device() {
        let (factory, log) = recording(Duration::ZERO);
        let dispatcher = SpeechDispatcher::start(factory).unwrap();

        dispatcher
            .queue()
            .enqueue(UtteranceRequest::new("$1.00", Some("v2".into())))
            .unwrap();
        dispatcher.shutdown();

        let log = log.lock().unwrap();
        assert_eq!(log[0].1.as_deref(), Some("v2"));
    }

    #[test]
    fn readiness_reports_voices() {
        let (factory, _log) = recording(Duration::ZERO);
        let dispatcher = SpeechDispatcher::start(factory).unwrap();

        match dispatcher.queue().readiness().wait(Duration::from_secs(5)) {
            DeviceState::Ready(voices) => assert_eq!(voices.len(), 2),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn enqueue_after_shutdown_is_rejected_without_hanging() {
        let (factory, _log) = recording(Duration::ZERO);
        let dispatcher = SpeechDispatcher::start(factory).unwrap();
        let queue = dispatcher.queue();

        dispatcher.shutdown();

        assert_eq!(
            queue.enqueue(UtteranceRequest::new("late", None)),
            Err(SpeechError::Closed)
        );
    }

    #[test]
    fn failed_init_drops_requests_and_reports_unavailable() {
        let factory: DeviceFactory = Box::new(|| Err(SpeechError::Init("no engine".into())));
        let dispatcher = SpeechDispatcher::start(factory).unwrap();
        let queue = dispatcher.queue();

        let state = queue.readiness().wait(Duration::from_secs(5));
        assert!(matches!(state, DeviceState::Failed(ref m) if m.contains("no engine")));

        let err = queue.enqueue(UtteranceRequest::new("x", None)).unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable(_)));

        // Shutdown must not hang even though the worker is already gone.
        dispatcher.shutdown();
    }

    #[test]
    fn drop_joins_the_worker() {
        let (factory, log) = recording(Duration::from_millis(10));
        {
            let dispatcher = SpeechDispatcher::start(factory).unwrap();
            dispatcher
                .queue()
                .enqueue(UtteranceRequest::new("last words", None))
                .unwrap();
        }
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
