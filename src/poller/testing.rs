//! Test doubles shared by the poller test modules.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::quote::{QuoteError, QuoteSource};
use crate::speech::{DeviceFactory, SpeechDevice, SpeechDispatcher, SpeechError, Voice};

use super::state::Status;

/// Scriptable quote source.
///
/// `fetch_price` pops the script first (`None` = failure) and falls back to
/// `default_price` once it is empty.  Only tickers in `known` exist.
pub(crate) struct FakeQuotes {
    script: Mutex<VecDeque<Option<f64>>>,
    default_price: Option<f64>,
    known: HashSet<String>,
    delay: Duration,
    pub fetches: AtomicUsize,
    pub checks: AtomicUsize,
}

impl FakeQuotes {
    pub fn new(known: &[&str], default_price: Option<f64>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_price,
            known: known.iter().map(|t| t.to_string()).collect(),
            delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
        }
    }

    pub fn with_script(self, script: Vec<Option<f64>>) -> Self {
        *self.script.lock().unwrap() = script.into();
        self
    }

    /// Make every call take `delay` (on the tokio clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for FakeQuotes {
    async fn fetch_price(&self, _ticker: &str) -> Result<f64, QuoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_price);
        next.ok_or(QuoteError::MissingPrice)
    }

    async fn ticker_exists(&self, ticker: &str) -> Result<bool, QuoteError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.known.contains(ticker))
    }
}

/// Utterances spoken by a [`RecordingDevice`].
pub(crate) type Spoken = Arc<Mutex<Vec<(String, Option<String>)>>>;

struct RecordingDevice(Spoken);

impl SpeechDevice for RecordingDevice {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("v1", "Test Voice")]
    }

    fn speak(&mut self, text: &str, voice_id: Option<&str>) -> Result<(), SpeechError> {
        self.0
            .lock()
            .unwrap()
            .push((text.to_string(), voice_id.map(str::to_string)));
        Ok(())
    }
}

/// A dispatcher whose device records every utterance.
pub(crate) fn recording_dispatcher() -> (SpeechDispatcher, Spoken) {
    let spoken: Spoken = Arc::new(Mutex::new(Vec::new()));
    let device_log = Arc::clone(&spoken);
    let factory: DeviceFactory =
        Box::new(move || Ok(Box::new(RecordingDevice(device_log)) as Box<dyn SpeechDevice>));
    let dispatcher = SpeechDispatcher::start(factory).expect("spawn speech worker");
    (dispatcher, spoken)
}

/// A dispatcher whose device fails to initialise.
pub(crate) fn broken_dispatcher() -> SpeechDispatcher {
    let factory: DeviceFactory = Box::new(|| Err(SpeechError::Init("no audio".into())));
    let dispatcher = SpeechDispatcher::start(factory).expect("spawn speech worker");
    dispatcher
        .queue()
        .readiness()
        .wait(Duration::from_secs(5));
    dispatcher
}

/// Next status that is not `Checking`.
pub(crate) async fn next_settled(rx: &mut mpsc::UnboundedReceiver<Status>) -> Status {
    loop {
        match rx.recv().await.expect("status channel closed") {
            Status::Checking(_) => continue,
            other => return other,
        }
    }
}

pub(crate) fn priced(ticker: &str, price: f64, display: &str) -> Status {
    Status::Priced {
        ticker: ticker.into(),
        price,
        display: display.into(),
    }
}
