//! Speech output: one device, one worker thread, one FIFO.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ SpeechQueue (Clone) ──▶ SpeechDispatcher worker thread        │
//! │                          │                                    │
//! │                          ├─ DeviceFactory → dyn SpeechDevice  │
//! │                          │     TtsDevice  (feature "speech")  │
//! │                          │     CommandDevice (say / espeak)   │
//! │                          │     LogDevice  (fallback)          │
//! │                          └─ Readiness (Ready(voices)/Failed)  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use stock_speaker::config::SpeechConfig;
//! use stock_speaker::speech::{default_factory, SpeechDispatcher, UtteranceRequest};
//!
//! let dispatcher = SpeechDispatcher::start(default_factory(&SpeechConfig::default())).unwrap();
//! let queue = dispatcher.queue();
//! queue.readiness().wait(Duration::from_secs(5));
//! queue.enqueue(UtteranceRequest::new("$123.40", None)).unwrap();
//! dispatcher.shutdown();
//! ```

pub mod command_device;
pub mod device;
pub mod dispatcher;
pub mod ready;
#[cfg(feature = "speech")]
pub mod tts_device;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use command_device::{CommandDevice, Synth};
pub use device::{pick_preferred_voice, DeviceFactory, LogDevice, SpeechDevice, SpeechError, Voice};
pub use dispatcher::{SpeechDispatcher, SpeechQueue, SpeechRequest, UtteranceRequest};
pub use ready::{DeviceState, Readiness};
#[cfg(feature = "speech")]
pub use tts_device::TtsDevice;

use crate::config::SpeechConfig;

/// Factory for the best device this build supports.
#[cfg(feature = "speech")]
pub fn default_factory(config: &SpeechConfig) -> DeviceFactory {
    let config = config.clone();
    Box::new(move || Ok(Box::new(TtsDevice::new(&config)?) as Box<dyn SpeechDevice>))
}

/// Factory for the best device this build supports.
///
/// Without the `speech` feature this is the command-line synthesizer found on
/// `PATH`, or the log when there is none.
#[cfg(not(feature = "speech"))]
pub fn default_factory(config: &SpeechConfig) -> DeviceFactory {
    let config = config.clone();
    Box::new(move || match CommandDevice::detect(&config) {
        Some(device) => Ok(Box::new(device) as Box<dyn SpeechDevice>),
        None => {
            log::warn!("speech: no synthesizer on PATH; utterances go to the log");
            Ok(Box::new(LogDevice) as Box<dyn SpeechDevice>)
        }
    })
}

/// Factory that always logs instead of speaking.
pub fn log_factory() -> DeviceFactory {
    Box::new(|| Ok(Box::new(LogDevice) as Box<dyn SpeechDevice>))
}
