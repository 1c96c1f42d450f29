//! Platform text-to-speech through the `tts` crate.
//!
//! `tts::Tts::speak` returns as soon as the utterance is queued in the
//! engine, so [`TtsDevice::speak`] waits for completion itself: through the
//! utterance-end callback where the backend supports it, otherwise by polling
//! `is_speaking`.

use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};

use tts::{Features, Tts, UtteranceId};

use super::device::{pick_preferred_voice, SpeechDevice, SpeechError, Voice};
use crate::config::SpeechConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct TtsDevice {
    tts: Tts,
    features: Features,
    engine_voices: Vec<tts::Voice>,
    voices: Vec<Voice>,
    default_voice: Option<String>,
    current_voice: Option<String>,
    finished_rx: Option<std_mpsc::Receiver<UtteranceId>>,
    utterance_timeout: Duration,
}

impl TtsDevice {
    /// Initialise the platform engine and apply rate / preferred voice.
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let mut tts = Tts::default().map_err(|e| SpeechError::Init(e.to_string()))?;
        let features = tts.supported_features();

        if features.rate {
            let rate = (tts.normal_rate() * config.rate_scale).clamp(tts.min_rate(), tts.max_rate());
            if let Err(e) = tts.set_rate(rate) {
                log::warn!("speech: cannot set rate {rate}: {e}");
            }
        }

        let engine_voices = if features.voice {
            tts.voices().unwrap_or_default()
        } else {
            Vec::new()
        };
        let voices: Vec<Voice> = engine_voices
            .iter()
            .map(|v| Voice::new(v.id(), v.name()))
            .collect();

        let default_voice =
            pick_preferred_voice(&voices, &config.preferred_voice_keywords).map(|v| v.id.clone());

        let finished_rx = if features.utterance_callbacks {
            let (tx, rx) = std_mpsc::channel();
            tts.on_utterance_end(Some(Box::new(move |id| {
                let _ = tx.send(id);
            })))
            .map_err(|e| SpeechError::Init(e.to_string()))?;
            Some(rx)
        } else {
            None
        };

        let mut device = Self {
            tts,
            features,
            engine_voices,
            voices,
            default_voice,
            current_voice: None,
            finished_rx,
            utterance_timeout: Duration::from_secs(config.utterance_timeout_secs),
        };
        let initial = device.default_voice.clone();
        device.select_voice(initial.as_deref());
        Ok(device)
    }

    fn select_voice(&mut self, voice_id: Option<&str>) {
        let Some(wanted) = voice_id.or(self.default_voice.as_deref()).map(str::to_string) else {
            return;
        };
        if !self.features.voice || self.current_voice.as_deref() == Some(wanted.as_str()) {
            return;
        }
        match self.engine_voices.iter().find(|v| v.id() == wanted) {
            Some(voice) => match self.tts.set_voice(voice) {
                Ok(_) => self.current_voice = Some(wanted),
                Err(e) => log::warn!("speech: cannot select voice {wanted}: {e}"),
            },
            None => log::warn!("speech: unknown voice {wanted}"),
        }
    }

    fn wait_until_finished(&self, started: Instant) {
        if let Some(rx) = &self.finished_rx {
            if rx.recv_timeout(self.utterance_timeout).is_err() {
                log::warn!("speech: no end-of-utterance signal within {:?}", self.utterance_timeout);
            }
            return;
        }
        if !self.features.is_speaking {
            return;
        }
        while started.elapsed() < self.utterance_timeout {
            match self.tts.is_speaking() {
                Ok(true) => std::thread::sleep(POLL_INTERVAL),
                _ => return,
            }
        }
        log::warn!("speech: utterance still running after {:?}", self.utterance_timeout);
    }
}

impl SpeechDevice for TtsDevice {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, text: &str, voice_id: Option<&str>) -> Result<(), SpeechError> {
        self.select_voice(voice_id);

        if let Some(rx) = &self.finished_rx {
            // Discard stale end events from a timed-out utterance.
            while rx.try_recv().is_ok() {}
        }

        let started = Instant::now();
        self.tts
            .speak(text, false)
            .map_err(|e| SpeechError::Speak(e.to_string()))?;
        self.wait_until_finished(started);
        Ok(())
    }
}
