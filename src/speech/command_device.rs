//! Speech through the platform's command-line synthesizer.
//!
//! Builds without the `speech` feature still talk when one of `say`
//! (macOS), `espeak-ng`, `espeak` or `spd-say` is on `PATH`.  Each utterance
//! is one child process; [`CommandDevice::speak`] waits for it to exit, so
//! utterances never overlap.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use super::device::{SpeechDevice, SpeechError, Voice};
use crate::config::SpeechConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default speaking rate of `say` and `espeak`, in words per minute.
const NORMAL_WPM: f32 = 175.0;

/// Supported synthesizers, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synth {
    Say,
    EspeakNg,
    Espeak,
    SpdSay,
}

impl Synth {
    const ALL: [Synth; 4] = [Synth::Say, Synth::EspeakNg, Synth::Espeak, Synth::SpdSay];

    pub fn program(self) -> &'static str {
        match self {
            Synth::Say => "say",
            Synth::EspeakNg => "espeak-ng",
            Synth::Espeak => "espeak",
            Synth::SpdSay => "spd-say",
        }
    }

    /// Command-line arguments for one utterance.
    pub fn args(self, text: &str, voice_id: Option<&str>, rate_scale: f32) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            Synth::Say | Synth::EspeakNg | Synth::Espeak => {
                let flag = if self == Synth::Say { "-r" } else { "-s" };
                args.push(flag.to_string());
                args.push(((NORMAL_WPM * rate_scale).round() as i32).to_string());
                if let Some(voice) = voice_id {
                    args.push("-v".into());
                    args.push(voice.to_string());
                }
            }
            Synth::SpdSay => {
                // -w: block until spoken.  Rate is relative, -100..=100.
                args.push("-w".into());
                args.push("-r".into());
                let rate = ((rate_scale - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
                args.push(rate.to_string());
                if let Some(voice) = voice_id {
                    args.push("-y".into());
                    args.push(voice.to_string());
                }
            }
        }
        args.push("--".into());
        args.push(text.to_string());
        args
    }
}

/// First synthesizer found in `search_path` (a `PATH`-style list).
pub fn find_synth(search_path: Option<OsString>) -> Option<(Synth, PathBuf)> {
    let dirs: Vec<PathBuf> = search_path
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    Synth::ALL.into_iter().find_map(|synth| {
        dirs.iter()
            .map(|dir| dir.join(synth.program()))
            .find(|candidate| candidate.is_file())
            .map(|program| (synth, program))
    })
}

/// [`SpeechDevice`] that runs one synthesizer process per utterance.
#[derive(Debug)]
pub struct CommandDevice {
    synth: Synth,
    program: PathBuf,
    rate_scale: f32,
    utterance_timeout: Duration,
}

impl CommandDevice {
    pub fn new(synth: Synth, program: impl AsRef<Path>, config: &SpeechConfig) -> Self {
        Self {
            synth,
            program: program.as_ref().to_path_buf(),
            rate_scale: config.rate_scale,
            utterance_timeout: Duration::from_secs(config.utterance_timeout_secs),
        }
    }

    /// Look the synthesizer up on `PATH`.
    pub fn detect(config: &SpeechConfig) -> Option<Self> {
        let (synth, program) = find_synth(std::env::var_os("PATH"))?;
        log::info!("speech: using {}", program.display());
        Some(Self::new(synth, program, config))
    }
}

impl SpeechDevice for CommandDevice {
    /// Voice names are passed straight to the synthesizer; there is no list.
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, text: &str, voice_id: Option<&str>) -> Result<(), SpeechError> {
        let mut child = Command::new(&self.program)
            .args(self.synth.args(text, voice_id, self.rate_scale))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::Speak(format!("{}: {e}", self.synth.program())))?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(SpeechError::Speak(format!(
                        "{} exited with {status}",
                        self.synth.program()
                    )))
                }
                Ok(None) if started.elapsed() < self.utterance_timeout => {
                    std::thread::sleep(POLL_INTERVAL)
                }
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SpeechError::Speak(format!(
                        "utterance still running after {:?}",
                        self.utterance_timeout
                    )));
                }
                Err(e) => return Err(SpeechError::Speak(e.to_string())),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
