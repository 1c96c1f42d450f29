//! Speech device trait, voice descriptor and errors.
//!
//! [`SpeechDevice`] is deliberately **not** `Send`: platform TTS handles are
//! often tied to the thread that created them, so the dispatcher builds the
//! device on its own worker thread from a [`DeviceFactory`] and never moves
//! it.

use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors from the speech subsystem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// The platform TTS engine could not be initialised.
    #[error("speech engine initialisation failed: {0}")]
    Init(String),

    /// The engine rejected or failed an utterance.
    #[error("speech failed: {0}")]
    Speak(String),

    /// Device initialisation failed earlier; requests are being dropped.
    #[error("speech device unavailable: {0}")]
    Unavailable(String),

    /// The dispatcher has shut down and accepts no more requests.
    #[error("speech dispatcher is shut down")]
    Closed,
}

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// A selectable voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Engine-specific identifier passed back in `speak`.
    pub id: String,
    /// Human-readable name for the voice picker.
    pub name: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// First voice whose name contains any of `keywords` (case-insensitive),
/// checking keywords in order of preference.
///
/// ```
/// use stock_speaker::speech::{pick_preferred_voice, Voice};
///
/// let voices = vec![Voice::new("1", "David"), Voice::new("2", "Microsoft Zira")];
/// let keywords = vec!["female".to_string(), "zira".to_string()];
/// assert_eq!(pick_preferred_voice(&voices, &keywords).map(|v| v.id.as_str()), Some("2"));
/// ```
pub fn pick_preferred_voice<'a>(voices: &'a [Voice], keywords: &[String]) -> Option<&'a Voice> {
    keywords.iter().find_map(|keyword| {
        let keyword = keyword.to_lowercase();
        voices
            .iter()
            .find(|voice| voice.name.to_lowercase().contains(&keyword))
    })
}

// ---------------------------------------------------------------------------
// SpeechDevice trait
// ---------------------------------------------------------------------------

/// A blocking text-to-speech output.
pub trait SpeechDevice {
    /// Voices the device can speak with.
    fn voices(&self) -> Vec<Voice>;

    /// Speak `text` and return once the utterance has finished.
    ///
    /// `voice_id` selects a voice from [`voices`](Self::voices); `None` keeps
    /// the device default.
    fn speak(&mut self, text: &str, voice_id: Option<&str>) -> Result<(), SpeechError>;
}

/// Builds the device on the dispatcher's worker thread.
pub type DeviceFactory = Box<dyn FnOnce() -> Result<Box<dyn SpeechDevice>, SpeechError> + Send>;

// ---------------------------------------------------------------------------
// LogDevice
// ---------------------------------------------------------------------------

/// Device that writes utterances to the log instead of the speakers.
///
/// Used when the crate is built without the `speech` feature and no
/// command-line synthesizer is installed.
#[derive(Debug, Default)]
pub struct LogDevice;

impl SpeechDevice for LogDevice {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("log", "Log output")]
    }

    fn speak(&mut self, text: &str, voice_id: Option<&str>) -> Result<(), SpeechError> {
        log::info!("speech: say {text:?} (voice: {})", voice_id.unwrap_or("default"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
