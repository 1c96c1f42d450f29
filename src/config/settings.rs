//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::poller::{DigitMask, PollError};

// ---------------------------------------------------------------------------
// PollConfig
// ---------------------------------------------------------------------------

/// What to poll, how often, and how to say it.
///
/// The controller replaces this value wholesale; the poller clones it at the
/// top of every tick and never holds a reference across a sleep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Ticker symbol as typed by the user (e.g. `"aapl"`).
    pub ticker: String,
    /// Seconds between ticks.  Must be greater than zero.
    pub interval_secs: u64,
    /// Speech voice identifier: `None` lets the device pick.
    pub voice_id: Option<String>,
    /// Optional per-digit filter applied to the spoken price.
    pub digit_mask: Option<DigitMask>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            ticker: "AAPL".into(),
            interval_secs: 60,
            voice_id: None,
            digit_mask: None,
        }
    }
}

impl PollConfig {
    /// Convenience constructor for the two required fields.
    pub fn new(ticker: impl Into<String>, interval_secs: u64) -> Self {
        Self {
            ticker: ticker.into(),
            interval_secs,
            ..Self::default()
        }
    }

    /// Builder-style voice selection.
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Builder-style digit mask.
    pub fn with_digit_mask(mut self, mask: DigitMask) -> Self {
        self.digit_mask = Some(mask);
        self
    }

    /// Trimmed, upper-cased ticker.
    ///
    /// ```
    /// use stock_speaker::config::PollConfig;
    ///
    /// assert_eq!(PollConfig::new("  msft ", 5).normalized_ticker(), "MSFT");
    /// ```
    pub fn normalized_ticker(&self) -> String {
        self.ticker.trim().to_uppercase()
    }

    /// The polling interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Check the interval, then the ticker.
    ///
    /// # Errors
    ///
    /// [`PollError::InvalidConfig`] when the interval is zero or the ticker is
    /// blank.
    pub fn validate(&self) -> Result<(), PollError> {
        self.validate_interval()?;
        self.validate_ticker()
    }

    pub(crate) fn validate_interval(&self) -> Result<(), PollError> {
        if self.interval_secs == 0 {
            return Err(PollError::InvalidConfig(
                "interval must be a positive number of seconds".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn validate_ticker(&self) -> Result<(), PollError> {
        if self.ticker.trim().is_empty() {
            return Err(PollError::InvalidConfig("ticker cannot be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PollerSettings
// ---------------------------------------------------------------------------

/// Timing knobs for the poll loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerSettings {
    /// Delay before retrying after an invalid config or unknown ticker.
    pub retry_delay_ms: u64,
    /// Upper bound on a single price fetch.
    pub fetch_timeout_secs: u64,
    /// Upper bound on a single ticker existence check.
    pub check_timeout_secs: u64,
    /// Re-run the existence check every N successful ticks even when the
    /// ticker has not changed.  `0` disables the periodic recheck.
    pub recheck_every_ticks: u32,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            retry_delay_ms: 1_000,
            fetch_timeout_secs: 10,
            check_timeout_secs: 5,
            recheck_every_ticks: 0,
        }
    }
}

impl PollerSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// QuoteConfig
// ---------------------------------------------------------------------------

/// Settings for the HTTP quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Base URL of the chart API (no trailing slash).
    pub base_url: String,
    /// `User-Agent` header sent with every request.  The endpoint rejects
    /// requests that do not look like a browser.
    pub user_agent: String,
    /// Client-level request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech device and dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Multiplier applied to the engine's default speaking rate.
    pub rate_scale: f32,
    /// When no voice is requested, the first voice whose name contains one
    /// of these (case-insensitive) is used.
    pub preferred_voice_keywords: Vec<String>,
    /// Longest time a single utterance may take before the worker moves on.
    pub utterance_timeout_secs: u64,
    /// How long the UI waits for the device to come up before giving up on
    /// the voice list.
    pub ready_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate_scale: 0.95,
            preferred_voice_keywords: vec!["female".into(), "zira".into(), "samantha".into()],
            utterance_timeout_secs: 30,
            ready_timeout_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use stock_speaker::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// println!("last ticker: {}", config.poll.ticker);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Last used ticker / interval / voice.
    pub poll: PollConfig,
    /// Poll loop timing.
    pub poller: PollerSettings,
    /// HTTP quote source.
    pub quote: QuoteConfig,
    /// Speech device tuning.
    pub speech: SpeechConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.poll.interval_secs, 60);
        assert!(cfg.poll.voice_id.is_none());
        assert_eq!(cfg.poller.retry_delay_ms, 1_000);
        assert_eq!(cfg.poller.fetch_timeout_secs, 10);
        assert_eq!(cfg.poller.check_timeout_secs, 5);
        assert_eq!(cfg.poller.recheck_every_ticks, 0);
        assert_eq!(cfg.quote.base_url, "https://query1.finance.yahoo.com");
        assert!((cfg.speech.rate_scale - 0.95).abs() < f32::EPSILON);
        assert!(cfg.speech.preferred_voice_keywords.contains(&"zira".to_string()));
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.poll = PollConfig::new("TSLA", 15)
            .with_voice("voice-2")
            .with_digit_mask(DigitMask::new(vec![false, true, true]));
        cfg.poller.recheck_every_ticks = 10;
        cfg.speech.rate_scale = 1.2;
        cfg.ui.window_position = Some((100.0, 200.0));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[poll]\nticker = \"NVDA\"\n").unwrap();

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.poll.ticker, "NVDA");
        assert_eq!(loaded.poll.interval_secs, 60);
        assert_eq!(loaded.poller, PollerSettings::default());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let err = PollConfig::new("AAPL", 0).validate().unwrap_err();
        assert!(matches!(err, PollError::InvalidConfig(_)));
    }

    #[test]
    fn validate_rejects_blank_ticker() {
        let err = PollConfig::new("   ", 5).validate().unwrap_err();
        assert!(matches!(err, PollError::InvalidConfig(_)));
    }

    #[test]
    fn validate_accepts_good_config() {
        assert!(PollConfig::new("aapl", 1).validate().is_ok());
    }
}
