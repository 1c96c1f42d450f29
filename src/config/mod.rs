//! Configuration module for Stock Speaker.
//!
//! Provides `AppConfig` (top-level settings), the live [`PollConfig`] the
//! poller snapshots on every tick, sub-configs for each subsystem,
//! `AppPaths` for cross-platform config directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, PollConfig, PollerSettings, QuoteConfig, SpeechConfig, UiConfig};
