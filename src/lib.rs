//! Stock Speaker: periodically fetches a stock quote and reads it aloud.
//!
//! The crate is split into:
//!
//! * [`config`]: TOML settings and platform paths.
//! * [`quote`]: the quote source seam and its HTTP adapter.
//! * [`speech`]: the speech device seam and the single-consumer dispatcher.
//! * [`poller`]: the timer loop, its handle, and the controller task.
//! * [`app`]: the egui front end.

pub mod app;
pub mod config;
pub mod poller;
pub mod quote;
pub mod speech;
