//! Stock Speaker window: egui/eframe application.
//!
//! # Architecture
//!
//! [`StockSpeakerApp`] is the top-level [`eframe::App`].  It owns the form
//! state and three endpoints:
//!
//! * `command_tx`: sends [`ControlCommand`]s to the controller task.
//! * `status_rx`: receives [`Status`] updates from the poller.
//! * `speech`: read-only view of the speech device readiness, used to
//!   fill the voice picker once the device is up.
//!
//! Nothing here touches the poller or the speech device directly; every
//! frame drains `status_rx` and renders whatever arrived.
//!
//! | Status     | Visual                              |
//! |------------|-------------------------------------|
//! | `Idle`     | "Stopped", dim gray                 |
//! | `Checking` | "Checking if X is a valid ticker…"  |
//! | `Priced`   | Large price + per-digit checkboxes  |
//! | `Error`    | Error message, orange               |

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::{AppConfig, PollConfig};
use crate::poller::{ControlCommand, DigitMask, Status};
use crate::speech::{DeviceState, SpeechQueue, Voice};

/// eframe application: the Stock Speaker window.
pub struct StockSpeakerApp {
    // ── Form ─────────────────────────────────────────────────────────────
    /// Ticker field, as typed.
    pub ticker_input: String,
    /// Interval field, as typed.  Unparseable text becomes interval `0`.
    pub interval_input: String,
    /// Selected voice id; `None` lets the device choose.
    pub selected_voice: Option<String>,
    /// Whether the per-digit checkboxes filter what is spoken.
    pub read_digits: bool,
    /// The per-digit switches.
    pub digit_mask: DigitMask,

    // ── Poller view ──────────────────────────────────────────────────────
    /// Latest status received.
    pub status: Status,
    /// Latest price string, kept across error ticks.
    pub last_display: Option<String>,
    /// Set by Start; cleared when the controller acknowledges a Stop.
    pub running: bool,
    /// A Stop has been sent and its `Idle` has not arrived yet.
    pub stopping: bool,

    // ── Speech view ──────────────────────────────────────────────────────
    voices: Vec<Voice>,
    speech_state_known: bool,
    speech_error: Option<String>,

    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<ControlCommand>,
    status_rx: mpsc::UnboundedReceiver<Status>,
    speech: SpeechQueue,

    // ── Configuration ────────────────────────────────────────────────────
    /// Loaded configuration; the form is written back on exit.
    pub config: AppConfig,
    settings_file: PathBuf,
}

impl StockSpeakerApp {
    /// Create the app with the form pre-filled from `config.poll`.
    pub fn new(
        command_tx: mpsc::Sender<ControlCommand>,
        status_rx: mpsc::UnboundedReceiver<Status>,
        speech: SpeechQueue,
        config: AppConfig,
        settings_file: PathBuf,
    ) -> Self {
        let poll = &config.poll;
        Self {
            ticker_input: poll.ticker.clone(),
            interval_input: poll.interval_secs.to_string(),
            selected_voice: poll.voice_id.clone(),
            read_digits: poll.digit_mask.is_some(),
            digit_mask: poll.digit_mask.clone().unwrap_or_default(),
            status: Status::Idle,
            last_display: None,
            running: false,
            stopping: false,
            voices: Vec::new(),
            speech_state_known: false,
            speech_error: None,
            command_tx,
            status_rx,
            speech,
            config,
            settings_file,
        }
    }

    /// The config the form currently describes.
    pub fn form_config(&self) -> PollConfig {
        PollConfig {
            ticker: self.ticker_input.clone(),
            interval_secs: self.interval_input.trim().parse().unwrap_or(0),
            voice_id: self.selected_voice.clone(),
            digit_mask: self.read_digits.then(|| self.digit_mask.clone()),
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending status updates (non-blocking).
    pub fn poll_status(&mut self) {
        while let Ok(status) = self.status_rx.try_recv() {
            match &status {
                Status::Priced { display, .. } => self.last_display = Some(display.clone()),
                Status::Idle => {
                    self.running = false;
                    self.stopping = false;
                }
                _ => {}
            }
            self.status = status;
        }
    }

    /// Pick up the voice list once the speech device reports in.
    fn poll_speech(&mut self) {
        if self.speech_state_known {
            return;
        }
        match self.speech.readiness().state() {
            DeviceState::Pending => {}
            DeviceState::Ready(voices) => {
                self.voices = voices;
                self.speech_state_known = true;
            }
            DeviceState::Failed(msg) => {
                self.speech_error = Some(msg);
                self.speech_state_known = true;
            }
        }
    }

    fn send(&self, command: ControlCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: command not delivered: {e}");
        }
    }

    /// Send `Start` with the form, unless a Stop is still in flight.
    ///
    /// Returns whether the command was sent.
    pub fn press_start(&mut self) -> bool {
        if self.running || self.stopping {
            return false;
        }
        let config = self.form_config();
        if let Err(e) = config.validate() {
            self.status = Status::Error(e);
            return false;
        }
        self.send(ControlCommand::Start(config));
        self.running = true;
        true
    }

    /// Send `Stop`.  The buttons stay disabled until `Idle` comes back.
    pub fn press_stop(&mut self) -> bool {
        if !self.running || self.stopping {
            return false;
        }
        self.send(ControlCommand::Stop);
        self.stopping = true;
        true
    }

    /// Forward the form to a running loop as a live edit.
    fn form_changed(&self) {
        if self.running {
            self.send(ControlCommand::EditConfig(self.form_config()));
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_form(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;

        egui::Grid::new("form").num_columns(2).show(ui, |ui| {
            ui.label("Ticker");
            changed |= ui.text_edit_singleline(&mut self.ticker_input).changed();
            ui.end_row();

            ui.label("Interval (s)");
            changed |= ui.text_edit_singleline(&mut self.interval_input).changed();
            ui.end_row();

            ui.label("Voice");
            let selected_name = self
                .selected_voice
                .as_ref()
                .and_then(|id| self.voices.iter().find(|v| &v.id == id))
                .map(|v| v.name.clone())
                .unwrap_or_else(|| "Default".into());
            egui::ComboBox::from_id_salt("voice")
                .selected_text(selected_name)
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut self.selected_voice, None, "Default")
                        .changed();
                    for voice in &self.voices {
                        changed |= ui
                            .selectable_value(
                                &mut self.selected_voice,
                                Some(voice.id.clone()),
                                voice.name.as_str(),
                            )
                            .changed();
                    }
                });
            ui.end_row();
        });

        if let Some(err) = &self.speech_error {
            ui.label(
                egui::RichText::new(format!("Speech unavailable: {err}"))
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(11.0),
            );
        }

        if changed {
            self.form_changed();
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let idle = !self.stopping;
            if self.running {
                if ui.add_enabled(idle, egui::Button::new("Stop")).clicked() {
                    self.press_stop();
                }
                if ui.add_enabled(idle, egui::Button::new("Apply")).clicked() {
                    self.send(ControlCommand::UpdateConfig(self.form_config()));
                }
                if self.stopping {
                    ui.spinner();
                }
            } else if ui.add_enabled(idle, egui::Button::new("Start")).clicked() {
                self.press_start();
            }
            if ui.checkbox(&mut self.read_digits, "Read digits").changed() {
                self.form_changed();
            }
        });
    }

    fn draw_price(&mut self, ui: &mut egui::Ui) {
        let Some(display) = self.last_display.clone() else {
            return;
        };

        ui.add_space(6.0);
        ui.heading(egui::RichText::new(&display).size(28.0));

        if !self.read_digits {
            return;
        }

        let mut changed = false;
        ui.horizontal(|ui| {
            for (index, digit) in display.chars().filter(char::is_ascii_digit).enumerate() {
                let mut selected = self.digit_mask.selects(index);
                if ui.checkbox(&mut selected, digit.to_string()).changed() {
                    self.digit_mask.toggle(index);
                    changed = true;
                }
            }
        });
        if changed {
            self.form_changed();
        }
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        let color = match &self.status {
            Status::Idle => egui::Color32::from_rgb(120, 120, 120),
            Status::Checking(_) => egui::Color32::from_rgb(68, 136, 255),
            Status::Priced { .. } => egui::Color32::from_rgb(80, 200, 120),
            Status::Error(_) => egui::Color32::from_rgb(255, 136, 68),
        };
        ui.label(
            egui::RichText::new(self.status.describe())
                .color(color)
                .size(12.0),
        );
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for StockSpeakerApp {
    /// Called every frame by eframe.  Polls channels, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_status();
        self.poll_speech();

        // Status arrives from another thread; keep checking for it.
        ctx.request_repaint_after(Duration::from_millis(250));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_form(ui);
            ui.separator();
            self.draw_controls(ui);
            self.draw_price(ui);
            ui.separator();
            self.draw_status(ui);
        });
    }

    /// Remember the form for next launch (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.poll = self.form_config();
        if let Err(e) = self.config.save_to(&self.settings_file) {
            log::warn!("ui: could not save settings: {e}");
        }
        log::info!("Stock Speaker window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
