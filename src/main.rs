//! Application entry point: Stock Speaker.
//!
//! # Startup sequence
//!
//! 1. Parse the command line and initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Start the speech dispatcher thread.
//! 4. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 5. Build the quote source and the [`Poller`].
//! 6. Spawn the controller task on the runtime.
//! 7. Either run headless until Ctrl+C, or run [`eframe::run_native`],
//!    which blocks the main thread until the window is closed.
//! 8. Close the command channel, wait for the loop to stop, then shut the
//!    speech worker down.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use tokio::sync::mpsc;

use stock_speaker::{
    app::StockSpeakerApp,
    config::{AppConfig, AppPaths},
    poller::{run_controller, ControlCommand, Poller, Status},
    quote::{QuoteSource, YahooQuotes},
    speech::{default_factory, DeviceState, SpeechDispatcher},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Periodically fetch a stock price and read it aloud.
#[derive(Debug, Parser)]
#[command(name = "stock-speaker", version, about)]
struct Args {
    /// Run without a window; poll until Ctrl+C.
    #[arg(long)]
    headless: bool,

    /// Ticker symbol to poll (overrides the saved one).
    #[arg(long, short = 't')]
    ticker: Option<String>,

    /// Seconds between polls (overrides the saved value).
    #[arg(long, short = 'i')]
    interval: Option<u64>,

    /// Voice id to speak with.
    #[arg(long)]
    voice: Option<String>,

    /// Settings file to use instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the available voices and exit.
    #[arg(long)]
    list_voices: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(ticker) = &self.ticker {
            config.poll.ticker = ticker.clone();
        }
        if let Some(interval) = self.interval {
            config.poll.interval_secs = interval;
        }
        if let Some(voice) = &self.voice {
            config.poll.voice_id = Some(voice.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// eframe native options
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Stock Speaker")
        .with_inner_size([340.0, 240.0])
        .with_min_inner_size([280.0, 180.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

fn list_voices(dispatcher: &SpeechDispatcher, config: &AppConfig) -> Result<()> {
    let timeout = Duration::from_secs(config.speech.ready_timeout_secs);
    match dispatcher.queue().readiness().wait(timeout) {
        DeviceState::Ready(voices) => {
            for voice in voices {
                println!("{}\t{}", voice.id, voice.name);
            }
            Ok(())
        }
        DeviceState::Failed(msg) => anyhow::bail!("speech device unavailable: {msg}"),
        DeviceState::Pending => anyhow::bail!("speech device did not start within {timeout:?}"),
    }
}

/// Poll until Ctrl+C, printing each status line.
async fn run_headless(
    config: &AppConfig,
    command_tx: mpsc::Sender<ControlCommand>,
    mut status_rx: mpsc::UnboundedReceiver<Status>,
) -> Result<()> {
    config.poll.validate()?;
    command_tx
        .send(ControlCommand::Start(config.poll.clone()))
        .await
        .context("controller is gone")?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("listening for Ctrl+C")?;
                log::info!("interrupted, stopping");
                break;
            }
            status = status_rx.recv() => match status {
                Some(status) => println!("{}", status.describe()),
                None => break,
            },
        }
    }

    command_tx
        .send(ControlCommand::Stop)
        .await
        .context("controller is gone")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Stock Speaker starting up");

    // 2. Configuration
    let settings_file = args
        .config
        .clone()
        .unwrap_or_else(|| AppPaths::new().settings_file);
    let mut config = AppConfig::load_from(&settings_file).unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    args.apply(&mut config);

    // 3. Speech worker
    let dispatcher = SpeechDispatcher::start(default_factory(&config.speech))
        .context("starting the speech worker")?;

    if args.list_voices {
        let listed = list_voices(&dispatcher, &config);
        dispatcher.shutdown();
        return listed;
    }

    // 4. Tokio runtime (2 worker threads: poll loop + controller)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building the tokio runtime")?;

    // 5. Quote source + poller
    let source: Arc<dyn QuoteSource> = Arc::new(YahooQuotes::from_config(&config.quote));
    let (poller, status_rx) = Poller::new(source, dispatcher.queue(), config.poller.clone());

    // 6. Controller
    let (command_tx, command_rx) = mpsc::channel::<ControlCommand>(32);
    let controller = rt.spawn(run_controller(poller, command_rx));

    // 7. Front end
    let outcome = if args.headless {
        rt.block_on(run_headless(&config, command_tx, status_rx))
    } else {
        let options = native_options(&config);
        let app = StockSpeakerApp::new(
            command_tx,
            status_rx,
            dispatcher.queue(),
            config,
            settings_file,
        );
        eframe::run_native("Stock Speaker", options, Box::new(move |_cc| Ok(Box::new(app))))
            .map_err(|e| anyhow::anyhow!("window failed: {e}"))
    };

    // 8. Shutdown: the command sender is gone, so the controller stops the
    //    loop and exits; only then is the speech worker told to finish.
    if let Err(e) = rt.block_on(controller) {
        log::warn!("controller task ended abnormally: {e}");
    }
    dispatcher.shutdown();
    log::info!("Stock Speaker exited");

    outcome
}
