//! # Joyplot
//!
//! Drive a pen plotter with an analog joystick.
//!
//! ## Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (optional path as the only argument)
//!    - Set up logging with tracing subscriber
//!    - Open the plotter serial port, keyboard and joystick
//!
//! 2. **Session**
//!    - Wait for the clock to settle
//!    - Calibrate: sweep the stick, press fire when done
//!    - Stream relative moves every tick; fire raises/lowers the pen,
//!      keypad +/- changes speed, 1-8 select a pen
//!
//! 3. **Shutdown**
//!    - Escape or Ctrl+C stops the loop and resets the plotter
//!
//! ```bash
//! cargo run --release -- config/default.toml
//! ```

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use joyplot::config::{Config, LoggingConfig};
use joyplot::control_loop::{ControlLoop, LoopSettings};
use joyplot::controller::joystick::Joystick;
use joyplot::input::event_queue;
use joyplot::keyboard::device::Keyboard;
use joyplot::keyboard::dispatcher::KeyCommandDispatcher;
use joyplot::serial::PlotterSerial;
use joyplot::state::ControlState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path))?,
        None => Config::default(),
    };

    let log_guard = init_logging(&config.logging)?;

    info!("Joyplot v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(ControlState::new(config.control.default_speed));

    let serial = PlotterSerial::open(&config.serial)?;
    info!("Plotter serial port opened at: {}", serial.device_path());

    let (events_tx, events_rx) = event_queue();

    let keyboard = Keyboard::open(&config.keyboard.device_path)?;
    info!("Keyboard opened at: {}", keyboard.device_path());
    keyboard.spawn_reader(events_tx.clone())?;
    let keys = KeyCommandDispatcher::with_factors(
        Arc::clone(&state),
        config.control.speed_up_factor,
        config.control.speed_down_factor,
    );

    let joystick = Joystick::open(&config.joystick.device_path)?
        .spawn_poller(config.joystick.axis_mask(), events_tx)?;
    info!("Joystick opened at: {}", joystick.device_path());

    // Ctrl+C behaves like Escape
    let ctrl_c_state = Arc::clone(&state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            ctrl_c_state.stop();
        }
    });

    let mut control = ControlLoop::new(
        joystick,
        serial,
        events_rx,
        state,
        keys,
        LoopSettings::from_config(&config),
    );
    let summary = control.run().await?;

    info!(
        "Session finished: {} ticks, {} commands sent",
        summary.ticks, summary.commands
    );

    // Device reader threads block in the kernel; leave without joining them
    drop(log_guard);
    std::process::exit(0);
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. With a log file configured,
/// output goes there through a non-blocking writer whose guard must live
/// until exit.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level {:?}", config.level))?;

    if config.file.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    }

    let path = Path::new(&config.file);
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file {:?} has no file name", config.file))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}
