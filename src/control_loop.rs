//! # Main Control Loop
//!
//! Sequences the session: `Calibrating → SteadyState → Shutdown`.
//!
//! 1. **Entry**: wait a fixed synchronization delay so the clock settles.
//! 2. **Calibrating**: sample the stick until the fire button is pressed or
//!    the run flag drops, widening the calibration window.
//! 3. **SteadyState**: send `IN;` and the home move, then every tick turn the
//!    stick position into a relative move. Each deadline is the previous
//!    one plus the period, so timer rounding never stretches the cadence.
//! 4. **Shutdown**: send `IN;` as the last command.
//!
//! Key and button events are drained from the input queue once per
//! calibration sample and once per tick, so every plotter write goes
//! through the same emitter in order. Losing an input device ends the
//! session like Escape, before any further move is sent.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::controller::buttons::{ButtonEdgeDetector, PEN_BUTTON};
use crate::controller::calibration::{CalibrationEngine, CalibrationMapping};
use crate::controller::integrator::{displacement, TickTimer};
use crate::controller::normalizer::AxisNormalizer;
use crate::controller::{AnalogInput, AxisMask, AXIS_COUNT, AXIS_X, AXIS_Y};
use crate::error::Result;
use crate::input::InputEvent;
use crate::keyboard::dispatcher::KeyCommandDispatcher;
use crate::plotter::command::PlotterCommand;
use crate::plotter::emitter::PlotterEmitter;
use crate::serial::port_trait::SerialPortIO;
use crate::state::ControlState;

/// Number of ticks between status log messages
const STATUS_INTERVAL_TICKS: u64 = 5000;

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, not yet started
    Idle,
    Calibrating,
    SteadyState,
    Shutdown,
}

/// Timing and geometry of a session.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Target tick period
    pub tick: Duration,
    /// Delay before calibration starts
    pub sync_delay: Duration,
    /// Pause between calibration samples
    pub calibration_poll: Duration,
    /// Absolute position sent after `IN;`
    pub home: (i16, i16),
    pub axes: AxisMask,
    pub inverted: [bool; AXIS_COUNT],
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(1),
            sync_delay: Duration::from_secs(2),
            calibration_poll: Duration::from_millis(1),
            home: (5180, 3800),
            axes: AxisMask::XY,
            inverted: [false; AXIS_COUNT],
        }
    }
}

impl LoopSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick: Duration::from_millis(config.control.tick_ms),
            sync_delay: Duration::from_millis(config.control.sync_delay_ms),
            calibration_poll: Duration::from_millis(config.control.calibration_poll_ms),
            home: (config.control.home_x, config.control.home_y),
            axes: config.joystick.axis_mask(),
            inverted: config.joystick.inverted(),
        }
    }
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Calibration result
    pub mapping: CalibrationMapping,
    /// Steady-state ticks run (0 if stopped while calibrating)
    pub ticks: u64,
    /// Plotter commands sent, shutdown included
    pub commands: u64,
}

/// Next tick deadline.
///
/// Follows `previous` by one `period`. After an overrun past that point the
/// schedule restarts from `now` instead of bursting to catch up.
fn next_deadline(previous: Instant, period: Duration, now: Instant) -> Instant {
    (previous + period).max(now)
}

/// Owns the session and is the only writer to the plotter.
pub struct ControlLoop<A: AnalogInput, P: SerialPortIO> {
    input: A,
    emitter: PlotterEmitter<P>,
    events: mpsc::Receiver<InputEvent>,
    state: Arc<ControlState>,
    keys: KeyCommandDispatcher,
    edges: Option<ButtonEdgeDetector>,
    /// Set once a reader reports its device gone
    input_lost: bool,
    settings: LoopSettings,
    phase: Phase,
}

impl<A: AnalogInput, P: SerialPortIO> ControlLoop<A, P> {
    #[must_use]
    pub fn new(
        input: A,
        port: P,
        events: mpsc::Receiver<InputEvent>,
        state: Arc<ControlState>,
        keys: KeyCommandDispatcher,
        settings: LoopSettings,
    ) -> Self {
        Self {
            input,
            emitter: PlotterEmitter::new(port),
            events,
            state,
            keys,
            edges: None,
            input_lost: false,
            settings,
            phase: Phase::Idle,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs the whole session.
    ///
    /// # Errors
    ///
    /// Returns the first transport failure. The session ends on the spot;
    /// no shutdown command is attempted after a failed write.
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!("synchronizing timer...");
        sleep(self.settings.sync_delay).await;

        let mapping = self.calibrate().await?;

        let ticks = if self.state.is_running() {
            self.steady_state(mapping).await?
        } else {
            info!("Stopped during calibration");
            0
        };

        self.shutdown().await?;

        Ok(RunSummary {
            mapping,
            ticks,
            commands: self.emitter.sent(),
        })
    }

    /// Samples until the fire button is down or the run flag drops.
    ///
    /// Always takes at least one sample.
    async fn calibrate(&mut self) -> Result<CalibrationMapping> {
        self.phase = Phase::Calibrating;
        info!("calibrate joystick, press fire when done.");

        let mut engine = CalibrationEngine::new();
        loop {
            engine.observe(&self.input.raw());
            self.drain_events().await?;

            if self.input.buttons().is_set(PEN_BUTTON) || !self.state.is_running() {
                break;
            }
            sleep(self.settings.calibration_poll).await;
        }

        let samples = engine.samples();
        let mapping = engine.finish();
        info!(
            "Calibrated from {} samples: x {:?}, y {:?}",
            samples,
            mapping.range(AXIS_X),
            mapping.range(AXIS_Y)
        );
        Ok(mapping)
    }

    /// Streams relative moves until the run flag drops. Returns the tick count.
    async fn steady_state(&mut self, mapping: CalibrationMapping) -> Result<u64> {
        self.phase = Phase::SteadyState;
        let normalizer = AxisNormalizer::new(mapping, self.settings.axes, self.settings.inverted);
        // Fire may still be held from ending calibration
        self.edges = Some(ButtonEdgeDetector::starting_from(
            Arc::clone(&self.state),
            self.input.buttons(),
        ));

        info!("initializing plotter...");
        let (x, y) = self.settings.home;
        self.emitter.emit(PlotterCommand::Init).await?;
        self.emitter.emit(PlotterCommand::MoveAbsolute { x, y }).await?;
        info!("ready.");

        let mut timer = TickTimer::new(Instant::now());
        let mut deadline = Instant::now();
        let mut ticks: u64 = 0;
        while self.state.is_running() {
            let now = Instant::now();
            let dt = timer.tick(now);

            self.drain_events().await?;
            if self.input_lost {
                break;
            }

            let sample = normalizer.normalize(&self.input.raw());
            let step = displacement(&sample, dt, self.state.speed());
            self.emitter
                .emit(PlotterCommand::move_relative(step.dx, step.dy))
                .await?;

            ticks += 1;
            if ticks % STATUS_INTERVAL_TICKS == 0 {
                info!(
                    "{} ticks, {} commands sent, speed {:.1}, pen {}",
                    ticks,
                    self.emitter.sent(),
                    self.state.speed(),
                    if self.state.is_pen_down() { "down" } else { "up" }
                );
            }

            deadline = next_deadline(deadline, self.settings.tick, Instant::now());
            sleep_until(deadline).await;
        }

        debug!("Steady state ended after {} ticks", ticks);
        Ok(ticks)
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.phase = Phase::Shutdown;
        self.emitter.emit(PlotterCommand::Init).await?;
        info!("Plotter reset, {} commands sent", self.emitter.sent());
        Ok(())
    }

    /// Handles every queued input event.
    ///
    /// Button events are dropped until the edge detector is active. A lost
    /// device clears the run flag.
    async fn drain_events(&mut self) -> Result<()> {
        loop {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
            };

            let command = match event {
                InputEvent::Key(key) => self.keys.dispatch(key),
                InputEvent::Buttons { state, at } => match self.edges.as_mut() {
                    Some(edges) => edges.on_buttons_changed(state, at),
                    None => {
                        trace!("Ignoring buttons {} before steady state", state);
                        None
                    }
                },
                InputEvent::DeviceLost(kind) => {
                    warn!("Lost the {}, stopping", kind);
                    self.input_lost = true;
                    self.state.stop();
                    None
                }
            };

            if let Some(command) = command {
                self.emitter.emit(command).await?;
            }
        }
    }
}
