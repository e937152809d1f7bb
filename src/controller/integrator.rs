//! # Velocity Integrator
//!
//! Converts stick deflection into relative plotter motion.
//!
//! The stick is a velocity control: each tick moves the pen by
//! `deflection × dt × speed` plotter units per axis. No position is kept
//! here; the plotter accumulates it. Rounding to whole plotter units happens
//! when the move is rendered, and the rounding remainder is dropped.

use tokio::time::Instant;

use super::normalizer::NormalizedSample;

/// Relative motion for one tick, in plotter units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Displacement {
    pub dx: f32,
    pub dy: f32,
}

/// Displacement for one tick.
///
/// # Arguments
///
/// * `sample` - Normalized stick position
/// * `dt` - Seconds since the previous tick
/// * `speed` - Plotter units per second at full deflection
///
/// # Examples
///
/// ```
/// use joyplot::controller::integrator::displacement;
/// use joyplot::controller::normalizer::NormalizedSample;
///
/// let sample = NormalizedSample { axes: [0.5, -0.25, 0.0, 0.0] };
/// let d = displacement(&sample, 0.001, 20_000.0);
/// assert!((d.dx - 10.0).abs() < 1e-3);
/// assert!((d.dy + 5.0).abs() < 1e-3);
/// ```
#[must_use]
pub fn displacement(sample: &NormalizedSample, dt: f32, speed: f32) -> Displacement {
    Displacement {
        dx: sample.x() * dt * speed,
        dy: sample.y() * dt * speed,
    }
}

/// Measures the wall time between consecutive ticks.
#[derive(Debug, Clone, Copy)]
pub struct TickTimer {
    last: Instant,
}

impl TickTimer {
    /// Starts timing from `start`.
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self { last: start }
    }

    /// Seconds elapsed since the previous call (or since `new`), and
    /// remembers `now` for the next call.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}
