//! # Calibration Module
//!
//! Learns the raw range of each joystick axis.
//!
//! While calibrating the operator sweeps the stick through its full travel.
//! Every sample widens the per-axis `{min, max}` window; the very first
//! sample seeds the window so no artificial bound leaks into the result.
//!
//! ## Usage
//!
//! ```
//! use joyplot::controller::calibration::CalibrationEngine;
//!
//! let mut engine = CalibrationEngine::new();
//! engine.observe(&[500, 480, 0, 0]);
//! engine.observe(&[100, 900, 0, 0]);
//! engine.observe(&[900, 120, 0, 0]);
//!
//! let mapping = engine.finish();
//! assert_eq!(mapping.range(0), (100, 900));
//! assert_eq!(mapping.range(1), (120, 900));
//! ```

use super::{RawSample, AXIS_COUNT};

/// Observed raw extrema per axis slot.
///
/// `min[i] <= max[i]` holds for every slot. Slots that never moved have
/// `min == max`, which the normalizer maps to center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationMapping {
    pub min: RawSample,
    pub max: RawSample,
}

impl CalibrationMapping {
    /// Builds a mapping from explicit bounds, ordering each pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use joyplot::controller::calibration::CalibrationMapping;
    ///
    /// let mapping = CalibrationMapping::from_bounds([900, 0, 0, 0], [100, 0, 0, 0]);
    /// assert_eq!(mapping.range(0), (100, 900));
    /// ```
    #[must_use]
    pub fn from_bounds(a: RawSample, b: RawSample) -> Self {
        let mut min = [0; AXIS_COUNT];
        let mut max = [0; AXIS_COUNT];
        for i in 0..AXIS_COUNT {
            min[i] = a[i].min(b[i]);
            max[i] = a[i].max(b[i]);
        }
        Self { min, max }
    }

    /// `(min, max)` of one axis slot.
    #[must_use]
    pub fn range(&self, axis: usize) -> (i32, i32) {
        (self.min[axis], self.max[axis])
    }

    /// Whether an axis slot has zero width.
    #[must_use]
    pub fn is_degenerate(&self, axis: usize) -> bool {
        self.min[axis] == self.max[axis]
    }
}

/// Folds raw samples into a [`CalibrationMapping`].
#[derive(Debug, Clone, Default)]
pub struct CalibrationEngine {
    window: Option<CalibrationMapping>,
    samples: usize,
}

impl CalibrationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Widens the window to include `raw`.
    pub fn observe(&mut self, raw: &RawSample) {
        self.samples += 1;
        match self.window.as_mut() {
            None => {
                self.window = Some(CalibrationMapping {
                    min: *raw,
                    max: *raw,
                });
            }
            Some(window) => {
                for i in 0..AXIS_COUNT {
                    window.min[i] = window.min[i].min(raw[i]);
                    window.max[i] = window.max[i].max(raw[i]);
                }
            }
        }
    }

    /// Number of samples folded so far.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the accumulated window.
    ///
    /// With no samples at all every slot is degenerate at zero.
    #[must_use]
    pub fn finish(self) -> CalibrationMapping {
        self.window.unwrap_or_default()
    }
}
