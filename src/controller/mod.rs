//! # Controller Module
//!
//! Analog joystick input handling.
//!
//! This module handles:
//! - Joystick detection and background polling via evdev
//! - Calibration of the raw axis range
//! - Normalizing raw samples into an origin-centered vector
//! - Integrating the vector into per-tick plotter displacement
//! - Detecting pen button edges

pub mod buttons;
pub mod calibration;
pub mod integrator;
pub mod joystick;
pub mod normalizer;

use buttons::ButtonState;

/// Number of axis slots on the joystick (x, y, z, w)
pub const AXIS_COUNT: usize = 4;

/// Index of the horizontal axis
pub const AXIS_X: usize = 0;
/// Index of the vertical axis
pub const AXIS_Y: usize = 1;

/// One unprocessed reading of every axis slot, in device units.
pub type RawSample = [i32; AXIS_COUNT];

/// Which axis slots are sampled.
///
/// Disabled slots keep their place in every per-axis array but are never
/// read from the device and always normalize to center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMask([bool; AXIS_COUNT]);

impl AxisMask {
    /// X and Y only.
    pub const XY: AxisMask = AxisMask([true, true, false, false]);

    #[must_use]
    pub const fn new(enabled: [bool; AXIS_COUNT]) -> Self {
        Self(enabled)
    }

    #[must_use]
    pub fn is_enabled(&self, axis: usize) -> bool {
        axis < AXIS_COUNT && self.0[axis]
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::XY
    }
}

/// Source of analog samples and button state.
///
/// Implemented by the evdev [`joystick::JoystickHandle`] and by scripted
/// doubles in tests.
pub trait AnalogInput: Send {
    /// Latest raw value of every axis slot.
    fn raw(&mut self) -> RawSample;

    /// Latest button bitmask.
    fn buttons(&self) -> ButtonState;
}
