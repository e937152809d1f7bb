//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::{AxisMask, AXIS_COUNT};
use crate::error::{JoyplotError, Result};

/// Serial baud rates accepted for the plotter link
const VALID_BAUD_RATES: &[u32] = &[1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub joystick: JoystickConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Flow control applied on the plotter serial line
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlMode {
    None,
    /// XON/XOFF, what most pen plotters expect
    Software,
    Hardware,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_flow_control")]
    pub flow_control: FlowControlMode,
}

/// Joystick configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct JoystickConfig {
    /// Empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default)]
    pub enable_z: bool,

    #[serde(default)]
    pub enable_w: bool,

    #[serde(default)]
    pub invert_axes: Vec<usize>,
}

/// Keyboard configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct KeyboardConfig {
    /// Empty means auto-detect
    #[serde(default)]
    pub device_path: String,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default = "default_sync_delay_ms")]
    pub sync_delay_ms: u64,

    #[serde(default = "default_calibration_poll_ms")]
    pub calibration_poll_ms: u64,

    #[serde(default = "default_speed")]
    pub default_speed: f32,

    #[serde(default = "default_speed_up_factor")]
    pub speed_up_factor: f32,

    #[serde(default = "default_speed_down_factor")]
    pub speed_down_factor: f32,

    #[serde(default = "default_home_x")]
    pub home_x: i16,

    #[serde(default = "default_home_y")]
    pub home_y: i16,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Empty means stderr only
    #[serde(default)]
    pub file: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_flow_control() -> FlowControlMode { FlowControlMode::Software }

fn default_tick_ms() -> u64 { 1 }
fn default_sync_delay_ms() -> u64 { 2000 }
fn default_calibration_poll_ms() -> u64 { 1 }
fn default_speed() -> f32 { 20_000.0 }
fn default_speed_up_factor() -> f32 { 1.5 }
fn default_speed_down_factor() -> f32 { 0.75 }
fn default_home_x() -> i16 { 5180 }
fn default_home_y() -> i16 { 3800 }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            flow_control: default_flow_control(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            sync_delay_ms: default_sync_delay_ms(),
            calibration_poll_ms: default_calibration_poll_ms(),
            default_speed: default_speed(),
            speed_up_factor: default_speed_up_factor(),
            speed_down_factor: default_speed_down_factor(),
            home_x: default_home_x(),
            home_y: default_home_y(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl JoystickConfig {
    /// Axes sampled by the joystick poller. X and Y are always on.
    #[must_use]
    pub fn axis_mask(&self) -> AxisMask {
        AxisMask::new([true, true, self.enable_z, self.enable_w])
    }

    /// Per-axis sign inversion derived from `invert_axes`.
    #[must_use]
    pub fn inverted(&self) -> [bool; AXIS_COUNT] {
        let mut inverted = [false; AXIS_COUNT];
        for &axis in &self.invert_axes {
            if axis < AXIS_COUNT {
                inverted[axis] = true;
            }
        }
        inverted
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joyplot::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of {:?}",
                VALID_BAUD_RATES
            )));
        }

        if let Some(axis) = self.joystick.invert_axes.iter().find(|&&a| a >= AXIS_COUNT) {
            return Err(invalid(format!(
                "invert_axes index {} out of range (0-{})",
                axis,
                AXIS_COUNT - 1
            )));
        }

        if self.control.tick_ms == 0 || self.control.tick_ms > 100 {
            return Err(invalid("tick_ms must be between 1 and 100"));
        }

        if self.control.sync_delay_ms > 10000 {
            return Err(invalid("sync_delay_ms must be between 0 and 10000"));
        }

        if self.control.calibration_poll_ms == 0 || self.control.calibration_poll_ms > 100 {
            return Err(invalid("calibration_poll_ms must be between 1 and 100"));
        }

        if !(self.control.default_speed > 0.0 && self.control.default_speed.is_finite()) {
            return Err(invalid("default_speed must be a positive number"));
        }

        if !(self.control.speed_up_factor > 1.0 && self.control.speed_up_factor.is_finite()) {
            return Err(invalid("speed_up_factor must be greater than 1.0"));
        }

        if !(self.control.speed_down_factor > 0.0 && self.control.speed_down_factor < 1.0) {
            return Err(invalid("speed_down_factor must be between 0.0 and 1.0 (exclusive)"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> JoyplotError {
    JoyplotError::Config(toml::de::Error::custom(msg))
}
