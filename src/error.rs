//! # Error Types
//!
//! Custom error types for Joyplot using `thiserror`.

use thiserror::Error;

/// Main error type for Joyplot
#[derive(Debug, Error)]
pub enum JoyplotError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial transport errors (open, write, flush)
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial ports could be opened
    #[error("No plotter serial port found (tried: {0})")]
    SerialPortNotFound(String),

    /// Input device errors (joystick or keyboard)
    #[error("Input device error: {0}")]
    Input(String),

    /// No matching input device was found under /dev/input
    #[error("No {0} found under /dev/input")]
    InputDeviceNotFound(&'static str),
}

/// Result type alias for Joyplot
pub type Result<T> = std::result::Result<T, JoyplotError>;
