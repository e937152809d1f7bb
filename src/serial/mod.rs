//! # Serial Communication Module
//!
//! Handles the serial link to the pen plotter.
//!
//! This module handles:
//! - Opening the plotter port with the configured baud rate and flow control
//! - Async write and flush of rendered commands
//!
//! Pen plotters usually pace the host with XON/XOFF, so software flow
//! control is the default.

pub mod port_trait;

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::{FlowControlMode, SerialConfig};
use crate::error::{JoyplotError, Result};
use port_trait::SerialPortIO;

/// Plotter serial port handler
pub struct PlotterSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for PlotterSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotterSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl PlotterSerial {
    /// Open the port named in `config`
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joyplot::config::SerialConfig;
    /// use joyplot::serial::PlotterSerial;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let serial = PlotterSerial::open(&SerialConfig::default())?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        Self::open_with_paths(&[config.port.as_str()], config)
    }

    /// Open the first port in `paths` that accepts the settings in `config`
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try, in order
    /// * `config` - Baud rate and flow control
    pub fn open_with_paths(paths: &[&str], config: &SerialConfig) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, config) {
                Ok(port) => {
                    info!(
                        "Opened plotter port {} at {} baud ({:?} flow control)",
                        path, config.baud_rate, config.flow_control
                    );
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(JoyplotError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port, 8N1
    fn open_port(path: &str, config: &SerialConfig) -> Result<tokio_serial::SerialStream> {
        use tokio_serial::SerialPortBuilderExt;

        let port = tokio_serial::new(path, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(flow_control(config.flow_control))
            .open_native_async()
            .map_err(|e| JoyplotError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl SerialPortIO for PlotterSerial {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.port.flush().await
    }
}

/// Maps the configured mode to the tokio-serial setting
fn flow_control(mode: FlowControlMode) -> tokio_serial::FlowControl {
    match mode {
        FlowControlMode::None => tokio_serial::FlowControl::None,
        FlowControlMode::Software => tokio_serial::FlowControl::Software,
        FlowControlMode::Hardware => tokio_serial::FlowControl::Hardware,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_control_mapping() {
        assert_eq!(flow_control(FlowControlMode::None), tokio_serial::FlowControl::None);
        assert_eq!(flow_control(FlowControlMode::Software), tokio_serial::FlowControl::Software);
        assert_eq!(flow_control(FlowControlMode::Hardware), tokio_serial::FlowControl::Hardware);
    }

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let result = PlotterSerial::open_with_paths(invalid_paths, &SerialConfig::default());

        match result {
            Err(JoyplotError::SerialPortNotFound(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let empty_paths: &[&str] = &[];
        let result = PlotterSerial::open_with_paths(empty_paths, &SerialConfig::default());
        assert!(matches!(result, Err(JoyplotError::SerialPortNotFound(_))));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = PlotterSerial::open_port(
            "/dev/nonexistent_serial_device_12345",
            &SerialConfig::default(),
        );

        match result {
            Err(JoyplotError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other.map(|_| ())),
        }
    }

    // Integration test - only runs if a plotter is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_init_real_plotter() {
        let result = PlotterSerial::open(&SerialConfig::default());

        if let Ok(mut serial) = result {
            serial.write_all(b"IN;").await.unwrap();
            serial.flush().await.unwrap();
            println!("Sent IN; to plotter at {}", serial.device_path());
        } else {
            println!("No plotter detected (skipping)");
        }
    }
}
