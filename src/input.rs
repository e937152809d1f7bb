//! # Input Events
//!
//! Event queue between the device reader threads and the control loop,
//! and evdev device discovery shared by the joystick and the keyboard.
//!
//! Reader threads push [`InputEvent`]s into a bounded tokio channel; the
//! control loop drains it once per calibration sample and once per tick.

use evdev::Device;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::controller::buttons::ButtonState;
use crate::error::{JoyplotError, Result};
use crate::keyboard::KeyEvent;

/// Capacity of the input event queue
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Directory scanned for input devices
const INPUT_DIR: &str = "/dev/input";

/// Something the operator did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Joystick button bitmask changed
    Buttons { state: ButtonState, at: Instant },
    /// Keyboard key changed state
    Key(KeyEvent),
    /// A reader thread lost its device and stopped; the payload is the
    /// device kind. Readings it published before are stale.
    DeviceLost(&'static str),
}

/// Creates the bounded input event queue.
#[must_use]
pub fn event_queue() -> (mpsc::Sender<InputEvent>, mpsc::Receiver<InputEvent>) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

/// Opens an input device.
///
/// With a non-empty `path` that device is opened directly. Otherwise every
/// `/dev/input/event*` node is tried in name order and the first one for
/// which `matches` returns true is used.
///
/// # Arguments
///
/// * `path` - Explicit device path, or empty to auto-detect
/// * `kind` - Human-readable device kind for logs and errors
/// * `matches` - Capability check used during auto-detection
///
/// # Errors
///
/// - `Input`: the explicit path cannot be opened or `/dev/input` is unreadable
/// - `InputDeviceNotFound`: no device passed `matches`
pub fn open_device(
    path: &str,
    kind: &'static str,
    matches: impl Fn(&Device) -> bool,
) -> Result<(Device, String)> {
    if !path.is_empty() {
        let device = Device::open(path)
            .map_err(|e| JoyplotError::Input(format!("Failed to open {} {}: {}", kind, path, e)))?;
        info!("Opened {} at: {}", kind, path);
        return Ok((device, path.to_string()));
    }

    let input_dir = Path::new(INPUT_DIR);
    let mut entries: Vec<_> = std::fs::read_dir(input_dir)
        .map_err(|e| JoyplotError::Input(format!("Failed to read {}: {}", INPUT_DIR, e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| JoyplotError::Input(format!("Failed to read directory entry: {}", e)))?;

    // Deterministic choice when several devices match
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let path = entry.path();
        let is_event_node = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with("event"))
            .unwrap_or(false);
        if !is_event_node {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                debug!(
                    "Found input device: {} ({})",
                    path.display(),
                    device.name().unwrap_or("unnamed")
                );
                if matches(&device) {
                    let device_path = path.to_string_lossy().to_string();
                    info!(
                        "Found {} at: {} ({})",
                        kind,
                        device_path,
                        device.name().unwrap_or("unnamed")
                    );
                    return Ok((device, device_path));
                }
            }
            Err(e) => {
                debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    Err(JoyplotError::InputDeviceNotFound(kind))
}
