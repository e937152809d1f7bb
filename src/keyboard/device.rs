//! # Keyboard Device
//!
//! Reads key events from an evdev keyboard on a background thread and
//! forwards them to the input event queue.

use evdev::{Device, InputEventKind, Key};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{KeyEvent, KeyState};
use crate::error::Result;
use crate::input::{open_device, InputEvent};

/// Device kind used in logs and errors
const DEVICE_KIND: &str = "keyboard";

/// Whether an evdev device has the keys the operator needs.
fn is_keyboard(device: &Device) -> bool {
    device
        .supported_keys()
        .map(|keys| keys.contains(Key::KEY_ESC) && keys.contains(Key::KEY_KPPLUS))
        .unwrap_or(false)
}

/// An opened keyboard.
pub struct Keyboard {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Keyboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyboard")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl Keyboard {
    /// Opens the keyboard at `path`, or the first one found when empty.
    ///
    /// # Errors
    ///
    /// - `Input`: the device cannot be opened
    /// - `InputDeviceNotFound`: auto-detection found nothing
    pub fn open(path: &str) -> Result<Self> {
        let (device, device_path) = open_device(path, DEVICE_KIND, is_keyboard)?;
        Ok(Self {
            device,
            device_path,
        })
    }

    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Starts forwarding key events to `events`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the reader thread cannot be spawned.
    pub fn spawn_reader(self, events: mpsc::Sender<InputEvent>) -> Result<JoinHandle<()>> {
        let Keyboard {
            mut device,
            device_path,
        } = self;
        let handle = std::thread::Builder::new()
            .name("keyboard-reader".to_string())
            .spawn(move || read_keys(&mut device, &events))?;
        info!("Reading keys from {}", device_path);
        Ok(handle)
    }
}

/// Reader thread body.
fn read_keys(device: &mut Device, events: &mpsc::Sender<InputEvent>) {
    loop {
        let fetched = match device.fetch_events() {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Keyboard read failed, reader stopped: {}", e);
                let _ = events.blocking_send(InputEvent::DeviceLost(DEVICE_KIND));
                return;
            }
        };

        for event in fetched {
            let InputEventKind::Key(key) = event.kind() else {
                continue;
            };
            let Some(state) = KeyState::from_value(event.value()) else {
                continue;
            };
            if events
                .blocking_send(InputEvent::Key(KeyEvent::new(key, state)))
                .is_err()
            {
                debug!("Event queue closed, keyboard reader stopped");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device_fails() {
        assert!(Keyboard::open("/dev/input/no_such_keyboard").is_err());
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_read_real_keyboard() {
        let keyboard = Keyboard::open("").expect("Keyboard not found");
        let (tx, mut rx) = crate::input::event_queue();
        keyboard.spawn_reader(tx).unwrap();

        println!("Press any key...");
        let event = rx.blocking_recv();
        println!("Received: {:?}", event);
        assert!(matches!(event, Some(InputEvent::Key(_))));
    }
}
