//! # Joystick Module
//!
//! Analog joystick access through the Linux evdev interface.
//!
//! A reader thread blocks on the device and keeps the latest axis values and
//! button bitmask in atomic cells, so the control loop can sample at its own
//! cadence. Button changes are also pushed to the input event queue.
//!
//! ## Axis Slots
//!
//! | Slot | evdev Code |
//! |------|------------|
//! | 0 (x) | ABS_X |
//! | 1 (y) | ABS_Y |
//! | 2 (z) | ABS_Z |
//! | 3 (w) | ABS_RZ, ABS_THROTTLE |
//!
//! ## Button Bits
//!
//! | Bit | evdev Codes |
//! |-----|-------------|
//! | 0 (fire) | BTN_TRIGGER, BTN_SOUTH |
//! | 1 | BTN_THUMB, BTN_EAST |
//! | 2 | BTN_THUMB2, BTN_NORTH |
//! | 3 | BTN_TOP, BTN_WEST |

use evdev::{AbsoluteAxisType, Device, InputEventKind, Key};
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::buttons::ButtonState;
use super::{AnalogInput, AxisMask, RawSample, AXIS_COUNT};
use crate::error::Result;
use crate::input::{open_device, InputEvent};

/// Device kind used in logs and errors
const DEVICE_KIND: &str = "joystick";

/// Axis slot fed by an evdev axis code.
#[must_use]
pub fn axis_slot(axis: AbsoluteAxisType) -> Option<usize> {
    match axis {
        AbsoluteAxisType::ABS_X => Some(0),
        AbsoluteAxisType::ABS_Y => Some(1),
        AbsoluteAxisType::ABS_Z => Some(2),
        AbsoluteAxisType::ABS_RZ | AbsoluteAxisType::ABS_THROTTLE => Some(3),
        _ => None,
    }
}

/// Button bit fed by an evdev key code.
#[must_use]
pub fn button_bit(key: Key) -> Option<usize> {
    match key {
        Key::BTN_TRIGGER | Key::BTN_SOUTH => Some(0),
        Key::BTN_THUMB | Key::BTN_EAST => Some(1),
        Key::BTN_THUMB2 | Key::BTN_NORTH => Some(2),
        Key::BTN_TOP | Key::BTN_WEST => Some(3),
        _ => None,
    }
}

/// Whether an evdev device looks like an analog joystick.
fn is_joystick(device: &Device) -> bool {
    let has_axes = device
        .supported_absolute_axes()
        .map(|axes| axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y))
        .unwrap_or(false);
    let has_fire = device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_TRIGGER) || keys.contains(Key::BTN_SOUTH))
        .unwrap_or(false);
    has_axes && has_fire
}

/// Latest joystick readings, written by the reader thread.
#[derive(Debug, Default)]
struct Readings {
    axes: [AtomicI32; AXIS_COUNT],
    buttons: AtomicU8,
}

/// An opened joystick that is not yet being polled.
pub struct Joystick {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Joystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Joystick")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl Joystick {
    /// Opens the joystick at `path`, or the first one found when empty.
    ///
    /// # Errors
    ///
    /// - `Input`: the device cannot be opened
    /// - `InputDeviceNotFound`: auto-detection found nothing
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joyplot::controller::joystick::Joystick;
    ///
    /// let joystick = Joystick::open("")?;
    /// println!("Joystick at: {}", joystick.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str) -> Result<Self> {
        let (device, device_path) = open_device(path, DEVICE_KIND, is_joystick)?;
        Ok(Self {
            device,
            device_path,
        })
    }

    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Starts background polling of the axes in `mask`.
    ///
    /// Button changes are sent to `events`. The reader thread exits when the
    /// device fails or the receiving side of `events` is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the reader thread cannot be spawned.
    pub fn spawn_poller(
        self,
        mask: AxisMask,
        events: mpsc::Sender<InputEvent>,
    ) -> Result<JoystickHandle> {
        let readings = Arc::new(Readings::default());
        let Joystick {
            mut device,
            device_path,
        } = self;

        // Seed with the current stick position so calibration does not
        // start from an artificial zero.
        match device.get_abs_state() {
            Ok(state) => {
                for axis in [
                    AbsoluteAxisType::ABS_X,
                    AbsoluteAxisType::ABS_Y,
                    AbsoluteAxisType::ABS_Z,
                    AbsoluteAxisType::ABS_RZ,
                ] {
                    if let Some(slot) = axis_slot(axis) {
                        if mask.is_enabled(slot) {
                            readings.axes[slot].store(state[axis.0 as usize].value, Ordering::Release);
                        }
                    }
                }
            }
            Err(e) => warn!("Could not read initial joystick state: {}", e),
        }

        let shared = Arc::clone(&readings);
        let thread = std::thread::Builder::new()
            .name("joystick-poller".to_string())
            .spawn(move || poll_device(&mut device, mask, &shared, &events))?;

        info!("Polling joystick at {} in the background", device_path);
        Ok(JoystickHandle {
            readings,
            device_path,
            _thread: thread,
        })
    }
}

/// Reader thread body.
///
/// On a read failure the loss is reported to `events` so the control loop
/// stops instead of integrating the last published readings.
fn poll_device(
    device: &mut Device,
    mask: AxisMask,
    readings: &Readings,
    events: &mpsc::Sender<InputEvent>,
) {
    let mut current = ButtonState::NONE;
    loop {
        let fetched = match device.fetch_events() {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Joystick read failed, polling stopped: {}", e);
                let _ = events.blocking_send(InputEvent::DeviceLost(DEVICE_KIND));
                return;
            }
        };

        let Some(buttons) = apply_events(fetched, mask, readings, current) else {
            continue;
        };
        current = buttons;
        debug!("Joystick buttons: {}", buttons);
        let event = InputEvent::Buttons {
            state: buttons,
            at: Instant::now(),
        };
        if events.blocking_send(event).is_err() {
            debug!("Event queue closed, joystick polling stopped");
            return;
        }
    }
}

/// Folds one batch of device events into `readings`.
///
/// Axis values outside `mask` are dropped. Returns the new button set when
/// it differs from `current`; the button cell is updated in that case only.
fn apply_events(
    batch: impl IntoIterator<Item = evdev::InputEvent>,
    mask: AxisMask,
    readings: &Readings,
    current: ButtonState,
) -> Option<ButtonState> {
    let mut buttons = current;
    for event in batch {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                if let Some(slot) = axis_slot(axis).filter(|&slot| mask.is_enabled(slot)) {
                    readings.axes[slot].store(event.value(), Ordering::Release);
                }
            }
            InputEventKind::Key(key) => {
                if let Some(bit) = button_bit(key) {
                    buttons = buttons.with(bit, event.value() != 0);
                }
            }
            _ => {}
        }
    }

    if buttons == current {
        return None;
    }
    readings.buttons.store(buttons.bits(), Ordering::Release);
    Some(buttons)
}

/// A joystick being polled in the background.
#[derive(Debug)]
pub struct JoystickHandle {
    readings: Arc<Readings>,
    device_path: String,
    // The reader thread blocks in the kernel and is never joined; it ends
    // with the process or when the event queue closes.
    _thread: JoinHandle<()>,
}

impl JoystickHandle {
    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl AnalogInput for JoystickHandle {
    fn raw(&mut self) -> RawSample {
        let mut raw = [0; AXIS_COUNT];
        for (slot, value) in raw.iter_mut().enumerate() {
            *value = self.readings.axes[slot].load(Ordering::Acquire);
        }
        raw
    }

    fn buttons(&self) -> ButtonState {
        ButtonState::from_bits(self.readings.buttons.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_slots() {
        assert_eq!(axis_slot(AbsoluteAxisType::ABS_X), Some(0));
        assert_eq!(axis_slot(AbsoluteAxisType::ABS_Y), Some(1));
        assert_eq!(axis_slot(AbsoluteAxisType::ABS_Z), Some(2));
        assert_eq!(axis_slot(AbsoluteAxisType::ABS_RZ), Some(3));
        assert_eq!(axis_slot(AbsoluteAxisType::ABS_THROTTLE), Some(3));
        assert_eq!(axis_slot(AbsoluteAxisType::ABS_HAT0X), None);
    }

    #[test]
    fn test_button_bits() {
        assert_eq!(button_bit(Key::BTN_TRIGGER), Some(0));
        assert_eq!(button_bit(Key::BTN_SOUTH), Some(0));
        assert_eq!(button_bit(Key::BTN_THUMB), Some(1));
        assert_eq!(button_bit(Key::BTN_THUMB2), Some(2));
        assert_eq!(button_bit(Key::BTN_TOP), Some(3));
        assert_eq!(button_bit(Key::KEY_A), None);
    }

    fn abs(axis: AbsoluteAxisType, value: i32) -> evdev::InputEvent {
        evdev::InputEvent::new(evdev::EventType::ABSOLUTE, axis.0, value)
    }

    fn key(key: Key, value: i32) -> evdev::InputEvent {
        evdev::InputEvent::new(evdev::EventType::KEY, key.code(), value)
    }

    fn axes(readings: &Readings) -> [i32; AXIS_COUNT] {
        let mut raw = [0; AXIS_COUNT];
        for (slot, value) in raw.iter_mut().enumerate() {
            *value = readings.axes[slot].load(Ordering::Acquire);
        }
        raw
    }

    // ==================== Event Batch Tests ====================

    #[test]
    fn test_batch_updates_enabled_axes() {
        let readings = Readings::default();
        let batch = vec![
            abs(AbsoluteAxisType::ABS_X, 700),
            abs(AbsoluteAxisType::ABS_Y, -300),
            abs(AbsoluteAxisType::ABS_HAT0X, 1),
        ];

        let changed = apply_events(batch, AxisMask::XY, &readings, ButtonState::NONE);

        assert_eq!(changed, None);
        assert_eq!(axes(&readings), [700, -300, 0, 0]);
    }

    #[test]
    fn test_batch_drops_disabled_axes() {
        let readings = Readings::default();
        let batch = vec![
            abs(AbsoluteAxisType::ABS_Z, 512),
            abs(AbsoluteAxisType::ABS_THROTTLE, 128),
        ];

        apply_events(batch.clone(), AxisMask::XY, &readings, ButtonState::NONE);
        assert_eq!(axes(&readings), [0; AXIS_COUNT]);

        let all = AxisMask::new([true; AXIS_COUNT]);
        apply_events(batch, all, &readings, ButtonState::NONE);
        assert_eq!(axes(&readings), [0, 0, 512, 128]);
    }

    #[test]
    fn test_batch_folds_buttons() {
        let readings = Readings::default();
        let batch = vec![key(Key::BTN_TRIGGER, 1), key(Key::BTN_THUMB2, 1)];

        let changed = apply_events(batch, AxisMask::XY, &readings, ButtonState::NONE);

        assert_eq!(changed, Some(ButtonState::from_bits(0b0101)));
        assert_eq!(readings.buttons.load(Ordering::Acquire), 0b0101);
    }

    #[test]
    fn test_press_and_release_in_one_batch_is_silent() {
        let readings = Readings::default();
        let batch = vec![key(Key::BTN_TRIGGER, 1), key(Key::BTN_TRIGGER, 0)];

        let changed = apply_events(batch, AxisMask::XY, &readings, ButtonState::NONE);

        assert_eq!(changed, None);
        assert_eq!(readings.buttons.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_unchanged_buttons_publish_nothing() {
        let readings = Readings::default();
        let held = ButtonState::from_bits(1);
        // Autorepeat and unmapped keys leave the set as it was
        let batch = vec![key(Key::BTN_TRIGGER, 2), key(Key::BTN_PINKIE, 1)];

        assert_eq!(apply_events(batch, AxisMask::XY, &readings, held), None);
        // Cell is only written on a change
        assert_eq!(readings.buttons.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_release_clears_bit() {
        let readings = Readings::default();
        let held = ButtonState::from_bits(0b0011);

        let changed = apply_events(vec![key(Key::BTN_SOUTH, 0)], AxisMask::XY, &readings, held);

        assert_eq!(changed, Some(ButtonState::from_bits(0b0010)));
        assert_eq!(readings.buttons.load(Ordering::Acquire), 0b0010);
    }

    #[test]
    fn test_open_missing_device_fails() {
        assert!(Joystick::open("/dev/input/no_such_joystick").is_err());
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_poll_real_joystick() {
        let joystick = Joystick::open("").expect("Joystick not found");
        let (tx, _rx) = crate::input::event_queue();
        let mut handle = joystick.spawn_poller(AxisMask::XY, tx).unwrap();

        println!("Move the stick within 2 seconds...");
        std::thread::sleep(std::time::Duration::from_secs(2));
        println!("Raw sample: {:?}", handle.raw());
    }
}
