//! # Key Command Dispatcher
//!
//! Reacts to key presses.
//!
//! | Key | Effect |
//! |-----|--------|
//! | Esc | stop running |
//! | Keypad + | speed × speed-up factor (1.5) |
//! | Keypad - | speed × speed-down factor (0.75) |
//! | `1`..`8` | select that pen (`SPn;`) |
//!
//! Pen selection compares characters with `'0' < c < '9'`, so neither `0`
//! nor `9` selects a pen. Key releases are ignored; auto-repeat counts as a
//! press.

use evdev::Key;
use std::sync::Arc;
use tracing::{debug, info};

use super::{to_ascii, KeyEvent, KeyState};
use crate::plotter::command::PlotterCommand;
use crate::state::ControlState;

/// Default speed-up factor for keypad +
pub const SPEED_UP_FACTOR: f32 = 1.5;

/// Default speed-down factor for keypad -
pub const SPEED_DOWN_FACTOR: f32 = 0.75;

#[derive(Debug, Clone)]
pub struct KeyCommandDispatcher {
    state: Arc<ControlState>,
    speed_up: f32,
    speed_down: f32,
}

impl KeyCommandDispatcher {
    /// Creates a dispatcher with the default speed factors.
    #[must_use]
    pub fn new(state: Arc<ControlState>) -> Self {
        Self::with_factors(state, SPEED_UP_FACTOR, SPEED_DOWN_FACTOR)
    }

    #[must_use]
    pub fn with_factors(state: Arc<ControlState>, speed_up: f32, speed_down: f32) -> Self {
        Self {
            state,
            speed_up,
            speed_down,
        }
    }

    /// Handles one key event.
    ///
    /// Returns the plotter command to send, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use evdev::Key;
    /// use joyplot::keyboard::{KeyEvent, KeyState};
    /// use joyplot::keyboard::dispatcher::KeyCommandDispatcher;
    /// use joyplot::plotter::command::PlotterCommand;
    /// use joyplot::state::ControlState;
    ///
    /// let state = Arc::new(ControlState::new(20_000.0));
    /// let dispatcher = KeyCommandDispatcher::new(Arc::clone(&state));
    ///
    /// let cmd = dispatcher.dispatch(KeyEvent::new(Key::KEY_3, KeyState::Down));
    /// assert_eq!(cmd, Some(PlotterCommand::SelectPen('3')));
    ///
    /// dispatcher.dispatch(KeyEvent::new(Key::KEY_ESC, KeyState::Down));
    /// assert!(!state.is_running());
    /// ```
    pub fn dispatch(&self, event: KeyEvent) -> Option<PlotterCommand> {
        if event.state == KeyState::Up {
            return None;
        }

        match event.key {
            Key::KEY_ESC => {
                info!("Escape pressed, stopping");
                self.state.stop();
                None
            }
            Key::KEY_KPPLUS => {
                let speed = self.state.scale_speed(self.speed_up);
                info!("Speed increased to {:.1}", speed);
                None
            }
            Key::KEY_KPMINUS => {
                let speed = self.state.scale_speed(self.speed_down);
                info!("Speed decreased to {:.1}", speed);
                None
            }
            key => {
                let c = to_ascii(key, false, false, true)?;
                if c > '0' && c < '9' {
                    debug!("Selecting pen {}", c);
                    Some(PlotterCommand::SelectPen(c))
                } else {
                    None
                }
            }
        }
    }
}
