//! # Button Edge Detector
//!
//! Turns button bitmask reports into pen up/down commands.
//!
//! Only bit 0 (the fire button) is watched. Each report is XORed against
//! the last one; a difference on bit 0 yields exactly one pen command, so
//! repeated identical reports never emit twice.

use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

use crate::plotter::command::PlotterCommand;
use crate::state::ControlState;

/// Number of button bits tracked
pub const BUTTON_COUNT: usize = 4;

/// Bit driving the pen
pub const PEN_BUTTON: usize = 0;

/// A 4-bit button set. Bits above 3 are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonState(u8);

impl ButtonState {
    const MASK: u8 = (1 << BUTTON_COUNT) - 1;

    /// No buttons held.
    pub const NONE: ButtonState = ButtonState(0);

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether button `index` is held. Out-of-range indices read as released.
    #[must_use]
    pub fn is_set(self, index: usize) -> bool {
        index < BUTTON_COUNT && self.0 & (1 << index) != 0
    }

    /// Returns a copy with button `index` set or cleared.
    #[must_use]
    pub fn with(self, index: usize, pressed: bool) -> Self {
        if index >= BUTTON_COUNT {
            return self;
        }
        if pressed {
            Self(self.0 | (1 << index))
        } else {
            Self(self.0 & !(1 << index))
        }
    }

    /// Bits that differ between `self` and `other`.
    #[must_use]
    pub fn changed(self, other: ButtonState) -> ButtonState {
        Self(self.0 ^ other.0)
    }
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

/// Emits `PD`/`PU` once per edge of the pen button.
#[derive(Debug)]
pub struct ButtonEdgeDetector {
    last: ButtonState,
    state: Arc<ControlState>,
}

impl ButtonEdgeDetector {
    /// Creates a detector whose last-known state is all released.
    #[must_use]
    pub fn new(state: Arc<ControlState>) -> Self {
        Self::starting_from(state, ButtonState::NONE)
    }

    /// Creates a detector that treats `held` as the last report, so buttons
    /// already down produce no edge until they are released.
    #[must_use]
    pub fn starting_from(state: Arc<ControlState>, held: ButtonState) -> Self {
        Self { last: held, state }
    }

    /// Handles one button report.
    ///
    /// Returns the pen command to send if bit 0 changed. The last-known
    /// state is replaced by `buttons` whether or not a command was produced.
    /// `_at` is the time the device saw the change; it carries no logic.
    pub fn on_buttons_changed(
        &mut self,
        buttons: ButtonState,
        _at: Instant,
    ) -> Option<PlotterCommand> {
        let changed = self.last.changed(buttons);
        let command = if changed.is_set(PEN_BUTTON) {
            let down = buttons.is_set(PEN_BUTTON);
            self.state.set_pen_down(down);
            debug!("Pen {}", if down { "down" } else { "up" });
            Some(if down {
                PlotterCommand::PenDown
            } else {
                PlotterCommand::PenUp
            })
        } else {
            None
        };
        self.last = buttons;
        command
    }

    /// Last button report seen.
    #[must_use]
    pub fn last(&self) -> ButtonState {
        self.last
    }
}
