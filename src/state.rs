//! # Control State
//!
//! Process-wide control flags shared between the control loop, the event
//! handlers and the Ctrl+C watcher.
//!
//! Every field lives in its own atomic cell and has exactly one setter, so
//! readers never observe a torn value and no lock is held around I/O.
//!
//! | Field | Writer | Readers |
//! |-------|--------|---------|
//! | `running` | key dispatcher (Escape), Ctrl+C | control loop |
//! | `speed` | key dispatcher (numpad +/-) | control loop |
//! | `pen_down` | button edge detector | logging |

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Shared control state. Wrap in an `Arc` to share between tasks.
#[derive(Debug)]
pub struct ControlState {
    running: AtomicBool,
    /// f32 bit pattern of the speed scale
    speed: AtomicU32,
    pen_down: AtomicBool,
}

impl ControlState {
    /// Creates a running state with the given speed scale and the pen up.
    ///
    /// # Examples
    ///
    /// ```
    /// use joyplot::state::ControlState;
    ///
    /// let state = ControlState::new(20_000.0);
    /// assert!(state.is_running());
    /// assert_eq!(state.speed(), 20_000.0);
    /// assert!(!state.is_pen_down());
    /// ```
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            running: AtomicBool::new(true),
            speed: AtomicU32::new(speed.to_bits()),
            pen_down: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clears the run flag. There is no way to set it again.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Current speed scale in plotter units per second at full deflection.
    #[must_use]
    pub fn speed(&self) -> f32 {
        f32::from_bits(self.speed.load(Ordering::Acquire))
    }

    /// Multiplies the speed scale by `factor` and returns the new value.
    ///
    /// Unclamped: repeated scaling grows or decays without bound.
    pub fn scale_speed(&self, factor: f32) -> f32 {
        let previous = self
            .speed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f32::from_bits(bits) * factor).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f32::from_bits(previous) * factor
    }

    #[must_use]
    pub fn is_pen_down(&self) -> bool {
        self.pen_down.load(Ordering::Acquire)
    }

    pub fn set_pen_down(&self, down: bool) {
        self.pen_down.store(down, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_state() {
        let state = ControlState::new(20_000.0);
        assert!(state.is_running());
        assert_eq!(state.speed(), 20_000.0);
        assert!(!state.is_pen_down());
    }

    #[test]
    fn test_stop_is_sticky() {
        let state = ControlState::new(1.0);
        state.stop();
        assert!(!state.is_running());
        state.stop();
        assert!(!state.is_running());
    }

    #[test]
    fn test_scale_speed_returns_new_value() {
        let state = ControlState::new(20_000.0);
        assert_eq!(state.scale_speed(1.5), 30_000.0);
        assert_eq!(state.speed(), 30_000.0);
        assert_eq!(state.scale_speed(0.75), 22_500.0);
    }

    #[test]
    fn test_scale_speed_is_unbounded() {
        let state = ControlState::new(1.0);
        for _ in 0..100 {
            state.scale_speed(1.5);
        }
        assert!(state.speed() > 1.0e17);
    }

    #[test]
    fn test_pen_flag() {
        let state = ControlState::new(1.0);
        state.set_pen_down(true);
        assert!(state.is_pen_down());
        state.set_pen_down(false);
        assert!(!state.is_pen_down());
    }

    #[test]
    fn test_stop_visible_across_threads() {
        let state = Arc::new(ControlState::new(1.0));
        let writer = Arc::clone(&state);
        std::thread::spawn(move || writer.stop()).join().unwrap();
        assert!(!state.is_running());
    }
}
