//! # Plotter Commands
//!
//! | Command | Syntax | Meaning |
//! |---------|--------|---------|
//! | Init | `IN;` | reset plotter state |
//! | Select pen | `SPn;` | select pen `n` |
//! | Move absolute | `PAx,y;` | move to absolute coordinate |
//! | Move relative | `PRdx,dy;` | move by relative displacement |
//! | Pen down | `PD;` | lower pen |
//! | Pen up | `PU;` | raise pen |
//!
//! Commands are case-sensitive ASCII terminated by `;`. Coordinates are
//! signed 16-bit plotter units.

use bytes::{BufMut, BytesMut};
use std::fmt;

/// Command terminator
pub const TERMINATOR: u8 = b';';

/// One plotter instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotterCommand {
    Init,
    PenUp,
    PenDown,
    SelectPen(char),
    MoveAbsolute { x: i16, y: i16 },
    MoveRelative { dx: i16, dy: i16 },
}

impl PlotterCommand {
    /// Relative move from a floating displacement.
    ///
    /// Each component is rounded to nearest (halves away from zero) and
    /// saturated to the `i16` range.
    ///
    /// # Examples
    ///
    /// ```
    /// use joyplot::plotter::command::PlotterCommand;
    ///
    /// assert_eq!(
    ///     PlotterCommand::move_relative(9.6, -2.5),
    ///     PlotterCommand::MoveRelative { dx: 10, dy: -3 }
    /// );
    /// ```
    #[must_use]
    pub fn move_relative(dx: f32, dy: f32) -> Self {
        PlotterCommand::MoveRelative {
            dx: to_plotter_units(dx),
            dy: to_plotter_units(dy),
        }
    }

    /// Appends the rendered command to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        match *self {
            PlotterCommand::Init => dst.put_slice(b"IN"),
            PlotterCommand::PenUp => dst.put_slice(b"PU"),
            PlotterCommand::PenDown => dst.put_slice(b"PD"),
            PlotterCommand::SelectPen(pen) => {
                dst.put_slice(b"SP");
                let mut utf8 = [0u8; 4];
                dst.put_slice(pen.encode_utf8(&mut utf8).as_bytes());
            }
            PlotterCommand::MoveAbsolute { x, y } => put_pair(dst, b"PA", x, y),
            PlotterCommand::MoveRelative { dx, dy } => put_pair(dst, b"PR", dx, dy),
        }
        dst.put_u8(TERMINATOR);
    }
}

impl fmt::Display for PlotterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = BytesMut::with_capacity(16);
        self.encode(&mut buf);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

fn put_pair(dst: &mut BytesMut, mnemonic: &[u8], a: i16, b: i16) {
    dst.put_slice(mnemonic);
    dst.put_slice(a.to_string().as_bytes());
    dst.put_u8(b',');
    dst.put_slice(b.to_string().as_bytes());
}

/// Rounds a displacement to whole plotter units, saturating at the `i16` range.
#[must_use]
pub fn to_plotter_units(value: f32) -> i16 {
    // `as` saturates and maps NaN to 0
    value.round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(cmd: PlotterCommand) -> String {
        cmd.to_string()
    }

    #[test]
    fn test_fixed_commands() {
        assert_eq!(render(PlotterCommand::Init), "IN;");
        assert_eq!(render(PlotterCommand::PenUp), "PU;");
        assert_eq!(render(PlotterCommand::PenDown), "PD;");
    }

    #[test]
    fn test_select_pen_is_verbatim() {
        assert_eq!(render(PlotterCommand::SelectPen('3')), "SP3;");
        assert_eq!(render(PlotterCommand::SelectPen('8')), "SP8;");
    }

    #[test]
    fn test_moves() {
        assert_eq!(render(PlotterCommand::MoveAbsolute { x: 5180, y: 3800 }), "PA5180,3800;");
        assert_eq!(render(PlotterCommand::MoveRelative { dx: -12, dy: 0 }), "PR-12,0;");
        assert_eq!(
            render(PlotterCommand::MoveRelative { dx: i16::MIN, dy: i16::MAX }),
            "PR-32768,32767;"
        );
    }

    #[test]
    fn test_encode_appends() {
        let mut buf = BytesMut::new();
        PlotterCommand::Init.encode(&mut buf);
        PlotterCommand::MoveAbsolute { x: 1, y: 2 }.encode(&mut buf);
        assert_eq!(&buf[..], b"IN;PA1,2;");
    }

    #[test]
    fn test_rounding_to_nearest() {
        assert_eq!(to_plotter_units(10.0), 10);
        assert_eq!(to_plotter_units(9.5), 10);
        assert_eq!(to_plotter_units(9.49), 9);
        assert_eq!(to_plotter_units(-0.4), 0);
        assert_eq!(to_plotter_units(-0.6), -1);
    }

    #[test]
    fn test_rounding_saturates() {
        assert_eq!(to_plotter_units(1.0e9), i16::MAX);
        assert_eq!(to_plotter_units(-1.0e9), i16::MIN);
        assert_eq!(to_plotter_units(f32::NAN), 0);
    }

    #[test]
    fn test_move_relative_from_displacement() {
        assert_eq!(
            PlotterCommand::move_relative(10.0, -0.2),
            PlotterCommand::MoveRelative { dx: 10, dy: 0 }
        );
    }
}
