//! # Axis Normalizer
//!
//! Maps raw samples through a [`CalibrationMapping`] into an
//! origin-centered vector.
//!
//! Each enabled axis is mapped linearly and independently from
//! `[min, max]` onto `[-1.0, 1.0]`, so the calibration midpoint becomes
//! `0.0`. Values outside the calibrated window are clamped. A zero-width
//! axis and any disabled axis read as the midpoint.

use super::calibration::CalibrationMapping;
use super::{AxisMask, RawSample, AXIS_COUNT, AXIS_X, AXIS_Y};

/// Lower end of the normalized range.
pub const OUTPUT_MIN: f32 = -1.0;
/// Upper end of the normalized range.
pub const OUTPUT_MAX: f32 = 1.0;
/// Value reported for centered or degenerate axes.
pub const OUTPUT_CENTER: f32 = (OUTPUT_MIN + OUTPUT_MAX) / 2.0;

/// One normalized reading of every axis slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSample {
    pub axes: [f32; AXIS_COUNT],
}

impl NormalizedSample {
    /// All axes centered.
    pub const CENTERED: NormalizedSample = NormalizedSample {
        axes: [OUTPUT_CENTER; AXIS_COUNT],
    };

    #[must_use]
    pub fn x(&self) -> f32 {
        self.axes[AXIS_X]
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.axes[AXIS_Y]
    }
}

/// Stateless raw-to-normalized mapping for a fixed calibration.
///
/// # Examples
///
/// ```
/// use joyplot::controller::AxisMask;
/// use joyplot::controller::calibration::CalibrationMapping;
/// use joyplot::controller::normalizer::AxisNormalizer;
///
/// let mapping = CalibrationMapping::from_bounds([100, 100, 0, 0], [900, 900, 0, 0]);
/// let normalizer = AxisNormalizer::new(mapping, AxisMask::XY, [false; 4]);
///
/// let sample = normalizer.normalize(&[500, 900, 0, 0]);
/// assert_eq!(sample.x(), 0.0);
/// assert_eq!(sample.y(), 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AxisNormalizer {
    mapping: CalibrationMapping,
    mask: AxisMask,
    inverted: [bool; AXIS_COUNT],
}

impl AxisNormalizer {
    /// # Arguments
    ///
    /// * `mapping` - Calibrated raw window per axis
    /// * `mask` - Axes to normalize; others report center
    /// * `inverted` - Axes whose sign is flipped after mapping
    #[must_use]
    pub fn new(mapping: CalibrationMapping, mask: AxisMask, inverted: [bool; AXIS_COUNT]) -> Self {
        Self {
            mapping,
            mask,
            inverted,
        }
    }

    /// Normalizes every axis slot of `raw`.
    #[must_use]
    pub fn normalize(&self, raw: &RawSample) -> NormalizedSample {
        let mut axes = [OUTPUT_CENTER; AXIS_COUNT];
        for (axis, out) in axes.iter_mut().enumerate() {
            if !self.mask.is_enabled(axis) {
                continue;
            }
            let (min, max) = self.mapping.range(axis);
            let value = normalize_axis(raw[axis], min, max);
            *out = if self.inverted[axis] { -value } else { value };
        }
        NormalizedSample { axes }
    }
}

/// Linear map of `raw` from `[min, max]` onto the output range.
///
/// Returns [`OUTPUT_CENTER`] when `min == max`.
#[must_use]
pub fn normalize_axis(raw: i32, min: i32, max: i32) -> f32 {
    if min == max {
        return OUTPUT_CENTER;
    }
    // i64 keeps the subtraction exact for any i32 pair
    let t = (i64::from(raw) - i64::from(min)) as f32 / (i64::from(max) - i64::from(min)) as f32;
    (OUTPUT_MIN + t * (OUTPUT_MAX - OUTPUT_MIN)).clamp(OUTPUT_MIN, OUTPUT_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer(min: i32, max: i32) -> AxisNormalizer {
        let mapping = CalibrationMapping::from_bounds([min, min, 0, 0], [max, max, 0, 0]);
        AxisNormalizer::new(mapping, AxisMask::XY, [false; AXIS_COUNT])
    }

    #[test]
    fn test_endpoints_and_midpoint() {
        assert_eq!(normalize_axis(100, 100, 900), -1.0);
        assert_eq!(normalize_axis(900, 100, 900), 1.0);
        assert_eq!(normalize_axis(500, 100, 900), 0.0);
        assert!((normalize_axis(700, 100, 900) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_axis_is_center() {
        for raw in [i32::MIN, -1, 0, 500, i32::MAX] {
            let value = normalize_axis(raw, 500, 500);
            assert_eq!(value, OUTPUT_CENTER);
            assert!(value.is_finite());
        }
    }

    #[test]
    fn test_out_of_window_is_clamped() {
        assert_eq!(normalize_axis(0, 100, 900), -1.0);
        assert_eq!(normalize_axis(2000, 100, 900), 1.0);
    }

    #[test]
    fn test_extreme_window_is_finite() {
        let value = normalize_axis(0, i32::MIN, i32::MAX);
        assert!(value.is_finite());
        assert!(value.abs() < 1e-3);
    }

    #[test]
    fn test_axes_are_independent() {
        let n = normalizer(100, 900);
        let sample = n.normalize(&[100, 900, 0, 0]);
        assert_eq!(sample.x(), -1.0);
        assert_eq!(sample.y(), 1.0);
    }

    #[test]
    fn test_disabled_axes_report_center() {
        let mapping = CalibrationMapping::from_bounds([0; 4], [1000; 4]);
        let n = AxisNormalizer::new(mapping, AxisMask::XY, [false; AXIS_COUNT]);
        let sample = n.normalize(&[1000, 1000, 1000, 0]);
        assert_eq!(sample.axes[2], OUTPUT_CENTER);
        assert_eq!(sample.axes[3], OUTPUT_CENTER);
    }

    #[test]
    fn test_inverted_axis() {
        let mapping = CalibrationMapping::from_bounds([100, 100, 0, 0], [900, 900, 0, 0]);
        let n = AxisNormalizer::new(mapping, AxisMask::XY, [false, true, false, false]);
        let sample = n.normalize(&[900, 900, 0, 0]);
        assert_eq!(sample.x(), 1.0);
        assert_eq!(sample.y(), -1.0);
    }

    #[test]
    fn test_center_constant() {
        assert_eq!(OUTPUT_CENTER, 0.0);
        assert_eq!(NormalizedSample::CENTERED.x(), 0.0);
    }
}
