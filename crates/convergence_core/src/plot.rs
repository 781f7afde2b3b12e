//! Data for the plotting collaborator: the visible window and a sampled
//! `y = g(x)` curve. Drawing itself happens elsewhere.

use crate::trace::CobwebTrace;
use crate::traits::UnaryMap;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PADDING: f64 = 1.0;
pub const DEFAULT_SAMPLES: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    pub min: f64,
    pub max: f64,
}

impl DisplayRange {
    /// Window of `half_span` on each side of `center`.
    pub fn around(center: f64, half_span: f64) -> Self {
        Self {
            min: center - half_span,
            max: center + half_span,
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Smallest window containing every coordinate (x and y) of the trace,
/// padded by `padding` on both sides.
pub fn display_range(trace: &CobwebTrace, padding: f64) -> Option<DisplayRange> {
    let mut coords = trace.points().iter().flat_map(|p| [p.x, p.y]);
    let first = coords.next()?;
    let (min, max) = coords.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let mut range = DisplayRange {
        min: min - padding,
        max: max + padding,
    };
    if range.span() <= 0.0 {
        range = DisplayRange::around(range.min, 1.0);
    }
    Some(range)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSample {
    pub x: f64,
    /// `None` where g could not be evaluated, so the plot shows a gap.
    pub y: Option<f64>,
}

/// Evaluates g at `samples` evenly spaced points spanning `range`
/// (both ends included).
pub fn sample_curve<M: UnaryMap + ?Sized>(
    map: &M,
    range: DisplayRange,
    samples: usize,
) -> Result<Vec<CurveSample>> {
    if samples < 2 {
        bail!("Curve sampling needs at least 2 samples.");
    }
    if !range.min.is_finite() || !range.max.is_finite() || range.max <= range.min {
        bail!("Display range must be finite with max > min.");
    }

    let step = range.span() / (samples - 1) as f64;
    let curve = (0..samples)
        .map(|i| {
            let x = if i == samples - 1 {
                range.max
            } else {
                range.min + step * i as f64
            };
            let y = map.apply(x).ok().filter(|y| y.is_finite());
            CurveSample { x, y }
        })
        .collect();
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    struct Reciprocal;

    impl UnaryMap for Reciprocal {
        fn apply(&self, x: f64) -> Result<f64, EngineError> {
            if x == 0.0 {
                Err(EngineError::DivisionByZero)
            } else {
                Ok(1.0 / x)
            }
        }
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn display_range_covers_all_coordinates_with_padding() {
        let mut trace = CobwebTrace::seeded(0.5);
        trace.push_step(0.5, 2.0);
        let range = display_range(&trace, DEFAULT_PADDING).expect("range");
        assert_eq!(range, DisplayRange { min: -1.0, max: 3.0 });
    }

    #[test]
    fn display_range_of_empty_trace_is_none() {
        assert_eq!(display_range(&CobwebTrace::default(), 1.0), None);
    }

    #[test]
    fn degenerate_range_is_widened() {
        let trace = CobwebTrace::seeded(0.0);
        let range = display_range(&trace, 0.0).expect("range");
        assert!(range.max > range.min);
    }

    #[test]
    fn sample_curve_includes_both_ends_and_gaps() {
        let curve = sample_curve(&Reciprocal, DisplayRange::around(0.0, 1.0), 5)
            .expect("curve should sample");
        let xs: Vec<f64> = curve.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(curve[2].y, None);
        assert_eq!(curve[4].y, Some(1.0));
    }

    #[test]
    fn sample_curve_rejects_invalid_inputs() {
        assert_err_contains(
            sample_curve(&Reciprocal, DisplayRange::around(0.0, 1.0), 1),
            "at least 2 samples",
        );
        assert_err_contains(
            sample_curve(&Reciprocal, DisplayRange { min: 1.0, max: 1.0 }, 10),
            "max > min",
        );
    }
}
