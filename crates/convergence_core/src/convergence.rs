//! Convergence and divergence policy for fixed-point iteration.

/// Magnitude beyond which an iterate is treated as diverging.
pub const DIVERGENCE_BOUND: f64 = 1e10;

/// Relative approximate error between successive iterates, in percent.
///
/// The denominator is the new iterate `x_out`. When it is zero the error is
/// `0` if `x_in` is also zero and `100` otherwise.
pub fn relative_error_percent(x_in: f64, x_out: f64) -> f64 {
    if x_out == 0.0 {
        if x_in == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        ((x_out - x_in) / x_out).abs() * 100.0
    }
}

/// Whether a step with `error_percent` meets `tolerance`.
///
/// Comparison is strict, and the zero-step state never counts as converged.
pub fn is_converged(error_percent: f64, tolerance: f64, step_count: usize) -> bool {
    step_count > 0 && error_percent < tolerance
}

/// `|x| > bound`; non-finite values always exceed it.
pub fn exceeds_bound(x: f64, bound: f64) -> bool {
    !x.is_finite() || x.abs() > bound
}
