/*! The discrete time model shared by all analyses.

All time values live on an integer grid. Fractional task parameters
(e.g., milliseconds taken from a benchmark) are mapped onto the grid
once, with [to_grid], before any analysis runs, so that no analysis
ever compares fractional values directly. */

/// This library uses a simple discrete time model.
pub type Time = u64;

/// Syntactic sugar to give a hint that a time value indicates a
/// point in time or some offset.
pub type Instant = Time;

/// Syntactic sugar to give a hint that a time value denotes an
/// interval length.
pub type Duration = Time;

/// The default number of grid points per unit of fractional time.
pub const DEFAULT_PRECISION: u64 = 10_000_000;

/// Integer division rounding towards positive infinity.
pub fn divide_with_ceil(a: Time, b: Time) -> u64 {
    a / b + (a % b > 0) as u64
}

/// Greatest common divisor.
pub fn gcd(mut a: Time, mut b: Time) -> Time {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Least common multiple. `lcm(0, x)` is defined as `x` so that the
/// function can be used directly as a fold over a set of periods.
pub fn lcm(a: Time, b: Time) -> Time {
    if a == 0 || b == 0 {
        a.max(b)
    } else {
        a / gcd(a, b) * b
    }
}

/// Map a fractional, non-negative time value onto the integer grid by
/// multiplying with `precision` and truncating.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn to_grid(value: f64, precision: u64) -> Time {
    debug_assert!(value >= 0.0);
    (value * precision as f64) as Time
}
