//! Sine transform between a bounded parameter and an unbounded internal coordinate.
//!
//! ```text
//! ext = lo + (hi − lo) · (sin(int) + 1) / 2
//! int = asin(2 (ext − lo) / (hi − lo) − 1)
//! ```
//!
//! Every internal value maps inside `[lo, hi]`, so an unconstrained solver never leaves the
//! allowed range. External values outside the bounds are pulled onto the nearest bound.

/// Largest internal step; beyond it the transform folds back onto itself.
const MAX_INTERNAL_STEP: f64 = 1.0;

pub fn to_internal(external: f64, lo: f64, hi: f64) -> f64 {
    let arg = (2.0 * (external - lo) / (hi - lo) - 1.0).clamp(-1.0, 1.0);
    arg.asin()
}

pub fn to_external(internal: f64, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * (internal.sin() + 1.0) / 2.0
}

/// Internal counterpart of an external `step` taken from `external`.
///
/// The step is taken towards the interior when `external + step` would cross the upper
/// bound, so a seed sitting on a bound still gets a non-zero internal step.
pub fn internal_step(external: f64, step: f64, lo: f64, hi: f64) -> f64 {
    let from = to_internal(external, lo, hi);
    let target = if external + step > hi {
        external - step
    } else {
        external + step
    };
    let delta = (to_internal(target, lo, hi) - from).abs();
    if delta > 0.0 {
        delta.min(MAX_INTERNAL_STEP)
    } else {
        MAX_INTERNAL_STEP
    }
}
