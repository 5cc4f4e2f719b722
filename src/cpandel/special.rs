//! Special functions needed by the exact Convoluted Pandel expression.

/// Maximum number of series terms for the confluent hypergeometric function.
const KUMMER_MAX_TERMS: usize = 20_000;

/// Gamma function Γ(x).
#[inline]
pub fn gamma(x: f64) -> f64 {
    statrs::function::gamma::gamma(x)
}

/// Kummer's confluent hypergeometric function `M(a, b, x) = ₁F₁(a; b; x)`.
///
/// Evaluated by direct summation of
///
/// ```text
/// M(a, b, x) = Σ (a)_n / (b)_n · x^n / n!
/// ```
///
/// For `x ≥ 0` and `a, b > 0` (the only case met in the Pandel regions) all terms are
/// positive, so the sum carries no cancellation even for `x` of several hundreds where the
/// terms peak around `n ≈ x`. Negative arguments are mapped onto positive ones with
/// Kummer's transformation `M(a, b, x) = eˣ M(b − a, b, −x)`.
///
/// Arguments
/// -----------------
/// * `a`, `b`: function parameters, `b` not a non-positive integer.
/// * `x`: argument.
///
/// Return
/// ----------
/// * The function value; `+∞` once the sum overflows.
pub fn kummer_m(a: f64, b: f64, x: f64) -> f64 {
    if x < 0.0 {
        return x.exp() * kummer_m(b - a, b, -x);
    }

    let mut sum = 1.0;
    let mut term = 1.0;
    for n in 0..KUMMER_MAX_TERMS {
        let nf = n as f64;
        term *= (a + nf) / (b + nf) * x / (nf + 1.0);
        sum += term;
        if term.abs() <= f64::EPSILON * sum.abs() || !sum.is_finite() {
            break;
        }
    }
    sum
}
