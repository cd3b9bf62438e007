//! Log-space arithmetic helpers.
//!
//! Every probability in this crate is stored and combined in natural-log
//! space. This module is the single place that knows how `-inf` and `NaN`
//! are supposed to behave, so call sites never need ad-hoc guards.

/// `log(0)`.
pub const LN_ZERO: f64 = f64::NEG_INFINITY;

/// Replace a `NaN` with [`LN_ZERO`]. `-inf + inf` and similar indeterminate
/// forms are defined by this crate to mean "impossible", not "error".
#[inline]
pub fn sanitize(x: f64) -> f64 {
    if x.is_nan() {
        LN_ZERO
    } else {
        x
    }
}

/// `log(e^a + e^b)`, computed stably via the standard shift-by-max identity.
///
/// `-inf` is absorbing: `logsumexp(-inf, x) == x`. A `NaN` operand (which
/// can only arise from `-inf + inf` upstream) sanitizes to `-inf`.
#[inline]
pub fn logsumexp2(a: f64, b: f64) -> f64 {
    let a = sanitize(a);
    let b = sanitize(b);
    if a == LN_ZERO && b == LN_ZERO {
        return LN_ZERO;
    }
    let m = a.max(b);
    sanitize(m + (-(a - b).abs()).exp().ln_1p())
}

/// `log(sum_i e^{x_i})` over an arbitrary number of log-probabilities.
///
/// Returns [`LN_ZERO`] for an empty iterator (the empty sum has zero mass).
pub fn logsumexp<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().fold(LN_ZERO, logsumexp2)
}

/// `a + b` in log-space, i.e. ordinary addition, but with the crate's
/// `-inf` absorption and `NaN` policy applied. Used for combining
/// independent log-probabilities (emission + transition, etc).
#[inline]
pub fn log_mul(a: f64, b: f64) -> f64 {
    if a == LN_ZERO || b == LN_ZERO {
        return LN_ZERO;
    }
    sanitize(a + b)
}
