//! Numerically stable primitives for log-domain likelihood math.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// `x * ln(y)` with the convention `0 * ln(y) = 0` for every `y`.
///
/// Plain multiplication gives NaN for `0 * ln(0)`; likelihood sums need the
/// limit value instead.
pub fn xlogy(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    x * y.ln()
}

/// `x * ln(1 - p)` computed through `ln_1p` so small `p` keeps precision.
pub fn xlog1my(x: f64, p: f64) -> f64 {
    if x.is_nan() || p.is_nan() {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    x * (-p).ln_1p()
}

/// Round half away from zero to `decimals` places.
///
/// Non-finite values pass through unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
