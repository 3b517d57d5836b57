//! Log-domain normalization into a discrete probability distribution.

/// Normalize unnormalized log-weights into probabilities that sum to 1.
///
/// The maximum is subtracted before exponentiation (log-sum-exp shift), so
/// log-weights in the thousands of nats neither underflow nor overflow.
///
/// Conventions:
/// - NaN entries carry no mass (treated as `-inf`)
/// - `-inf` entries receive exactly 0
/// - if any entry is `+inf`, the `+inf` entries split the mass equally
///
/// Returns `None` when the input is empty or no entry has mass, leaving the
/// fallback to the caller.
pub fn normalize_log_weights(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }

    let sanitized: Vec<f64> = values
        .iter()
        .map(|v| if v.is_nan() { f64::NEG_INFINITY } else { *v })
        .collect();

    let max = sanitized.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return None;
    }

    let relative: Vec<f64> = if max == f64::INFINITY {
        sanitized
            .iter()
            .map(|v| if *v == f64::INFINITY { 1.0 } else { 0.0 })
            .collect()
    } else {
        sanitized.iter().map(|v| (*v - max).exp()).collect()
    };

    let total: f64 = relative.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }

    Some(relative.iter().map(|r| r / total).collect())
}

/// Uniform distribution over `n` outcomes (empty for `n = 0`).
pub fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}
