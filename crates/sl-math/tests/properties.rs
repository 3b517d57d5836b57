//! Property-based tests for sl-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use proptest::prelude::*;
use sl_math::binomial::{log_likelihood, probability_from_denominator};
use sl_math::{log_sum_exp, normalize_log_weights, round_to, xlogy};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

/// Helper to check approximate equality.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// log_sum_exp properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// log_sum_exp is commutative: order doesn't matter.
    #[test]
    fn log_sum_exp_commutative(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let ab = log_sum_exp(&[a, b]);
        let ba = log_sum_exp(&[b, a]);
        prop_assert!(approx_eq(ab, ba, TOL), "lse([{},{}])={} != lse([{},{}])={}", a, b, ab, b, a, ba);
    }

    /// log_sum_exp dominance: the max value dominates when differences are large.
    #[test]
    fn log_sum_exp_dominance(max_val in -50.0..50.0f64) {
        let small = max_val - 100.0;
        let result = log_sum_exp(&[max_val, small, small - 10.0]);
        prop_assert!(approx_eq(result, max_val, TOL),
            "lse([{},{},{}])={} not ≈ {}", max_val, small, small - 10.0, result, max_val);
    }

    /// No underflow with very negative values, the regime of long sessions.
    #[test]
    fn log_sum_exp_no_underflow(a in -9000.0..-500.0f64, b in -9000.0..-500.0f64) {
        let result = log_sum_exp(&[a, b]);
        prop_assert!(result.is_finite(), "lse([{},{}])={} should be finite", a, b, result);
        prop_assert!(result >= a.max(b) - TOL);
    }
}

// ============================================================================
// normalization properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Normalized weights form a distribution.
    #[test]
    fn normalized_weights_sum_to_one(values in prop::collection::vec(-20_000.0..0.0f64, 1..12)) {
        let probs = normalize_log_weights(&values).expect("finite inputs always normalize");
        let sum: f64 = probs.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9, "sum={}", sum);
        for p in &probs {
            prop_assert!(p.is_finite());
            prop_assert!(*p >= 0.0 && *p <= 1.0);
        }
    }

    /// Shifting every log-weight by a constant does not change the result.
    #[test]
    fn normalization_is_shift_invariant(
        values in prop::collection::vec(-500.0..0.0f64, 2..8),
        shift in -5000.0..5000.0f64,
    ) {
        let base = normalize_log_weights(&values).unwrap();
        let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
        let moved = normalize_log_weights(&shifted).unwrap();
        for (a, b) in base.iter().zip(moved.iter()) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }

    /// The arg-max keeps the largest share.
    #[test]
    fn normalization_preserves_order(values in prop::collection::vec(-300.0..0.0f64, 2..8)) {
        let probs = normalize_log_weights(&values).unwrap();
        let (imax, _) = values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, v)| if *v > acc.1 { (i, *v) } else { acc });
        for p in &probs {
            prop_assert!(probs[imax] >= *p);
        }
    }
}

// ============================================================================
// binomial kernel properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// xlogy never yields NaN for a zero multiplier.
    #[test]
    fn xlogy_zero_multiplier(y in 0.0..10.0f64) {
        prop_assert_eq!(xlogy(0.0, y), 0.0);
    }

    /// A valid count under a valid probability gives a finite, non-positive kernel.
    #[test]
    fn binomial_kernel_is_finite_non_positive(
        trials in 1u32..20_000,
        frac in 0.0..1.0f64,
        denominator in 1.01..2000.0f64,
    ) {
        let successes = (trials as f64 * frac).floor();
        let p = probability_from_denominator(denominator).unwrap();
        let ll = log_likelihood(successes, trials as f64, p);
        prop_assert!(ll.is_finite(), "ll={}", ll);
        prop_assert!(ll <= 0.0, "ll={}", ll);
    }

    /// The kernel peaks at the MLE p = n / N.
    #[test]
    fn binomial_kernel_peaks_at_mle(
        trials in 10u32..5000,
        successes_frac in 0.05..0.95f64,
        other in 0.01..0.99f64,
    ) {
        let n = (trials as f64 * successes_frac).round();
        let big_n = trials as f64;
        let mle = n / big_n;
        prop_assert!(log_likelihood(n, big_n, mle) >= log_likelihood(n, big_n, other) - 1e-9);
    }

    /// Rounding moves a value by at most half a unit in the last place kept.
    #[test]
    fn round_to_is_close(value in 0.0..100.0f64) {
        let rounded = round_to(value, 2);
        prop_assert!((rounded - value).abs() <= 0.005 + 1e-9);
    }
}
