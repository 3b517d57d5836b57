//! Binomial log-likelihood kernel for count-based evidence.
//!
//! An event observed `n` times in `N` independent trials with per-trial
//! probability `p` contributes
//!
//! `log L = n·ln(p) + (N - n)·ln(1 - p)`
//!
//! The binomial coefficient `ln C(N, n)` is omitted: it is identical for every
//! candidate setting and cancels during normalization.

use super::stable::{xlog1my, xlogy};

/// Convert a "1 in D" denominator to a per-trial probability.
///
/// Returns `None` when the result falls outside `[0, 1]` (denominator NaN,
/// non-positive, or below one). `D = ∞` maps to `p = 0`.
pub fn probability_from_denominator(denominator: f64) -> Option<f64> {
    if denominator.is_nan() || denominator <= 0.0 {
        return None;
    }
    let p = 1.0 / denominator;
    if (0.0..=1.0).contains(&p) {
        Some(p)
    } else {
        None
    }
}

/// Kernel of the binomial log-likelihood for `successes` out of `trials`.
///
/// `successes > trials` is accepted: the failure term then has a negative
/// multiplier and the result stays finite for `p < 1`.
///
/// Returns:
/// - `-inf` when an observed outcome is impossible under `p`
///   (`successes > 0` with `p = 0`, or failures with `p = 1`)
/// - NaN when `p` is outside `[0, 1]` or any input is NaN
pub fn log_likelihood(successes: f64, trials: f64, p: f64) -> f64 {
    if successes.is_nan() || trials.is_nan() || p.is_nan() {
        return f64::NAN;
    }
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    let failures = trials - successes;
    xlogy(successes, p) + xlog1my(failures, p)
}

/// Observed "1 in D" rate: `trials / max(1, occurrences)`.
pub fn observed_denominator(trials: f64, occurrences: f64) -> f64 {
    trials / occurrences.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn probability_from_denominator_bounds() {
        assert_eq!(probability_from_denominator(4.0), Some(0.25));
        assert_eq!(probability_from_denominator(1.0), Some(1.0));
        assert_eq!(probability_from_denominator(f64::INFINITY), Some(0.0));
        assert_eq!(probability_from_denominator(0.5), None);
        assert_eq!(probability_from_denominator(0.0), None);
        assert_eq!(probability_from_denominator(-3.0), None);
        assert_eq!(probability_from_denominator(f64::NAN), None);
    }

    #[test]
    fn log_likelihood_matches_closed_form() {
        let p = 1.0 / 5.65;
        let out = log_likelihood(177.0, 1000.0, p);
        let expected = 177.0 * p.ln() + 823.0 * (1.0 - p).ln();
        assert!(approx_eq(out, expected, 1e-9));
    }

    #[test]
    fn zero_successes_with_zero_probability_is_zero() {
        assert_eq!(log_likelihood(0.0, 0.0, 0.0), 0.0);
        assert_eq!(log_likelihood(0.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn impossible_outcomes_are_neg_inf() {
        let out = log_likelihood(2.0, 100.0, 0.0);
        assert!(out.is_infinite() && out.is_sign_negative());

        let out = log_likelihood(50.0, 100.0, 1.0);
        assert!(out.is_infinite() && out.is_sign_negative());
    }

    #[test]
    fn all_successes_with_certain_probability_is_zero() {
        assert_eq!(log_likelihood(10.0, 10.0, 1.0), 0.0);
    }

    #[test]
    fn successes_above_trials_stay_finite() {
        let out = log_likelihood(12.0, 10.0, 0.1);
        assert!(out.is_finite());
    }

    #[test]
    fn out_of_range_probability_is_nan() {
        assert!(log_likelihood(1.0, 10.0, 1.5).is_nan());
        assert!(log_likelihood(1.0, 10.0, -0.1).is_nan());
    }

    #[test]
    fn observed_denominator_floors_occurrences_at_one() {
        assert_eq!(observed_denominator(1000.0, 4.0), 250.0);
        assert_eq!(observed_denominator(1000.0, 0.0), 1000.0);
    }
}
