//! Bayes factor helpers for explaining how decisive an estimate is.
//!
//! Comparing two candidate settings A and B on the same data gives
//! `log_bf = log L(data | A) - log L(data | B)`. With a uniform prior over
//! settings this is also the log posterior odds of A against B.

use serde::Serialize;

/// Clamp for exponentiating log Bayes factors; exp(709) is near f64::MAX.
pub const LOG_BF_MAX: f64 = 700.0;

/// Posterior odds `exp(log_bf)` with overflow-safe clamping.
///
/// - `-inf` maps to 0
/// - `+inf` maps to `f64::MAX`
/// - NaN propagates
pub fn odds_from_log_bf(log_bf: f64) -> f64 {
    if log_bf.is_nan() {
        return f64::NAN;
    }
    if log_bf == f64::NEG_INFINITY {
        return 0.0;
    }
    if log_bf == f64::INFINITY {
        return f64::MAX;
    }
    log_bf.clamp(-LOG_BF_MAX, LOG_BF_MAX).exp()
}

/// Evidence in bits: `log_bf / ln 2`.
pub fn delta_bits(log_bf: f64) -> f64 {
    if log_bf.is_nan() {
        return f64::NAN;
    }
    log_bf / std::f64::consts::LN_2
}

/// Evidence strength on the Jeffreys scale (uses `|log_bf|`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    /// |log_bf| ≈ 0
    None,
    /// below ln(3.2)
    Anecdotal,
    /// below ln(10)
    Substantial,
    /// below ln(32)
    Strong,
    /// below ln(100)
    VeryStrong,
    /// ln(100) and above
    Decisive,
}

impl EvidenceStrength {
    pub fn from_log_bf(log_bf: f64) -> Self {
        if log_bf.is_nan() {
            return EvidenceStrength::None;
        }

        const LN_3_2: f64 = 1.163_150_809_678_64;
        const LN_32: f64 = 3.465_735_902_799_727;
        const LN_100: f64 = 4.605_170_185_988_092;
        let abs_log_bf = log_bf.abs();

        if abs_log_bf < f64::EPSILON {
            EvidenceStrength::None
        } else if abs_log_bf < LN_3_2 {
            EvidenceStrength::Anecdotal
        } else if abs_log_bf < std::f64::consts::LN_10 {
            EvidenceStrength::Substantial
        } else if abs_log_bf < LN_32 {
            EvidenceStrength::Strong
        } else if abs_log_bf < LN_100 {
            EvidenceStrength::VeryStrong
        } else {
            EvidenceStrength::Decisive
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EvidenceStrength::None => "none",
            EvidenceStrength::Anecdotal => "anecdotal",
            EvidenceStrength::Substantial => "substantial",
            EvidenceStrength::Strong => "strong",
            EvidenceStrength::VeryStrong => "very strong",
            EvidenceStrength::Decisive => "decisive",
        }
    }
}

impl std::fmt::Display for EvidenceStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Packaged comparison of two hypotheses.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceSummary {
    /// Raw log Bayes factor in nats.
    pub log_bf: f64,
    /// Posterior odds under a uniform prior, clamped.
    pub odds: f64,
    pub delta_bits: f64,
    pub strength: EvidenceStrength,
}

impl EvidenceSummary {
    pub fn from_log_bf(log_bf: f64) -> Self {
        EvidenceSummary {
            log_bf,
            odds: odds_from_log_bf(log_bf),
            delta_bits: delta_bits(log_bf),
            strength: EvidenceStrength::from_log_bf(log_bf),
        }
    }
}
