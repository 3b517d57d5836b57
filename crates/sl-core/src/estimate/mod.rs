//! Setting estimation engine.
//!
//! A pure function of (machine definition, observation snapshot): trial
//! counts are resolved per event, binomial log-likelihoods are accumulated
//! per setting, and the sums are normalized into percentages. Nothing here
//! touches storage or session state.
//!
//! ```ignore
//! use sl_core::estimate::{estimate_settings, Observation};
//!
//! let obs = Observation::new(1000).with_count("grape", 177);
//! let estimates = estimate_settings(machine, &obs);
//! ```

pub mod closest;
pub mod likelihood;
pub mod observation;
pub mod posterior;
pub mod trials;

pub use closest::{closest_setting, observed_denominator};
pub use likelihood::{log_likelihood, log_likelihood_terms, EvidenceTerm};
pub use observation::Observation;
pub use posterior::{
    estimate_report, estimate_settings, normalize, uniform_estimates, EstimationReport,
    EventEvidence, LeaderSummary, SettingEstimate, SettingScore, UniformReason,
};
pub use trials::resolve_trials;
