//! Per-setting log-likelihood accumulation.
//!
//! Each non-ignored event with a usable rate and at least one trial
//! contributes the binomial kernel `n·ln p + (N−n)·ln(1−p)`. Events are
//! independent: parent/child merging is the caller's job via the ignore set.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sl_common::SettingId;
use sl_config::{EventDefinition, MachineDefinition};
use sl_math::binomial;

use super::observation::Observation;
use super::trials::resolve_trials;

/// Serde for log-likelihoods. JSON numbers cannot hold `-inf`, so
/// non-finite values travel as the strings `"-inf"`, `"inf"` and `"nan"`.
pub(crate) mod log_value {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => match text.as_str() {
                "-inf" => Ok(f64::NEG_INFINITY),
                "inf" => Ok(f64::INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("invalid log-likelihood '{other}'"))),
            },
        }
    }
}

/// One event's contribution to a setting's log-likelihood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceTerm {
    pub event_id: String,
    pub trials: u64,
    pub count: u64,
    /// Per-trial probability at this setting (`1 / denominator`).
    pub probability: f64,
    #[serde(with = "log_value")]
    #[schemars(with = "serde_json::Value")]
    pub log_likelihood: f64,
}

/// Sum of all event contributions for `setting`. Can be `-inf`.
pub fn log_likelihood(
    machine: &MachineDefinition,
    observation: &Observation,
    setting: SettingId,
) -> f64 {
    machine
        .events
        .iter()
        .filter_map(|event| event_term(event, observation, setting))
        .map(|term| term.log_likelihood)
        .sum()
}

/// Like [`log_likelihood`] but also returns the contributing terms.
pub fn log_likelihood_terms(
    machine: &MachineDefinition,
    observation: &Observation,
    setting: SettingId,
) -> (f64, Vec<EvidenceTerm>) {
    let terms: Vec<EvidenceTerm> = machine
        .events
        .iter()
        .filter_map(|event| event_term(event, observation, setting))
        .collect();
    let total: f64 = terms.iter().map(|t| t.log_likelihood).sum();
    (total, terms)
}

/// Contribution of one event, or `None` when the event is skipped.
pub(crate) fn event_term(
    event: &EventDefinition,
    observation: &Observation,
    setting: SettingId,
) -> Option<EvidenceTerm> {
    if observation.is_ignored(&event.id) {
        return None;
    }

    let probability = binomial::probability_from_denominator(event.denominator_for(setting)?)?;

    let trials = resolve_trials(
        event,
        observation.total_spins,
        observation.primary_phase_spins,
        &observation.counts,
    );
    if trials == 0 {
        return None;
    }

    let count = observation.count(&event.id);
    let log_likelihood = binomial::log_likelihood(count as f64, trials as f64, probability);

    tracing::trace!(
        event_id = %event.id,
        setting = setting.0,
        trials,
        count,
        log_likelihood,
        "event term"
    );

    Some(EvidenceTerm {
        event_id: event.id.clone(),
        trials,
        count,
        probability,
        log_likelihood,
    })
}
