//! Posterior distribution over settings.
//!
//! Log-likelihoods are normalized with a log-sum-exp shift so that sessions
//! with thousands of games neither underflow nor overflow. A uniform prior
//! over the machine's settings is implied.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sl_common::SettingId;
use sl_config::MachineDefinition;
use sl_math::bayes_factor::EvidenceSummary;
use sl_math::{log_sum_exp, normalize_log_weights, round_to, uniform};

use super::likelihood::{event_term, log_likelihood, log_value};
use super::observation::Observation;
use crate::logging::{event_names, Stage};

/// Decimal places kept in reported percentages.
pub const PERCENT_DECIMALS: u32 = 2;

/// Posterior share of one setting, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SettingEstimate {
    pub setting: SettingId,
    pub percentage: f64,
}

/// Log-likelihood of one setting. A ruled-out setting serializes as `"-inf"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SettingScore {
    pub setting: SettingId,
    #[serde(with = "log_value")]
    #[schemars(with = "serde_json::Value")]
    pub log_likelihood: f64,
}

/// Why an estimate fell back to equal shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UniformReason {
    /// No games played yet.
    NoSpins,
    /// Every counted event is still at zero, or nothing contributed.
    NoEvidence,
    /// Every setting is ruled out by the observations.
    AllImpossible,
    /// The machine lists no settings.
    NoSettings,
}

impl std::fmt::Display for UniformReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniformReason::NoSpins => write!(f, "no_spins"),
            UniformReason::NoEvidence => write!(f, "no_evidence"),
            UniformReason::AllImpossible => write!(f, "all_impossible"),
            UniformReason::NoSettings => write!(f, "no_settings"),
        }
    }
}

/// One event's log-likelihood across all settings.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct EventEvidence {
    pub event_id: String,
    pub trials: u64,
    pub count: u64,
    /// Observed "1 in D" rate, when trials were played.
    pub observed_denominator: Option<f64>,
    pub per_setting: Vec<SettingScore>,
}

/// How far ahead the leading setting is over the runner-up.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderSummary {
    pub setting: SettingId,
    pub runner_up: SettingId,
    pub evidence: EvidenceSummary,
}

/// Full estimation result with the data behind it.
#[derive(Debug, Clone, Serialize)]
pub struct EstimationReport {
    pub machine_id: String,
    pub total_spins: u64,
    pub primary_phase_spins: u64,
    pub estimates: Vec<SettingEstimate>,
    /// Empty when a pre-gate short-circuited the computation.
    pub log_likelihoods: Vec<SettingScore>,
    /// `ln Σ exp(ll)` over settings; absent when not computed.
    pub log_evidence: Option<f64>,
    pub evidence: Vec<EventEvidence>,
    pub uniform_reason: Option<UniformReason>,
    pub leader: Option<LeaderSummary>,
}

/// Equal shares, `100 / k` each, unrounded.
pub fn uniform_estimates(settings: &[SettingId]) -> Vec<SettingEstimate> {
    settings
        .iter()
        .zip(uniform(settings.len()))
        .map(|(&setting, p)| SettingEstimate {
            setting,
            percentage: p * 100.0,
        })
        .collect()
}

/// Convert per-setting log-likelihoods into percentages summing to 100.
///
/// A `-inf` entry receives exactly 0. When every entry is `-inf` (or NaN)
/// all settings get equal shares.
pub fn normalize(scores: &[(SettingId, f64)]) -> Vec<SettingEstimate> {
    normalize_with_reason(scores).0
}

fn normalize_with_reason(scores: &[(SettingId, f64)]) -> (Vec<SettingEstimate>, Option<UniformReason>) {
    let settings: Vec<SettingId> = scores.iter().map(|(s, _)| *s).collect();
    if settings.is_empty() {
        return (Vec::new(), Some(UniformReason::NoSettings));
    }

    let values: Vec<f64> = scores.iter().map(|(_, ll)| *ll).collect();
    match normalize_log_weights(&values) {
        Some(probs) => {
            let estimates = settings
                .iter()
                .zip(probs)
                .map(|(&setting, p)| SettingEstimate {
                    setting,
                    percentage: round_to(p * 100.0, PERCENT_DECIMALS),
                })
                .collect();
            (estimates, None)
        }
        None => (uniform_estimates(&settings), Some(UniformReason::AllImpossible)),
    }
}

/// Pre-gates that skip accumulation entirely.
fn pre_gate(machine: &MachineDefinition, observation: &Observation) -> Option<UniformReason> {
    if machine.settings.is_empty() {
        return Some(UniformReason::NoSettings);
    }
    if observation.total_spins == 0 {
        return Some(UniformReason::NoSpins);
    }
    let any_counted = machine
        .events
        .iter()
        .any(|e| !observation.is_ignored(&e.id) && observation.count(&e.id) > 0);
    if !any_counted {
        return Some(UniformReason::NoEvidence);
    }
    None
}

/// Posterior percentages for every setting of `machine`, in catalog order.
pub fn estimate_settings(
    machine: &MachineDefinition,
    observation: &Observation,
) -> Vec<SettingEstimate> {
    if let Some(reason) = pre_gate(machine, observation) {
        log_uniform(machine, reason);
        return uniform_estimates(&machine.settings);
    }

    let scores: Vec<(SettingId, f64)> = machine
        .settings
        .iter()
        .map(|&s| (s, log_likelihood(machine, observation, s)))
        .collect();

    let (estimates, reason) = normalize_with_reason(&scores);
    match reason {
        Some(reason) => log_uniform(machine, reason),
        None => log_finished(machine, &estimates),
    }
    estimates
}

/// Like [`estimate_settings`] but keeps the evidence ledger and diagnostics.
pub fn estimate_report(machine: &MachineDefinition, observation: &Observation) -> EstimationReport {
    let mut report = EstimationReport {
        machine_id: machine.id.clone(),
        total_spins: observation.total_spins,
        primary_phase_spins: observation.primary_phase_spins,
        estimates: Vec::new(),
        log_likelihoods: Vec::new(),
        log_evidence: None,
        evidence: Vec::new(),
        uniform_reason: None,
        leader: None,
    };

    if let Some(reason) = pre_gate(machine, observation) {
        log_uniform(machine, reason);
        report.estimates = uniform_estimates(&machine.settings);
        report.uniform_reason = Some(reason);
        return report;
    }

    report.evidence = build_ledger(machine, observation);

    let mut totals: Vec<(SettingId, f64)> = machine.settings.iter().map(|&s| (s, 0.0)).collect();
    for entry in &report.evidence {
        for score in &entry.per_setting {
            if let Some(slot) = totals.iter_mut().find(|(s, _)| *s == score.setting) {
                slot.1 += score.log_likelihood;
            }
        }
    }

    report.log_likelihoods = totals
        .iter()
        .map(|&(setting, log_likelihood)| SettingScore {
            setting,
            log_likelihood,
        })
        .collect();

    let values: Vec<f64> = totals.iter().map(|(_, ll)| *ll).collect();
    let log_evidence = log_sum_exp(&values);
    report.log_evidence = log_evidence.is_finite().then_some(log_evidence);

    let (estimates, reason) = normalize_with_reason(&totals);
    report.estimates = estimates;
    report.uniform_reason = reason.or_else(|| {
        report
            .evidence
            .is_empty()
            .then_some(UniformReason::NoEvidence)
    });
    report.leader = leader_summary(&totals);

    match report.uniform_reason {
        Some(reason) => log_uniform(machine, reason),
        None => log_finished(machine, &report.estimates),
    }
    report
}

fn build_ledger(machine: &MachineDefinition, observation: &Observation) -> Vec<EventEvidence> {
    let mut ledger = Vec::new();
    for event in &machine.events {
        let mut entry: Option<EventEvidence> = None;
        for &setting in &machine.settings {
            let Some(term) = event_term(event, observation, setting) else {
                continue;
            };
            let entry = entry.get_or_insert_with(|| EventEvidence {
                event_id: term.event_id.clone(),
                trials: term.trials,
                count: term.count,
                observed_denominator: (term.count > 0).then(|| {
                    sl_math::binomial::observed_denominator(term.trials as f64, term.count as f64)
                }),
                per_setting: Vec::new(),
            });
            entry.per_setting.push(SettingScore {
                setting,
                log_likelihood: term.log_likelihood,
            });
        }
        if let Some(entry) = entry {
            ledger.push(entry);
        }
    }
    ledger
}

fn leader_summary(totals: &[(SettingId, f64)]) -> Option<LeaderSummary> {
    let mut ranked: Vec<&(SettingId, f64)> = totals.iter().filter(|(_, ll)| !ll.is_nan()).collect();
    // Stable sort: ties keep catalog order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let (first, second) = (ranked.first()?, ranked.get(1)?);
    if first.1 == f64::NEG_INFINITY {
        return None;
    }
    Some(LeaderSummary {
        setting: first.0,
        runner_up: second.0,
        evidence: EvidenceSummary::from_log_bf(first.1 - second.1),
    })
}

fn log_uniform(machine: &MachineDefinition, reason: UniformReason) {
    tracing::debug!(
        event = event_names::ESTIMATE_UNIFORM_FALLBACK,
        stage = %Stage::Estimate,
        machine_id = %machine.id,
        settings = machine.settings.len(),
        reason = %reason,
        "uniform estimate"
    );
}

fn log_finished(machine: &MachineDefinition, estimates: &[SettingEstimate]) {
    let top = estimates
        .iter()
        .max_by(|a, b| a.percentage.total_cmp(&b.percentage));
    tracing::debug!(
        event = event_names::ESTIMATE_FINISHED,
        stage = %Stage::Estimate,
        machine_id = %machine.id,
        settings = estimates.len(),
        top_setting = top.map(|e| e.setting.0),
        top_percentage = top.map(|e| e.percentage),
        "estimate finished"
    );
}
