//! Trial-count resolution per event.

use sl_config::{DenominatorBasis, EventDefinition};
use std::collections::HashMap;

/// Number of independent trials `event` was exposed to.
///
/// A `denominator_event_id` wins over the basis: the trial count is then the
/// observed count of the referenced event (0 if absent). Otherwise the basis
/// picks between total games, primary-phase games, and the remainder.
pub fn resolve_trials(
    event: &EventDefinition,
    total_spins: u64,
    primary_phase_spins: u64,
    counts: &HashMap<String, u64>,
) -> u64 {
    if let Some(reference) = event.denominator_event_id.as_deref() {
        return counts.get(reference).copied().unwrap_or(0);
    }

    match event.basis() {
        DenominatorBasis::PrimaryPhase => primary_phase_spins,
        DenominatorBasis::SecondaryPhase => total_spins.saturating_sub(primary_phase_spins),
        DenominatorBasis::Total => total_spins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(basis: Option<DenominatorBasis>, reference: Option<&str>) -> EventDefinition {
        EventDefinition {
            id: "e".to_string(),
            name: "E".to_string(),
            is_bonus: false,
            parent_id: None,
            denominator_basis: basis,
            denominator_event_id: reference.map(str::to_string),
            probabilities: Vec::new(),
        }
    }

    fn counts(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn unset_basis_uses_total() {
        assert_eq!(resolve_trials(&event(None, None), 1000, 700, &counts(&[])), 1000);
        assert_eq!(
            resolve_trials(
                &event(Some(DenominatorBasis::Total), None),
                1000,
                700,
                &counts(&[])
            ),
            1000
        );
    }

    #[test]
    fn phase_bases() {
        let primary = event(Some(DenominatorBasis::PrimaryPhase), None);
        let secondary = event(Some(DenominatorBasis::SecondaryPhase), None);
        assert_eq!(resolve_trials(&primary, 1000, 700, &counts(&[])), 700);
        assert_eq!(resolve_trials(&secondary, 1000, 700, &counts(&[])), 300);
    }

    #[test]
    fn secondary_never_negative() {
        let secondary = event(Some(DenominatorBasis::SecondaryPhase), None);
        assert_eq!(resolve_trials(&secondary, 500, 800, &counts(&[])), 0);
    }

    #[test]
    fn reference_event_overrides_basis() {
        let e = event(Some(DenominatorBasis::PrimaryPhase), Some("cz"));
        assert_eq!(resolve_trials(&e, 1000, 700, &counts(&[("cz", 12)])), 12);
        assert_eq!(resolve_trials(&e, 1000, 700, &counts(&[])), 0);
    }
}
