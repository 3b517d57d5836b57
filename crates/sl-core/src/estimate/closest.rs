//! Nearest-setting diagnostic for a single event.

use sl_common::SettingId;
use sl_config::EventDefinition;

pub use sl_math::binomial::observed_denominator;

/// Setting whose known rate for `event` is nearest to `observed`.
///
/// Returns `None` when every setting shares the same denominator, since the
/// event then cannot discriminate. Observations better than the best known
/// rate saturate at the best setting, worse than the worst at the worst.
/// Ties go to the entry listed first in the catalog.
pub fn closest_setting(event: &EventDefinition, observed: f64) -> Option<SettingId> {
    if !event.has_setting_difference() {
        return None;
    }

    let probs = &event.probabilities;
    let best = probs
        .iter()
        .min_by(|a, b| a.denominator.total_cmp(&b.denominator))?;
    // max_by keeps the last of equal maxima, matching an ascending stable sort.
    let worst = probs
        .iter()
        .max_by(|a, b| a.denominator.total_cmp(&b.denominator))?;

    if observed <= best.denominator {
        return Some(best.setting);
    }
    if observed >= worst.denominator {
        return Some(worst.setting);
    }

    let mut closest = probs.first()?.setting;
    let mut min_diff = f64::INFINITY;
    for prob in probs {
        let diff = (observed - prob.denominator).abs();
        if diff < min_diff {
            min_diff = diff;
            closest = prob.setting;
        }
    }
    Some(closest)
}
