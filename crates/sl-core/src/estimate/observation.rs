//! Observation snapshot handed to the estimator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Counts observed so far, already offset-corrected by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    /// Total elapsed games.
    pub total_spins: u64,

    /// Games attributable to the primary phase.
    #[serde(default)]
    pub primary_phase_spins: u64,

    /// Occurrence count per event id. Absent ids count as zero.
    #[serde(default)]
    pub counts: HashMap<String, u64>,

    /// Event ids excluded from this estimate.
    #[serde(default)]
    pub ignored: HashSet<String>,
}

impl Observation {
    pub fn new(total_spins: u64) -> Self {
        Observation {
            total_spins,
            ..Default::default()
        }
    }

    pub fn with_primary_phase(mut self, spins: u64) -> Self {
        self.primary_phase_spins = spins;
        self
    }

    pub fn with_count(mut self, event_id: impl Into<String>, count: u64) -> Self {
        self.counts.insert(event_id.into(), count);
        self
    }

    pub fn with_ignored(mut self, event_id: impl Into<String>) -> Self {
        self.ignored.insert(event_id.into());
        self
    }

    /// Observed count for an event (0 if absent).
    pub fn count(&self, event_id: &str) -> u64 {
        self.counts.get(event_id).copied().unwrap_or(0)
    }

    pub fn is_ignored(&self, event_id: &str) -> bool {
        self.ignored.contains(event_id)
    }
}
