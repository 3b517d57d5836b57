//! Mutable counting-session state.
//!
//! Every mutation is an explicit method; estimates are recomputed on demand
//! from an [`Observation`] built out of the current state. Parent/child
//! coupling and start offsets live here, never in the estimator.

use serde::{Deserialize, Serialize};
use sl_common::{Error, Result, SessionId, SettingId};
use sl_config::{MachineCatalog, MachineDefinition};
use std::collections::{BTreeMap, BTreeSet};

use crate::estimate::{
    closest_setting, estimate_settings, observed_denominator, resolve_trials, Observation,
    SettingEstimate,
};

/// Settings shown before any machine is picked.
const DEFAULT_SETTING_COUNT: u32 = 6;

/// Share shown per default setting before any machine is picked.
const DEFAULT_PERCENTAGE: f64 = 16.67;

/// State of one counting session at one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub machine_id: Option<String>,
    /// Game counter reading when play started.
    pub start_games: u64,
    /// Current game counter reading.
    pub current_games: u64,
    /// Elapsed games in the primary phase; unset means every elapsed game.
    #[serde(default)]
    pub primary_games: Option<u64>,
    pub counts: BTreeMap<String, u64>,
    /// Count readings when play started, subtracted from `counts`.
    #[serde(default)]
    pub start_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub ignored: BTreeSet<String>,
    #[serde(default)]
    pub minus_mode: bool,
    #[serde(default)]
    pub show_settings: bool,
    /// Ignore a parent event whenever one of its children has been counted.
    #[serde(default = "default_true")]
    pub auto_ignore_parents: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            session_id: None,
            machine_id: None,
            start_games: 0,
            current_games: 0,
            primary_games: None,
            counts: BTreeMap::new(),
            start_counts: BTreeMap::new(),
            ignored: BTreeSet::new(),
            minus_mode: false,
            show_settings: false,
            auto_ignore_parents: true,
        }
    }
}

fn apply_delta(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta.unsigned_abs())
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected machine, resolved against `catalog`.
    pub fn current_machine<'a>(&self, catalog: &'a MachineCatalog) -> Result<&'a MachineDefinition> {
        let id = self.machine_id.as_deref().ok_or(Error::NoMachineSelected)?;
        catalog.machine(id).ok_or_else(|| Error::UnknownMachine {
            machine_id: id.to_string(),
        })
    }

    /// Switch to `machine`. Returns `false` if it was already selected.
    ///
    /// Switching resets games and zeroes one counter per event.
    pub fn select_machine(&mut self, machine: &MachineDefinition) -> bool {
        if self.machine_id.as_deref() == Some(machine.id.as_str()) {
            return false;
        }
        self.machine_id = Some(machine.id.clone());
        self.session_id = Some(SessionId::new());
        self.start_games = 0;
        self.current_games = 0;
        self.primary_games = None;
        self.counts = machine.events.iter().map(|e| (e.id.clone(), 0)).collect();
        self.start_counts.clear();
        self.ignored.clear();
        true
    }

    pub fn clear_machine(&mut self) {
        self.machine_id = None;
    }

    /// Add `delta` to an event's count (clamped at 0). A child event moves
    /// its parent by the same delta. Returns the event's new count.
    pub fn update_count(
        &mut self,
        machine: &MachineDefinition,
        event_id: &str,
        delta: i64,
    ) -> Result<u64> {
        let event = machine.event(event_id).ok_or_else(|| Error::UnknownEvent {
            machine_id: machine.id.clone(),
            event_id: event_id.to_string(),
        })?;

        let slot = self.counts.entry(event.id.clone()).or_insert(0);
        *slot = apply_delta(*slot, delta);
        let updated = *slot;

        if let Some(parent) = event.parent_id.as_deref() {
            let parent_slot = self.counts.entry(parent.to_string()).or_insert(0);
            *parent_slot = apply_delta(*parent_slot, delta);
        }

        Ok(updated)
    }

    /// One button press: +1, or -1 in minus mode.
    pub fn tap(&mut self, machine: &MachineDefinition, event_id: &str) -> Result<u64> {
        let delta = if self.minus_mode { -1 } else { 1 };
        self.update_count(machine, event_id, delta)
    }

    pub fn update_current_games(&mut self, delta: i64) {
        self.current_games = apply_delta(self.current_games, delta).max(self.start_games);
    }

    /// Set the game counter reading; never below the start reading.
    pub fn set_current_games(&mut self, value: u64) {
        self.current_games = value.max(self.start_games);
    }

    /// Set the start reading, pushing the current reading up if needed.
    pub fn set_start_games(&mut self, value: u64) {
        self.start_games = value;
        self.current_games = self.current_games.max(value);
    }

    /// Set elapsed primary-phase games, clamped to the elapsed total.
    pub fn set_primary_games(&mut self, value: u64) {
        self.primary_games = Some(value.min(self.total_games()));
    }

    /// Primary-phase games handed to the estimator: the recorded value, or
    /// the whole session while none was recorded.
    pub fn primary_phase_games(&self) -> u64 {
        let total = self.total_games();
        self.primary_games.unwrap_or(total).min(total)
    }

    /// Elapsed games since the start reading.
    pub fn total_games(&self) -> u64 {
        self.current_games.saturating_sub(self.start_games)
    }

    /// Snapshot current counts as the offsets to subtract from now on.
    pub fn mark_start_counts(&mut self) {
        self.start_counts = self.counts.clone();
    }

    /// `max(0, count - start)` for an event.
    pub fn effective_count(&self, event_id: &str) -> u64 {
        let current = self.counts.get(event_id).copied().unwrap_or(0);
        let start = self.start_counts.get(event_id).copied().unwrap_or(0);
        current.saturating_sub(start)
    }

    /// Flip whether an event is excluded. Returns the new ignored flag.
    pub fn toggle_ignored(&mut self, machine: &MachineDefinition, event_id: &str) -> Result<bool> {
        if machine.event(event_id).is_none() {
            return Err(Error::UnknownEvent {
                machine_id: machine.id.clone(),
                event_id: event_id.to_string(),
            });
        }
        if self.ignored.remove(event_id) {
            Ok(false)
        } else {
            self.ignored.insert(event_id.to_string());
            Ok(true)
        }
    }

    pub fn toggle_minus_mode(&mut self) -> bool {
        self.minus_mode = !self.minus_mode;
        self.minus_mode
    }

    pub fn toggle_show_settings(&mut self) -> bool {
        self.show_settings = !self.show_settings;
        self.show_settings
    }

    /// Zero every counter and the game readings. Ignore flags survive.
    pub fn reset_counts(&mut self, machine: &MachineDefinition) {
        self.session_id = Some(SessionId::new());
        self.start_games = 0;
        self.current_games = 0;
        self.primary_games = None;
        self.counts = machine.events.iter().map(|e| (e.id.clone(), 0)).collect();
        self.start_counts.clear();
    }

    /// Parents suppressed because a child already carries their evidence.
    pub fn auto_ignored(&self, machine: &MachineDefinition) -> BTreeSet<String> {
        if !self.auto_ignore_parents {
            return BTreeSet::new();
        }
        machine
            .events
            .iter()
            .filter(|e| {
                machine
                    .children_of(&e.id)
                    .any(|child| self.effective_count(&child.id) > 0)
            })
            .map(|e| e.id.clone())
            .collect()
    }

    /// Snapshot for the estimator: effective counts, elapsed games, and the
    /// explicit plus automatic ignore set.
    pub fn observation(&self, machine: &MachineDefinition) -> Observation {
        let total = self.total_games();
        let counts = machine
            .events
            .iter()
            .map(|e| (e.id.clone(), self.effective_count(&e.id)))
            .collect();
        let ignored = self
            .ignored
            .iter()
            .cloned()
            .chain(self.auto_ignored(machine))
            .collect();

        Observation {
            total_spins: total,
            primary_phase_spins: self.primary_phase_games(),
            counts,
            ignored,
        }
    }

    /// Current posterior. Without a known machine, six equal placeholder shares.
    pub fn estimation(&self, catalog: &MachineCatalog) -> Vec<SettingEstimate> {
        match self.current_machine(catalog) {
            Ok(machine) => estimate_settings(machine, &self.observation(machine)),
            Err(_) => (1..=DEFAULT_SETTING_COUNT)
                .map(|s| SettingEstimate {
                    setting: SettingId(s),
                    percentage: DEFAULT_PERCENTAGE,
                })
                .collect(),
        }
    }

    /// Nearest setting for one event from this session's own rate.
    ///
    /// `None` when the event cannot discriminate or had no trials yet.
    pub fn closest_for(
        &self,
        machine: &MachineDefinition,
        event_id: &str,
    ) -> Result<Option<SettingId>> {
        let event = machine.event(event_id).ok_or_else(|| Error::UnknownEvent {
            machine_id: machine.id.clone(),
            event_id: event_id.to_string(),
        })?;
        let observation = self.observation(machine);
        let trials = resolve_trials(
            event,
            observation.total_spins,
            observation.primary_phase_spins,
            &observation.counts,
        );
        if trials == 0 {
            return Ok(None);
        }
        let observed = observed_denominator(trials as f64, observation.count(event_id) as f64);
        Ok(closest_setting(event, observed))
    }
}
