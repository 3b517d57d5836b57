//! Machine catalog types.
//!
//! These types match the machines.json file layout. A catalog is loaded once
//! and treated as read-only for the lifetime of the process.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use sl_common::SettingId;

use crate::validate::ValidationError;

/// Catalog shipped with the binary.
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../data/machines.json");

/// Complete machine catalog.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MachineCatalog {
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub machines: Vec<MachineDefinition>,
}

/// One machine model: its candidate settings and trackable events.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MachineDefinition {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub maker: String,

    /// Candidate settings, in display order.
    pub settings: Vec<SettingId>,

    pub events: Vec<EventDefinition>,
}

/// Which elapsed-game quantity serves as an event's trial count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorBasis {
    /// All elapsed games.
    #[default]
    Total,
    /// Games played in the primary (normal) phase.
    PrimaryPhase,
    /// Games outside the primary phase: `total - primary`.
    SecondaryPhase,
}

impl DenominatorBasis {
    /// Parse a basis label, accepting legacy spellings.
    ///
    /// Returns `None` for anything unrecognised so that old catalogs fall back
    /// to [`DenominatorBasis::Total`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "total" => Some(DenominatorBasis::Total),
            "primary_phase" | "primaryPhase" | "normal" => Some(DenominatorBasis::PrimaryPhase),
            "secondary_phase" | "secondaryPhase" | "at" => Some(DenominatorBasis::SecondaryPhase),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DenominatorBasis::Total => "total",
            DenominatorBasis::PrimaryPhase => "primary_phase",
            DenominatorBasis::SecondaryPhase => "secondary_phase",
        }
    }
}

impl std::fmt::Display for DenominatorBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn lenient_basis<'de, D>(deserializer: D) -> Result<Option<DenominatorBasis>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(DenominatorBasis::from_label))
}

/// A 1-in-D occurrence rate for one setting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SettingProbability {
    pub setting: SettingId,

    /// Probability denominator: the event happens once every `denominator` trials.
    pub denominator: f64,
}

/// One trackable occurrence type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventDefinition {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub is_bonus: bool,

    /// Event this one is a sub-category of. Counting this event also counts the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_basis",
        skip_serializing_if = "Option::is_none"
    )]
    pub denominator_basis: Option<DenominatorBasis>,

    /// When set, the trial count is the observed count of this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator_event_id: Option<String>,

    /// Per-setting rates, in catalog order.
    #[serde(default)]
    pub probabilities: Vec<SettingProbability>,
}

impl EventDefinition {
    /// Effective trial-count basis (absent means total).
    pub fn basis(&self) -> DenominatorBasis {
        self.denominator_basis.unwrap_or_default()
    }

    /// Denominator for a setting, using the first matching entry.
    pub fn denominator_for(&self, setting: SettingId) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|p| p.setting == setting)
            .map(|p| p.denominator)
    }

    /// Whether at least two settings carry different rates for this event.
    pub fn has_setting_difference(&self) -> bool {
        match self.probabilities.split_first() {
            Some((first, rest)) => rest.iter().any(|p| p.denominator != first.denominator),
            None => false,
        }
    }
}

impl MachineDefinition {
    /// Look up an event by id.
    pub fn event(&self, id: &str) -> Option<&EventDefinition> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events declared as sub-categories of `parent_id`.
    pub fn children_of<'a>(
        &'a self,
        parent_id: &'a str,
    ) -> impl Iterator<Item = &'a EventDefinition> + 'a {
        self.events
            .iter()
            .filter(move |e| e.parent_id.as_deref() == Some(parent_id))
    }

    /// Whether any event names `event_id` as its parent.
    pub fn has_children(&self, event_id: &str) -> bool {
        self.children_of(event_id).next().is_some()
    }

    /// Denominator of `event_id` at `setting`, if both exist.
    pub fn probability_for(&self, event_id: &str, setting: SettingId) -> Option<f64> {
        self.event(event_id)?.denominator_for(setting)
    }

    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.id.as_str())
    }
}

impl MachineCatalog {
    /// Load a catalog from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_str(&content)
    }

    /// Parse a catalog from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// The catalog embedded in the binary.
    pub fn builtin() -> Result<Self, ValidationError> {
        Self::from_str(BUILTIN_CATALOG_JSON)
    }

    /// Look up a machine by id.
    pub fn machine(&self, id: &str) -> Option<&MachineDefinition> {
        self.machines.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_json(extra: &str) -> String {
        format!(
            r#"{{"id":"reg","name":"REG",{}"probabilities":[{{"setting":1,"denominator":452.0}}]}}"#,
            extra
        )
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = MachineCatalog::builtin().unwrap();
        assert_eq!(catalog.schema_version, crate::CATALOG_SCHEMA_VERSION);
        assert!(catalog.machine("my-juggler-5").is_some());
    }

    #[test]
    fn basis_defaults_to_total() {
        let event: EventDefinition = serde_json::from_str(&event_json("")).unwrap();
        assert_eq!(event.denominator_basis, None);
        assert_eq!(event.basis(), DenominatorBasis::Total);
    }

    #[test]
    fn basis_accepts_legacy_labels() {
        let normal: EventDefinition =
            serde_json::from_str(&event_json(r#""denominator_basis":"normal","#)).unwrap();
        assert_eq!(normal.basis(), DenominatorBasis::PrimaryPhase);

        let at: EventDefinition =
            serde_json::from_str(&event_json(r#""denominator_basis":"at","#)).unwrap();
        assert_eq!(at.basis(), DenominatorBasis::SecondaryPhase);
    }

    #[test]
    fn unknown_basis_falls_back_to_total() {
        let event: EventDefinition =
            serde_json::from_str(&event_json(r#""denominator_basis":"bonus_only","#)).unwrap();
        assert_eq!(event.denominator_basis, None);
        assert_eq!(event.basis(), DenominatorBasis::Total);
    }

    #[test]
    fn basis_serializes_snake_case() {
        let json = serde_json::to_string(&DenominatorBasis::SecondaryPhase).unwrap();
        assert_eq!(json, "\"secondary_phase\"");
    }

    #[test]
    fn denominator_lookup_uses_first_entry() {
        let event: EventDefinition = serde_json::from_str(
            r#"{"id":"x","name":"X","probabilities":[
                {"setting":1,"denominator":10.0},
                {"setting":1,"denominator":20.0}]}"#,
        )
        .unwrap();
        assert_eq!(event.denominator_for(SettingId(1)), Some(10.0));
        assert_eq!(event.denominator_for(SettingId(2)), None);
    }

    #[test]
    fn setting_difference_detection() {
        let catalog = MachineCatalog::builtin().unwrap();
        let machine = catalog.machine("my-juggler-5").unwrap();
        assert!(machine.event("grape").unwrap().has_setting_difference());

        let flat: EventDefinition = serde_json::from_str(
            r#"{"id":"x","name":"X","probabilities":[
                {"setting":1,"denominator":10.0},
                {"setting":2,"denominator":10.0}]}"#,
        )
        .unwrap();
        assert!(!flat.has_setting_difference());

        let empty: EventDefinition =
            serde_json::from_str(r#"{"id":"x","name":"X","probabilities":[]}"#).unwrap();
        assert!(!empty.has_setting_difference());
    }

    #[test]
    fn children_follow_parent_links() {
        let catalog = MachineCatalog::builtin().unwrap();
        let machine = catalog.machine("my-juggler-5").unwrap();
        let children: Vec<&str> = machine.children_of("reg").map(|e| e.id.as_str()).collect();
        assert_eq!(children, vec!["solo-reg", "cherry-reg"]);
        assert!(machine.has_children("reg"));
        assert!(!machine.has_children("grape"));
    }

    #[test]
    fn probability_lookup_by_event() {
        let catalog = MachineCatalog::builtin().unwrap();
        let machine = catalog.machine("my-juggler-5").unwrap();
        assert_eq!(machine.probability_for("big", SettingId(6)), Some(240.9));
        assert_eq!(machine.probability_for("nope", SettingId(6)), None);
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = MachineCatalog::from_str("{ not json").unwrap_err();
        assert_eq!(err.code(), 61);
    }
}
