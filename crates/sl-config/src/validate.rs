//! Catalog validation errors and semantic validation.

use std::collections::HashSet;

use thiserror::Error;

use crate::catalog::{EventDefinition, MachineCatalog, MachineDefinition};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Catalog validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SchemaError(_) => 62,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for sl_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) => sl_common::Error::Config(msg),
            ValidationError::VersionMismatch { .. } => sl_common::Error::Config(err.to_string()),
            other => sl_common::Error::InvalidCatalog(other.to_string()),
        }
    }
}

/// Validate a catalog, stopping at the first problem.
pub fn validate_catalog(catalog: &MachineCatalog) -> ValidationResult<()> {
    match validate_catalog_all(catalog).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Validate a catalog and collect every problem found.
///
/// A version mismatch is reported alone: field rules of another schema
/// version are not meaningful.
pub fn validate_catalog_all(catalog: &MachineCatalog) -> Vec<ValidationError> {
    if catalog.schema_version != crate::CATALOG_SCHEMA_VERSION {
        return vec![ValidationError::VersionMismatch {
            expected: crate::CATALOG_SCHEMA_VERSION.to_string(),
            actual: catalog.schema_version.clone(),
        }];
    }

    let mut issues = Vec::new();

    if catalog.machines.is_empty() {
        issues.push(ValidationError::MissingField("machines".to_string()));
    }

    let mut seen = HashSet::new();
    for (idx, machine) in catalog.machines.iter().enumerate() {
        if !machine.id.is_empty() && !seen.insert(machine.id.as_str()) {
            issues.push(ValidationError::SemanticError(format!(
                "duplicate machine id '{}' at machines[{}]",
                machine.id, idx
            )));
        }
        collect_machine_issues(&format!("machines[{}]", idx), machine, &mut issues);
    }

    issues
}

fn collect_machine_issues(
    path: &str,
    machine: &MachineDefinition,
    issues: &mut Vec<ValidationError>,
) {
    if machine.id.trim().is_empty() {
        issues.push(ValidationError::MissingField(format!("{}.id", path)));
    }

    if machine.settings.is_empty() {
        issues.push(ValidationError::InvalidValue {
            field: format!("{}.settings", path),
            message: "Must list at least one setting".to_string(),
        });
    }

    let mut settings = HashSet::new();
    for (idx, setting) in machine.settings.iter().enumerate() {
        if setting.0 == 0 {
            issues.push(ValidationError::InvalidValue {
                field: format!("{}.settings[{}]", path, idx),
                message: "Must be a positive integer".to_string(),
            });
        }
        if !settings.insert(*setting) {
            issues.push(ValidationError::InvalidValue {
                field: format!("{}.settings[{}]", path, idx),
                message: format!("Duplicate setting {}", setting),
            });
        }
    }

    let event_ids: HashSet<&str> = machine.events.iter().map(|e| e.id.as_str()).collect();
    let mut seen = HashSet::new();
    for (idx, event) in machine.events.iter().enumerate() {
        let field = format!("{}.events[{}]", path, idx);
        if event.id.trim().is_empty() {
            issues.push(ValidationError::MissingField(format!("{}.id", field)));
        } else if !seen.insert(event.id.as_str()) {
            issues.push(ValidationError::SemanticError(format!(
                "duplicate event id '{}' at {}",
                event.id, field
            )));
        }
        collect_event_issues(&field, event, &event_ids, &settings, issues);
    }
}

fn collect_event_issues(
    field: &str,
    event: &EventDefinition,
    event_ids: &HashSet<&str>,
    settings: &HashSet<sl_common::SettingId>,
    issues: &mut Vec<ValidationError>,
) {
    for (name, reference) in [
        ("parent_id", event.parent_id.as_deref()),
        ("denominator_event_id", event.denominator_event_id.as_deref()),
    ] {
        let Some(target) = reference else { continue };
        if target == event.id {
            issues.push(ValidationError::InvalidValue {
                field: format!("{}.{}", field, name),
                message: "Must not reference the event itself".to_string(),
            });
        } else if !event_ids.contains(target) {
            issues.push(ValidationError::InvalidValue {
                field: format!("{}.{}", field, name),
                message: format!("Unknown event '{}'", target),
            });
        }
    }

    let mut covered = HashSet::new();
    for (idx, prob) in event.probabilities.iter().enumerate() {
        let prob_field = format!("{}.probabilities[{}]", field, idx);

        if !settings.contains(&prob.setting) {
            issues.push(ValidationError::InvalidValue {
                field: format!("{}.setting", prob_field),
                message: format!("Setting {} is not listed for this machine", prob.setting),
            });
        } else if !covered.insert(prob.setting) {
            issues.push(ValidationError::InvalidValue {
                field: format!("{}.setting", prob_field),
                message: format!("Duplicate entry for setting {}", prob.setting),
            });
        }

        if !prob.denominator.is_finite() || prob.denominator <= 1.0 {
            issues.push(ValidationError::InvalidValue {
                field: format!("{}.denominator", prob_field),
                message: format!("Must be finite and > 1, got {}", prob.denominator),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(json: &str) -> MachineCatalog {
        MachineCatalog::from_str(json).unwrap()
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = MachineCatalog::builtin().unwrap();
        let issues = validate_catalog_all(&catalog);
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn version_mismatch_short_circuits() {
        let c = catalog(r#"{"schema_version":"0.9.0","machines":[]}"#);
        let issues = validate_catalog_all(&c);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code(), 66);
    }

    #[test]
    fn empty_catalog_is_missing_machines() {
        let c = catalog(r#"{"schema_version":"1.0.0","machines":[]}"#);
        let err = validate_catalog(&c).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField(ref f) if f == "machines"));
    }

    #[test]
    fn denominator_must_exceed_one() {
        let c = catalog(
            r#"{"schema_version":"1.0.0","machines":[{"id":"m","name":"M","settings":[1,2],
                "events":[{"id":"e","name":"E","probabilities":[
                    {"setting":1,"denominator":1.0},{"setting":2,"denominator":0.5}]}]}]}"#,
        );
        let issues = validate_catalog_all(&c);
        assert_eq!(issues.len(), 2);
        match &issues[0] {
            ValidationError::InvalidValue { field, .. } => {
                assert_eq!(field, "machines[0].events[0].probabilities[0].denominator")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dangling_references_are_rejected() {
        let c = catalog(
            r#"{"schema_version":"1.0.0","machines":[{"id":"m","name":"M","settings":[1],
                "events":[
                    {"id":"a","name":"A","parent_id":"ghost","probabilities":[]},
                    {"id":"b","name":"B","denominator_event_id":"b","probabilities":[]}]}]}"#,
        );
        let issues = validate_catalog_all(&c);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].to_string().contains("Unknown event 'ghost'"));
        assert!(issues[1].to_string().contains("itself"));
    }

    #[test]
    fn missing_setting_entries_are_allowed() {
        let c = catalog(
            r#"{"schema_version":"1.0.0","machines":[{"id":"m","name":"M","settings":[1,2,3],
                "events":[{"id":"e","name":"E","probabilities":[{"setting":2,"denominator":8.0}]}]}]}"#,
        );
        assert!(validate_catalog(&c).is_ok());
    }

    #[test]
    fn unlisted_setting_is_rejected() {
        let c = catalog(
            r#"{"schema_version":"1.0.0","machines":[{"id":"m","name":"M","settings":[1],
                "events":[{"id":"e","name":"E","probabilities":[{"setting":7,"denominator":8.0}]}]}]}"#,
        );
        let err = validate_catalog(&c).unwrap_err();
        assert_eq!(err.code(), 65);
        assert!(err.to_string().contains("Setting 7"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let c = catalog(
            r#"{"schema_version":"1.0.0","machines":[
                {"id":"m","name":"M","settings":[1,1],"events":[
                    {"id":"e","name":"E","probabilities":[]},
                    {"id":"e","name":"E2","probabilities":[]}]},
                {"id":"m","name":"M2","settings":[1],"events":[]}]}"#,
        );
        let issues = validate_catalog_all(&c);
        let text: Vec<String> = issues.iter().map(|e| e.to_string()).collect();
        assert!(text.iter().any(|t| t.contains("Duplicate setting 1")));
        assert!(text.iter().any(|t| t.contains("duplicate event id 'e'")));
        assert!(text.iter().any(|t| t.contains("duplicate machine id 'm'")));
    }

    #[test]
    fn converts_into_common_error() {
        let err: sl_common::Error = ValidationError::SemanticError("x".into()).into();
        assert_eq!(err.code(), 11);
        let err: sl_common::Error = ValidationError::VersionMismatch {
            expected: "1.0.0".into(),
            actual: "2.0.0".into(),
        }
        .into();
        assert_eq!(err.code(), 10);
    }
}
