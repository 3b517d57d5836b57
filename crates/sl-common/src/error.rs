//! Errors shared by the Slotlight crates.
//!
//! Every variant has a stable numeric code, a category, and a fix hint. The
//! CLI renders the same error two ways:
//!
//! Terminal (`--format md`):
//!
//! ```text
//! ✗ Invalid Machine Catalog
//!   Reason: invalid machine catalog: events[3].probabilities[0].denominator must be > 1
//!   Fix: Run 'sl-core check' to see every problem in the catalog file.
//! ```
//!
//! JSON, nested under `error` on stderr:
//!
//! ```json
//! {
//!   "code": 11,
//!   "category": "config",
//!   "message": "invalid machine catalog: ...",
//!   "recoverable": true,
//!   "suggested_action": "run_check"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse grouping of [`Error`] variants; drives the CLI exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Catalog and configuration errors.
    Config,
    /// Likelihood and normalization errors.
    Estimation,
    /// Session state and persistence errors.
    Session,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Estimation => write!(f, "estimation"),
            ErrorCategory::Session => write!(f, "session"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Next step reported to scripts alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Run the catalog check command.
    RunCheck,
    /// Pick a machine from the catalog first.
    SelectMachine,
    /// Reset the stored session.
    ResetSession,
    /// Fix the command arguments.
    FixArguments,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::SelectMachine => write!(f, "select_machine"),
            SuggestedAction::ResetSession => write!(f, "reset_session"),
            SuggestedAction::FixArguments => write!(f, "fix_arguments"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for Slotlight.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid machine catalog: {0}")]
    InvalidCatalog(String),

    #[error("unknown machine: {machine_id}")]
    UnknownMachine { machine_id: String },

    #[error("unknown event {event_id} for machine {machine_id}")]
    UnknownEvent {
        machine_id: String,
        event_id: String,
    },

    // Estimation errors (30-39)
    #[error("estimation failed: {0}")]
    Estimation(String),

    #[error("numerical instability detected: {0}")]
    NumericalInstability(String),

    // Session errors (50-59)
    #[error("no machine selected for this session")]
    NoMachineSelected,

    #[error("session corrupted: {0}")]
    SessionCorrupted(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 30-39: Estimation errors
    /// - 50-59: Session errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidCatalog(_) => 11,
            Error::UnknownMachine { .. } => 12,
            Error::UnknownEvent { .. } => 13,
            Error::Estimation(_) => 30,
            Error::NumericalInstability(_) => 31,
            Error::NoMachineSelected => 50,
            Error::SessionCorrupted(_) => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidCatalog(_)
            | Error::UnknownMachine { .. }
            | Error::UnknownEvent { .. } => ErrorCategory::Config,

            Error::Estimation(_) | Error::NumericalInstability(_) => ErrorCategory::Estimation,

            Error::NoMachineSelected | Error::SessionCorrupted(_) => ErrorCategory::Session,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// False only for estimator faults; everything else is fixed by
    /// changing input, catalog, or session.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Estimation(_) | Error::NumericalInstability(_))
    }

    /// What a calling script should do next.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidCatalog(_) => SuggestedAction::RunCheck,
            Error::UnknownMachine { .. } => SuggestedAction::FixArguments,
            Error::UnknownEvent { .. } => SuggestedAction::FixArguments,

            Error::Estimation(_) => SuggestedAction::ManualIntervention,
            Error::NumericalInstability(_) => SuggestedAction::ManualIntervention,

            Error::NoMachineSelected => SuggestedAction::SelectMachine,
            Error::SessionCorrupted(_) => SuggestedAction::ResetSession,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// One-line fix hint shown under the error.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'sl-core check' to validate the resolved configuration.",
            Error::InvalidCatalog(_) => {
                "Run 'sl-core check' to see every problem in the catalog file, or unset SLOTLIGHT_CATALOG to use the built-in catalog."
            }
            Error::UnknownMachine { .. } => {
                "List available machines with 'sl-core machines'."
            }
            Error::UnknownEvent { .. } => {
                "List the machine's events with 'sl-core machines --events'."
            }
            Error::Estimation(_) => "Report this as a bug together with the counts that triggered it.",
            Error::NumericalInstability(_) => {
                "Report this as a bug together with the counts that triggered it."
            }
            Error::NoMachineSelected => "Select a machine with 'sl-core session select <machine-id>'.",
            Error::SessionCorrupted(_) => "Reset the stored session with 'sl-core session reset'.",
            Error::Io(_) => "Check disk space, permissions, and that the data directory exists.",
            Error::Json(_) => "Invalid JSON in file. Check syntax with 'jq . <file>' or restore from backup.",
        }
    }

    /// Title-case headline for terminal output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidCatalog(_) => "Invalid Machine Catalog",
            Error::UnknownMachine { .. } => "Unknown Machine",
            Error::UnknownEvent { .. } => "Unknown Event",
            Error::Estimation(_) => "Estimation Error",
            Error::NumericalInstability(_) => "Numerical Instability",
            Error::NoMachineSelected => "No Machine Selected",
            Error::SessionCorrupted(_) => "Session Corrupted",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }

    /// Render the headline / reason / fix block for terminals.
    pub fn format_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }
}

/// Error body of a JSON failure response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub suggested_action: SuggestedAction,
    /// Ids named by the error, plus anything the caller attaches.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UnknownMachine { machine_id } => {
                context.insert("machine_id".to_string(), serde_json::json!(machine_id));
            }
            Error::UnknownEvent {
                machine_id,
                event_id,
            } => {
                context.insert("machine_id".to_string(), serde_json::json!(machine_id));
                context.insert("event_id".to_string(), serde_json::json!(event_id));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Attach a context field; values that fail to serialize are dropped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Compact JSON, with a minimal fallback if serialization fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
