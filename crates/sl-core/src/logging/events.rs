//! Stage and event-name vocabulary for structured logs.
//!
//! Every event carries an `event` field from [`event_names`] and a `stage`
//! so JSONL output can be filtered without parsing messages.

use serde::{Deserialize, Serialize};

/// Processing stages of an sl-core invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and argument handling.
    Init,
    /// Catalog resolution and validation.
    Catalog,
    /// Posterior computation.
    Estimate,
    /// Session load, mutation, and save.
    Session,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Catalog => "catalog",
            Stage::Estimate => "estimate",
            Stage::Session => "session",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Catalog
    pub const CATALOG_LOADED: &str = "catalog.loaded";
    pub const CATALOG_BUILTIN_USED: &str = "catalog.builtin_used";
    pub const CATALOG_INVALID: &str = "catalog.invalid";

    // Estimate
    pub const ESTIMATE_FINISHED: &str = "estimate.finished";
    pub const ESTIMATE_UNIFORM_FALLBACK: &str = "estimate.uniform_fallback";

    // Session
    pub const SESSION_LOADED: &str = "session.loaded";
    pub const SESSION_FRESH: &str = "session.fresh";
    pub const SESSION_DISCARDED: &str = "session.discarded";
    pub const SESSION_SAVED: &str = "session.saved";
    pub const SESSION_MACHINE_SELECTED: &str = "session.machine_selected";
}
