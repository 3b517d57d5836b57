//! Schema versioning for JSON payloads emitted by the CLI.

/// Schema version stamped on every command payload.
pub const SCHEMA_VERSION: &str = "1.0.0";
