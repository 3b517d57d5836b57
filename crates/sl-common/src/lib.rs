//! Slotlight common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Setting and session identity types
//! - Schema versioning for emitted payloads
//! - Common error types with stable codes
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use id::{SessionId, SettingId};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
