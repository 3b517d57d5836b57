//! Slotlight machine catalog loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for machines.json
//! - Catalog resolution (CLI → env → XDG → system → built-in)
//! - Semantic validation of events and probability tables
//! - Catalog snapshots for diagnostics

pub mod catalog;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use catalog::{
    DenominatorBasis, EventDefinition, MachineCatalog, MachineDefinition, SettingProbability,
};
pub use resolve::{resolve_catalog_path, CatalogPath, CatalogSource};
pub use snapshot::CatalogSnapshot;
pub use validate::{validate_catalog, validate_catalog_all, ValidationError, ValidationResult};

/// Schema version for catalog files.
pub const CATALOG_SCHEMA_VERSION: &str = "1.0.0";
