//! Catalog loading for sl-core.
//!
//! This module handles:
//! - Resolving the catalog path (CLI > env > XDG > system > built-in)
//! - Parsing and semantic validation
//! - Snapshot generation for diagnostics

pub use sl_config::catalog;
pub use sl_config::validate::ValidationError;
pub use sl_config::{
    CatalogPath, CatalogSnapshot, CatalogSource, EventDefinition, MachineCatalog,
    MachineDefinition,
};

use sl_config::catalog::BUILTIN_CATALOG_JSON;
use sl_config::{resolve_catalog_path, validate_catalog, CATALOG_SCHEMA_VERSION};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::{event_names, Stage};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Catalog file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in catalog file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl From<ConfigError> for sl_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::IoError { source, .. } => sl_common::Error::Io(source),
            ConfigError::ValidationError(inner) => inner.into(),
            other => sl_common::Error::InvalidCatalog(other.to_string()),
        }
    }
}

/// A loaded, validated catalog plus where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedCatalog {
    pub catalog: MachineCatalog,
    pub resolved: CatalogPath,
    pub snapshot: CatalogSnapshot,
}

impl ResolvedCatalog {
    /// Look up a machine, mapping a miss to a library error.
    pub fn machine(&self, id: &str) -> Result<&MachineDefinition, sl_common::Error> {
        self.catalog
            .machine(id)
            .ok_or_else(|| sl_common::Error::UnknownMachine {
                machine_id: id.to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit catalog path (from `--catalog`).
    pub catalog_path: Option<PathBuf>,
    /// Skip semantic validation (used by `check` to report all issues itself).
    pub skip_validation: bool,
}

/// Resolve, parse, and validate the catalog.
pub fn load_catalog(options: &ConfigOptions) -> Result<ResolvedCatalog, ConfigError> {
    let resolved = resolve_catalog_path(options.catalog_path.as_deref());

    let content = match &resolved.path {
        Some(path) => read_catalog(path)?,
        None => {
            tracing::debug!(
                event = event_names::CATALOG_BUILTIN_USED,
                stage = %Stage::Catalog,
                "using built-in catalog"
            );
            BUILTIN_CATALOG_JSON.to_string()
        }
    };

    let catalog: MachineCatalog =
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: resolved
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from("<builtin>")),
            source,
        })?;

    if catalog.schema_version != CATALOG_SCHEMA_VERSION {
        return Err(ConfigError::VersionMismatch {
            expected: CATALOG_SCHEMA_VERSION.to_string(),
            actual: catalog.schema_version.clone(),
        });
    }

    if !options.skip_validation {
        validate_catalog(&catalog).inspect_err(|e| {
            tracing::warn!(
                event = event_names::CATALOG_INVALID,
                stage = %Stage::Catalog,
                error = %e,
                "catalog failed validation"
            );
        })?;
    }

    let snapshot = CatalogSnapshot::new(&catalog, &resolved, &content);
    tracing::debug!(
        event = event_names::CATALOG_LOADED,
        stage = %Stage::Catalog,
        source = %resolved.source,
        machines = catalog.machines.len(),
        hash = snapshot.short_id(),
        "catalog loaded"
    );

    Ok(ResolvedCatalog {
        catalog,
        resolved,
        snapshot,
    })
}

fn read_catalog(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::IoError {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_loads_when_nothing_configured() {
        // An explicit path bypasses env lookups, so point at the embedded data.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUILTIN_CATALOG_JSON.as_bytes()).unwrap();
        let loaded = load_catalog(&ConfigOptions {
            catalog_path: Some(file.path().to_path_buf()),
            skip_validation: false,
        })
        .unwrap();
        assert_eq!(loaded.resolved.source, CatalogSource::CliArgument);
        assert!(loaded.machine("my-juggler-5").is_ok());
        assert!(matches!(
            loaded.machine("nope"),
            Err(sl_common::Error::UnknownMachine { .. })
        ));
    }

    #[test]
    fn missing_cli_path_is_not_found() {
        let err = load_catalog(&ConfigOptions {
            catalog_path: Some(PathBuf::from("/nonexistent/slotlight/machines.json")),
            skip_validation: false,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn version_mismatch_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"schema_version":"9.9.9","machines":[]}"#)
            .unwrap();
        let err = load_catalog(&ConfigOptions {
            catalog_path: Some(file.path().to_path_buf()),
            skip_validation: false,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::VersionMismatch { .. }));
    }

    #[test]
    fn invalid_catalog_fails_unless_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"schema_version":"1.0.0","machines":[{"id":"m","name":"M","settings":[1],
                "events":[{"id":"e","name":"E","probabilities":[{"setting":1,"denominator":0.5}]}]}]}"#,
        )
        .unwrap();
        let path = file.path().to_path_buf();

        let err = load_catalog(&ConfigOptions {
            catalog_path: Some(path.clone()),
            skip_validation: false,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let loaded = load_catalog(&ConfigOptions {
            catalog_path: Some(path),
            skip_validation: true,
        })
        .unwrap();
        assert_eq!(loaded.catalog.machines.len(), 1);
    }
}
