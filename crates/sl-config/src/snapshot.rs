//! Catalog snapshots for diagnostics and reproducibility.
//!
//! A snapshot records exactly which catalog content an estimate was computed
//! against, so two runs can be compared by hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::MachineCatalog;
use crate::resolve::CatalogPath;

/// A frozen snapshot of the loaded catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the catalog.
    pub schema_version: String,

    /// SHA-256 hash of the catalog JSON content.
    pub catalog_hash: String,

    /// Path the catalog was loaded from (absent for the built-in catalog).
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Source of the catalog.
    pub catalog_source: String,

    pub machine_count: usize,

    pub event_count: usize,
}

impl CatalogSnapshot {
    /// Create a snapshot from a loaded catalog and its raw content.
    pub fn new(catalog: &MachineCatalog, resolved: &CatalogPath, content: &str) -> Self {
        CatalogSnapshot {
            timestamp: Utc::now(),
            schema_version: catalog.schema_version.clone(),
            catalog_hash: hash_content(content),
            catalog_path: resolved.path.as_ref().map(|p| p.display().to_string()),
            catalog_source: resolved.source.to_string(),
            machine_count: catalog.machines.len(),
            event_count: catalog.machines.iter().map(|m| m.events.len()).sum(),
        }
    }

    /// Whether two snapshots were taken over identical catalog content.
    pub fn matches(&self, other: &CatalogSnapshot) -> bool {
        self.catalog_hash == other.catalog_hash
    }

    /// First 12 hex chars of the content hash.
    pub fn short_id(&self) -> &str {
        let end = self.catalog_hash.len().min(12);
        &self.catalog_hash[..end]
    }
}

/// Hash content with SHA-256 and return hex string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BUILTIN_CATALOG_JSON;

    fn builtin_snapshot() -> CatalogSnapshot {
        let catalog = MachineCatalog::builtin().unwrap();
        CatalogSnapshot::new(&catalog, &CatalogPath::default(), BUILTIN_CATALOG_JSON)
    }

    #[test]
    fn test_builtin_snapshot() {
        let snapshot = builtin_snapshot();
        assert_eq!(snapshot.schema_version, crate::CATALOG_SCHEMA_VERSION);
        assert!(snapshot.catalog_path.is_none());
        assert_eq!(snapshot.catalog_source, "builtin default");
        assert_eq!(snapshot.machine_count, 3);
        assert!(snapshot.event_count >= 5);
    }

    #[test]
    fn test_snapshot_short_id() {
        assert_eq!(builtin_snapshot().short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_matches() {
        assert!(builtin_snapshot().matches(&builtin_snapshot()));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_content("test2"));
    }
}
