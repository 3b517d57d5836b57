//! Catalog resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → built-in.

use std::path::{Path, PathBuf};

/// Where the catalog was resolved from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPath {
    /// Path to machines.json (None means the built-in catalog).
    pub path: Option<PathBuf>,

    /// Source of the catalog (for diagnostics).
    pub source: CatalogSource,
}

/// Where a catalog file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/slotlight/.
    SystemConfig,

    /// Using the catalog embedded in the binary.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::CliArgument => write!(f, "CLI argument"),
            CatalogSource::Environment => write!(f, "environment variable"),
            CatalogSource::XdgConfig => write!(f, "XDG config"),
            CatalogSource::SystemConfig => write!(f, "system config"),
            CatalogSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CATALOG_PATH: &str = "SLOTLIGHT_CATALOG";
pub const ENV_CONFIG_DIR: &str = "SLOTLIGHT_CONFIG_DIR";

/// Standard catalog file name.
pub const CATALOG_FILENAME: &str = "machines.json";

/// Application name for XDG directories.
const APP_NAME: &str = "slotlight";

/// Resolve the catalog path using the standard resolution order.
///
/// 1. Explicit CLI path (returned even if missing so the load reports it)
/// 2. SLOTLIGHT_CATALOG
/// 3. SLOTLIGHT_CONFIG_DIR + machines.json
/// 4. XDG config directory (~/.config/slotlight/)
/// 5. System config (/etc/slotlight/)
/// 6. Built-in catalog (None)
pub fn resolve_catalog_path(cli_path: Option<&Path>) -> CatalogPath {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return CatalogPath {
            path: Some(path.to_path_buf()),
            source: CatalogSource::CliArgument,
        };
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_CATALOG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, CatalogSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CATALOG_FILENAME);
        if path.exists() {
            return found(path, CatalogSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CATALOG_FILENAME);
        if path.exists() {
            return found(path, CatalogSource::XdgConfig);
        }
    }

    // 5. System config
    let system_path = system_config_dir().join(CATALOG_FILENAME);
    if system_path.exists() {
        return found(system_path, CatalogSource::SystemConfig);
    }

    CatalogPath::default()
}

fn found(path: PathBuf, source: CatalogSource) -> CatalogPath {
    CatalogPath {
        path: Some(path),
        source,
    }
}

/// Get the XDG config directory for slotlight.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_source_display() {
        assert_eq!(format!("{}", CatalogSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", CatalogSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", CatalogSource::XdgConfig), "XDG config");
        assert_eq!(format!("{}", CatalogSource::SystemConfig), "system config");
        assert_eq!(
            format!("{}", CatalogSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn cli_path_wins_even_when_missing() {
        let resolved = resolve_catalog_path(Some(Path::new("/nonexistent/machines.json")));
        assert_eq!(resolved.source, CatalogSource::CliArgument);
        assert_eq!(
            resolved.path.as_deref(),
            Some(Path::new("/nonexistent/machines.json"))
        );
    }

    #[test]
    fn system_dir_is_under_etc() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/slotlight"));
    }
}
