//! Process exit codes for the sl-core CLI.
//!
//! Scripts can branch on these without parsing stdout. Codes below 20 mean
//! the invocation or its inputs need fixing; 20 and up mean sl-core itself
//! (or the filesystem under it) failed.

use sl_common::{Error, ErrorCategory};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Clean = 0,

    /// Bad flag value, unknown machine or event, or a catalog that fails to load.
    ArgsError = 10,

    /// Catalog written for a different schema version.
    VersionError = 13,

    /// Session command with no machine selected, or an unreadable stored session.
    SessionError = 15,

    /// Estimator invariant broken.
    InternalError = 20,

    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Failures of sl-core rather than of its input.
    pub fn is_internal_error(self) -> bool {
        self.as_i32() >= 20
    }

    /// Stable name reported next to the numeric code in JSON errors.
    pub fn code_name(self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::VersionError => "ERR_VERSION",
            ExitCode::SessionError => "ERR_SESSION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for a library error.
    pub fn for_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ArgsError,
            ErrorCategory::Estimation => ExitCode::InternalError,
            ErrorCategory::Session => ExitCode::SessionError,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }

    /// Exit code for a catalog loading failure.
    pub fn for_config_error(err: &ConfigError) -> Self {
        match err {
            ConfigError::VersionMismatch { .. } => ExitCode::VersionError,
            ConfigError::IoError { .. } => ExitCode::IoError,
            ConfigError::NotFound { .. }
            | ConfigError::ParseError { .. }
            | ConfigError::ValidationError(_) => ExitCode::ArgsError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_consistent() {
        assert!(ExitCode::Clean.is_success());
        assert!(!ExitCode::ArgsError.is_success());
        assert!(!ExitCode::SessionError.is_internal_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::VersionError.is_internal_error());
    }

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(ExitCode::SessionError.to_string(), "ERR_SESSION (15)");
    }

    #[test]
    fn maps_error_categories() {
        assert_eq!(
            ExitCode::for_error(&Error::NoMachineSelected),
            ExitCode::SessionError
        );
        assert_eq!(
            ExitCode::for_error(&Error::UnknownMachine {
                machine_id: "x".into()
            }),
            ExitCode::ArgsError
        );
        assert_eq!(
            ExitCode::for_error(&Error::Estimation("x".into())),
            ExitCode::InternalError
        );
    }

    #[test]
    fn maps_config_errors() {
        let version = ConfigError::VersionMismatch {
            expected: "1.0.0".into(),
            actual: "2.0.0".into(),
        };
        assert_eq!(ExitCode::for_config_error(&version), ExitCode::VersionError);

        let missing = ConfigError::NotFound {
            path: std::path::PathBuf::from("/nope"),
        };
        assert_eq!(ExitCode::for_config_error(&missing), ExitCode::ArgsError);
    }
}
