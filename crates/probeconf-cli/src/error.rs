//! CLI-specific error types and mappings.
//!
//! Maps [`ConfigureError`] to exit codes and user-facing messages.

use probeconf_core::{ConfigureError, OptionsError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configure run failed for a reason not covered below.
    #[error("{0}")]
    Core(String),

    /// Invalid or conflicting options.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// A required package has no usable installation.
    #[error("{0}")]
    Unavailable(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Compiler or shell could not be run.
    #[error("Process error: {0}")]
    Process(String),

    /// Download or source build failed.
    #[error("{0}")]
    Install(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,   // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Process(_) => 71,    // EX_OSERR
            Self::Io(_) => 74,         // EX_IOERR
            Self::Install(_) => 75,    // EX_TEMPFAIL
            Self::Config(_) => 78,     // EX_CONFIG
        }
    }
}

impl From<ConfigureError> for CliError {
    fn from(err: ConfigureError) -> Self {
        let message = err.to_string();
        match err {
            ConfigureError::ConflictingOptions { .. }
            | ConfigureError::UnknownPackage(_)
            | ConfigureError::DownloadUnavailable(_)
            | ConfigureError::DownloadLocationUnknown(_)
            | ConfigureError::Options(_) => Self::Arguments(message),
            ConfigureError::OverrideUnusable { .. }
            | ConfigureError::NotFound { .. }
            | ConfigureError::SharedLibraryRequired { .. }
            | ConfigureError::MissingStubGenerator(_) => Self::Unavailable(message),
            ConfigureError::InvalidPackageDirectory(_) | ConfigureError::InvalidPattern { .. } => {
                Self::Config(message)
            }
            ConfigureError::Toolchain(_) | ConfigureError::Shell(_) => Self::Process(message),
            ConfigureError::Install { .. } => Self::Install(message),
            ConfigureError::Filesystem { .. } => Self::Io(message),
        }
    }
}

impl From<OptionsError> for CliError {
    fn from(err: OptionsError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error returned from a handler.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CliError>())
        .map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use probeconf_core::Attempts;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_is_unavailable() {
        let err = CliError::from(ConfigureError::NotFound {
            package: "MPI".into(),
            key: "mpi".into(),
            attempts: Attempts::default(),
        });
        assert_eq!(err.exit_code(), 69);
        assert!(err.to_string().contains("--download-mpi"));
    }

    #[test]
    fn test_option_errors_are_usage_errors() {
        let err = CliError::from(ConfigureError::ConflictingOptions {
            package: "mpi".into(),
            first: "with-mpi-lib".into(),
            second: "download-mpi".into(),
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            CliError::from(ConfigureError::InvalidPackageDirectory(PathBuf::from("/x"))).exit_code(),
            78
        );
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::from(CliError::Io("disk full".into())).context("Writing probeconf.mk");
        assert_eq!(exit_code_for(&err), 74);

        let plain: anyhow::Result<()> = Err(anyhow::anyhow!("boom")).context("outer");
        assert_eq!(exit_code_for(&plain.unwrap_err()), 1);
    }
}
