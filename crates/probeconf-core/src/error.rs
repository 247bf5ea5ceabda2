//! Errors raised by a configure run.

use crate::domain::{ProbeResult, Tier};
use crate::options::OptionsError;
use crate::ports::{InstallError, ShellError, ToolchainError};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One candidate that was tried and why it did not qualify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub candidate: String,
    pub tier: Tier,
    pub reason: String,
}

impl Attempt {
    pub fn new(candidate: impl Into<String>, tier: Tier, reason: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            tier,
            reason: reason.into(),
        }
    }

    /// Summarise a failed probe.
    pub fn from_result(result: &ProbeResult) -> Self {
        let reason = result
            .failure_reason()
            .map_or_else(|| "working".to_string(), ToString::to_string);
        Self::new(result.candidate().name(), result.candidate().tier(), reason)
    }
}

/// Every candidate tried for one package, in the order they were probed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attempts(pub Vec<Attempt>);

impl Attempts {
    pub fn push(&mut self, attempt: Attempt) {
        self.0.push(attempt);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        self.0.iter()
    }
}

impl fmt::Display for Attempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "  (no candidates)");
        }
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "  {}: {} [{}]",
                attempt.candidate, attempt.reason, attempt.tier
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("Conflicting options for {package}: --{first} and --{second} cannot be used together")]
    ConflictingOptions {
        package: String,
        first: String,
        second: String,
    },

    #[error("You set --{option}={value}, but it cannot be used for {package}:\n{attempts}")]
    OverrideUnusable {
        package: String,
        option: String,
        value: String,
        attempts: Attempts,
    },

    #[error(
        "Could not find a working {package}. Tried:\n{attempts}\n\
         Use --with-{key}-dir=<root> to name an installation, \
         --download-{key} to build it from source, or --with-{key}=0 to configure without it"
    )]
    NotFound {
        package: String,
        key: String,
        attempts: Attempts,
    },

    #[error("{package} requires shared libraries, but only static installations were found:\n{attempts}")]
    SharedLibraryRequired { package: String, attempts: Attempts },

    #[error("Invalid package directory: {0} is not a directory")]
    InvalidPackageDirectory(PathBuf),

    #[error("Invalid directory pattern for {package}: {reason}")]
    InvalidPattern { package: String, reason: String },

    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    #[error("{0} cannot be built from source")]
    DownloadUnavailable(String),

    #[error("Cannot download {0} without a project directory (--project-dir)")]
    DownloadLocationUnknown(String),

    #[error(
        "Fortran stubs are missing in {0} and bfort could not be found or installed. \
         Use --with-fc=0 to configure without Fortran"
    )]
    MissingStubGenerator(PathBuf),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("Toolchain failure: {0}")]
    Toolchain(#[from] ToolchainError),

    #[error("Shell command failed: {0}")]
    Shell(#[from] ShellError),

    #[error("Installing {package} from source failed: {source}")]
    Install {
        package: String,
        #[source]
        source: InstallError,
    },

    #[error("Could not list {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigureResult<T> = Result<T, ConfigureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_every_attempt() {
        let attempts = Attempts(vec![
            Attempt::new("User specified installation root", Tier::UserRoot, "symbol MPI_Init not found in [mpich]"),
            Attempt::new("Default compiler locations", Tier::WellKnown, "mpi.h not found for [mpi]"),
        ]);
        let err = ConfigureError::NotFound {
            package: "MPI".into(),
            key: "mpi".into(),
            attempts,
        };
        let message = err.to_string();
        assert!(message.contains("Could not find a working MPI"));
        assert!(message.contains("User specified installation root"));
        assert!(message.contains("Default compiler locations"));
        assert!(message.contains("--download-mpi"));
    }

    #[test]
    fn test_empty_attempts_display() {
        assert_eq!(Attempts::default().to_string(), "  (no candidates)");
    }
}
