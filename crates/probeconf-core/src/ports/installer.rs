//! Installer port: download and build a package from source.

use crate::domain::{BuildVariables, DownloadRecipe};
use super::shell::ShellError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Could not download any of {urls:?}: {reason}")]
    Download { urls: Vec<String>, reason: String },

    #[error("Could not unpack {archive}: {reason}")]
    Extract { archive: PathBuf, reason: String },

    #[error("No directory starting with {prefix} found in {dir}")]
    SourceNotFound { prefix: String, dir: PathBuf },

    #[error("Build finished but {} is missing from {dir}", missing.join(", "))]
    LibrariesMissing { dir: PathBuf, missing: Vec<String> },

    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type InstallResult<T> = Result<T, InstallError>;

/// Everything needed to build one package from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub package: String,
    pub recipe: DownloadRecipe,
    /// Directory tarballs are unpacked into
    pub download_root: PathBuf,
    /// Toolchain settings; `prefix` is the install directory
    pub variables: BuildVariables,
}

impl InstallPlan {
    pub fn install_dir(&self) -> &std::path::Path {
        &self.variables.prefix
    }
}

/// Port for source installs.
#[cfg_attr(test, mockall::automock)]
pub trait Installer {
    /// Install the package and return its install directory.
    fn install(&self, plan: &InstallPlan) -> InstallResult<PathBuf>;
}
