//! The installation chosen for a dependency.

use super::candidate::Candidate;
use super::library::{IncludeGroup, LibraryGroup};
use super::probe_result::ResolvedInstall;
use super::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The single working configuration chosen for one dependency.
///
/// Built once after probing and feature detection; the output writer only
/// reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    candidate: Candidate,
    resolved: ResolvedInstall,
    defines: BTreeMap<String, String>,
    executables: BTreeMap<String, PathBuf>,
}

impl Selection {
    pub const fn new(
        candidate: Candidate,
        resolved: ResolvedInstall,
        defines: BTreeMap<String, String>,
        executables: BTreeMap<String, PathBuf>,
    ) -> Self {
        Self {
            candidate,
            resolved,
            defines,
            executables,
        }
    }

    pub const fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub const fn libraries(&self) -> &LibraryGroup {
        &self.resolved.libraries
    }

    pub const fn includes(&self) -> &IncludeGroup {
        &self.resolved.includes
    }

    pub const fn version(&self) -> Option<&Version> {
        self.resolved.version.as_ref()
    }

    pub const fn is_shared(&self) -> bool {
        self.resolved.shared
    }

    /// Feature defines detected on the selected installation.
    pub const fn defines(&self) -> &BTreeMap<String, String> {
        &self.defines
    }

    /// Executables located next to the installation, keyed by substitution name.
    pub const fn executables(&self) -> &BTreeMap<String, PathBuf> {
        &self.executables
    }

    pub fn executable(&self, substitution: &str) -> Option<&Path> {
        self.executables.get(substitution).map(PathBuf::as_path)
    }
}
