//! Candidate installations considered during dependency discovery.

use super::library::{IncludeGroup, LibraryGroup};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Priority tier a candidate was generated from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Explicit library list or download request from the user
    UserOverride,
    /// Installation root given by the user
    UserRoot,
    /// Package directories and project locations
    Environment,
    /// Compiler defaults and hard-coded filesystem locations
    WellKnown,
    /// Download and build from source
    Download,
}

impl Tier {
    pub const ALL: [Self; 5] = [
        Self::UserOverride,
        Self::UserRoot,
        Self::Environment,
        Self::WellKnown,
        Self::Download,
    ];

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::UserOverride => "user override",
            Self::UserRoot => "user root",
            Self::Environment => "environment",
            Self::WellKnown => "well-known location",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The option a user-intent candidate came from, kept for error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIntent {
    pub option: String,
    pub value: String,
}

/// One named combination of library and include groups.
///
/// Built by the generator and immutable afterwards. The probe tries each
/// library group against each include group, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    name: String,
    tier: Tier,
    libraries: Vec<LibraryGroup>,
    includes: Vec<IncludeGroup>,
    intent: Option<UserIntent>,
    install_dir: Option<PathBuf>,
}

impl Candidate {
    pub fn new(
        name: impl Into<String>,
        tier: Tier,
        libraries: Vec<LibraryGroup>,
        includes: Vec<IncludeGroup>,
    ) -> Self {
        Self {
            name: name.into(),
            tier,
            libraries,
            includes,
            intent: None,
            install_dir: None,
        }
    }

    /// Record the user option this candidate realises.
    #[must_use]
    pub fn with_intent(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        self.intent = Some(UserIntent {
            option: option.into(),
            value: value.into(),
        });
        self
    }

    /// Mark the candidate as requiring a source install into `dir` before probing.
    #[must_use]
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn tier(&self) -> Tier {
        self.tier
    }

    pub fn libraries(&self) -> &[LibraryGroup] {
        &self.libraries
    }

    pub fn includes(&self) -> &[IncludeGroup] {
        &self.includes
    }

    pub const fn intent(&self) -> Option<&UserIntent> {
        self.intent.as_ref()
    }

    pub fn install_dir(&self) -> Option<&Path> {
        self.install_dir.as_deref()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.tier)
    }
}
