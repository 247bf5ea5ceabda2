//! Outcome of probing a single candidate.

use super::candidate::Candidate;
use super::library::{IncludeGroup, LibraryGroup};
use super::program::Language;
use super::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a candidate did not work.
///
/// When a candidate has several library groups the probe keeps the failure
/// from the furthest stage it reached, which is the most useful one to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// The candidate listed no library groups at all
    NoLibraries,
    /// A required symbol did not link against the group
    MissingSymbol { symbol: String, libraries: String },
    /// A required header was not found on any include group
    MissingHeader { headers: String, libraries: String },
    /// Libraries and headers were found but a full program did not link
    LinkTestFailed { language: Language, libraries: String },
    /// A package this one builds on was not configured
    DependencyMissing { dependency: String },
}

impl ProbeFailure {
    /// Stage reached before failing; higher is further.
    pub(crate) const fn stage(&self) -> u8 {
        match self {
            Self::NoLibraries | Self::DependencyMissing { .. } => 0,
            Self::MissingSymbol { .. } => 1,
            Self::MissingHeader { .. } => 2,
            Self::LinkTestFailed { .. } => 3,
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLibraries => write!(f, "no libraries to try"),
            Self::MissingSymbol { symbol, libraries } => {
                write!(f, "symbol {symbol} not found in {libraries}")
            }
            Self::MissingHeader { headers, libraries } => {
                write!(f, "{headers} not found for {libraries}")
            }
            Self::LinkTestFailed {
                language,
                libraries,
            } => write!(f, "cannot link a {language} program with {libraries}"),
            Self::DependencyMissing { dependency } => {
                write!(f, "required package {dependency} is not available")
            }
        }
    }
}

/// The library/include pair that passed every probe stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInstall {
    pub libraries: LibraryGroup,
    pub includes: IncludeGroup,
    pub version: Option<Version>,
    pub shared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    Success(ResolvedInstall),
    Failure(ProbeFailure),
}

/// Result of one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    candidate: Candidate,
    outcome: ProbeOutcome,
}

impl ProbeResult {
    pub const fn success(candidate: Candidate, resolved: ResolvedInstall) -> Self {
        Self {
            candidate,
            outcome: ProbeOutcome::Success(resolved),
        }
    }

    pub const fn failure(candidate: Candidate, failure: ProbeFailure) -> Self {
        Self {
            candidate,
            outcome: ProbeOutcome::Failure(failure),
        }
    }

    pub const fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub const fn outcome(&self) -> &ProbeOutcome {
        &self.outcome
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success(_))
    }

    pub const fn resolved(&self) -> Option<&ResolvedInstall> {
        match &self.outcome {
            ProbeOutcome::Success(resolved) => Some(resolved),
            ProbeOutcome::Failure(_) => None,
        }
    }

    pub const fn failure_reason(&self) -> Option<&ProbeFailure> {
        match &self.outcome {
            ProbeOutcome::Success(_) => None,
            ProbeOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn version(&self) -> Option<&Version> {
        self.resolved().and_then(|r| r.version.as_ref())
    }

    pub fn into_parts(self) -> (Candidate, ProbeOutcome) {
        (self.candidate, self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::Tier;

    #[test]
    fn test_failure_stage_ordering() {
        let symbol = ProbeFailure::MissingSymbol {
            symbol: "MPI_Init".into(),
            libraries: "[mpi]".into(),
        };
        let header = ProbeFailure::MissingHeader {
            headers: "mpi.h".into(),
            libraries: "[mpi]".into(),
        };
        assert!(header.stage() > symbol.stage());
    }

    #[test]
    fn test_accessors() {
        let candidate = Candidate::new("Default compiler locations", Tier::WellKnown, vec![], vec![]);
        let result = ProbeResult::failure(candidate, ProbeFailure::NoLibraries);
        assert!(!result.is_success());
        assert!(result.version().is_none());
        assert_eq!(result.failure_reason(), Some(&ProbeFailure::NoLibraries));
    }
}
