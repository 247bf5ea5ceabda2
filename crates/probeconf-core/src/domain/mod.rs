//! Core domain types.
//!
//! These types describe candidates, probe outcomes and selections,
//! independent of any compiler, shell or filesystem.
//!
//! # Structure
//!
//! - `library` - Library and include groups and their link arguments
//! - `candidate` - Candidates and the tiers they are generated from
//! - `program` - Test programs handed to the toolchain
//! - `probe_result` - Outcome of probing one candidate
//! - `selection` - The installation chosen for a dependency
//! - `descriptor` - Per-dependency descriptors driving the engine
//! - `version` - Dotted version numbers

pub mod candidate;
pub mod descriptor;
pub mod library;
pub mod probe_result;
pub mod program;
pub mod selection;
mod version;

pub use candidate::{Candidate, Tier, UserIntent};
pub use descriptor::{
    BUILD_TIMEOUT, BuildFile, BuildStep, BuildVariables, CONFIGURE_TIMEOUT, ConfigureArg,
    DownloadRecipe, ExecutableSearch, FeatureCheck, LibraryTemplate, PackageDescriptor,
    Placeholder, RootVariant, lib,
};
pub use library::{IncludeGroup, LibraryEntry, LibraryGroup};
pub use probe_result::{ProbeFailure, ProbeOutcome, ProbeResult, ResolvedInstall};
pub use program::{Language, TestProgram};
pub use selection::Selection;
pub use version::Version;
