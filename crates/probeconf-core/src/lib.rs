//! Locating external libraries for a build.
//!
//! For each dependency a [`CandidateGenerator`] yields possible
//! installations in priority order, a [`Prober`] checks each one by
//! compiling and linking tiny programs, and a [`Selector`] picks the
//! winner. The [`Configurator`] runs this for every package and writes
//! the results into a [`SubstitutionSink`].
//!
//! Compilers, the filesystem, the shell and the source installer are
//! reached only through the traits in [`ports`].

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod engine;
pub mod error;
pub mod flags;
pub mod options;
pub mod packages;
pub mod ports;
pub mod sink;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use domain::{
    Candidate, IncludeGroup, Language, LibraryEntry, LibraryGroup, PackageDescriptor,
    ProbeFailure, ProbeOutcome, ProbeResult, ResolvedInstall, Selection, TestProgram, Tier,
    UserIntent, Version,
};
pub use engine::{
    CandidateGenerator, ConfigureReport, Configurator, OutputWriter, PackageOutcome, Prober,
    SelectionPolicy, Selector, SelectorConfig, Verdict,
};
pub use error::{Attempt, Attempts, ConfigureError, ConfigureResult};
pub use flags::{FlagContext, FlagScope};
pub use options::{
    CompilerOptions, ConfigureOptions, DownloadPolicy, OptionsError, OverridePolicy,
    PackageOptions,
};
pub use packages::builtin_packages;
pub use packages::fortran_stubs::StubStatus;
pub use ports::{
    CompileOutcome, FileSystemProbe, InstallError, InstallPlan, InstallResult, Installer,
    RunOutcome, ShellCommand, ShellError, ShellOutput, ShellResult, ShellRunner, Toolchain,
    ToolchainDescription, ToolchainError, ToolchainResult,
};
pub use sink::{Substitution, SubstitutionSink, SubstitutionValue};
