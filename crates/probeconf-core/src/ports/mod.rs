//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the engine expects from the host. They use
//! only domain types; implementations live in `probeconf-runtime`.

pub mod filesystem;
pub mod installer;
pub mod shell;
pub mod toolchain;

pub use filesystem::FileSystemProbe;
pub use installer::{InstallError, InstallPlan, InstallResult, Installer};
pub use shell::{ShellCommand, ShellError, ShellOutput, ShellResult, ShellRunner};
pub use toolchain::{
    CompileOutcome, RunOutcome, Toolchain, ToolchainDescription, ToolchainError, ToolchainResult,
};

#[cfg(test)]
pub use installer::MockInstaller;
