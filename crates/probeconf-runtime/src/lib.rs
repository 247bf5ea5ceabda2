//! Host adapters for the probeconf ports.
//!
//! - [`CcToolchain`]: compiles, links and runs probe programs with the
//!   host's C, C++ and Fortran compilers
//! - [`HostFileSystem`]: the real filesystem and `PATH` lookup
//! - [`SystemShell`]: `sh -c` with timeouts
//! - [`SourceInstaller`]: downloads, unpacks and builds packages

#![deny(unused_crate_dependencies)]

pub mod filesystem;
pub mod installer;
pub mod process;
pub mod shell;
pub mod toolchain;

pub use filesystem::HostFileSystem;
pub use installer::SourceInstaller;
pub use shell::SystemShell;
pub use toolchain::{CcToolchain, FortranMangling, PROBE_TIMEOUT};
