//! Toolchain port: compile, link, preprocess and run tiny test programs.
//!
//! The engine only asks "does this program build under these flags". A
//! program that fails to compile is a normal outcome (`success == false`);
//! only a failure to run the compiler at all is an error.

use crate::domain::{BuildVariables, Language, TestProgram};
use crate::flags::FlagContext;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prepare probe workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("No {0} compiler configured")]
    MissingCompiler(Language),
}

pub type ToolchainResult<T> = Result<T, ToolchainError>;

/// Outcome of a compile, link or preprocess step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompileOutcome {
    pub success: bool,
    /// Command line and compiler output, for the configure log
    pub log: String,
}

impl CompileOutcome {
    pub fn passed(log: impl Into<String>) -> Self {
        Self {
            success: true,
            log: log.into(),
        }
    }

    pub fn failed(log: impl Into<String>) -> Self {
        Self {
            success: false,
            log: log.into(),
        }
    }
}

/// Outcome of building and running a test program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOutcome {
    pub compiled: bool,
    /// Exit status; `None` when the program was not run or was killed
    pub status: Option<i32>,
    pub stdout: String,
    pub log: String,
}

impl RunOutcome {
    pub const fn succeeded(&self) -> bool {
        self.compiled && matches!(self.status, Some(0))
    }
}

/// Compiler commands and archiver settings, used to drive source builds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolchainDescription {
    pub cc: String,
    pub cxx: Option<String>,
    pub fc: Option<String>,
    pub cflags: String,
    pub ar: String,
    pub arflags: String,
    pub ranlib: String,
}

impl ToolchainDescription {
    /// Template variables for a source build installing into `prefix`.
    pub fn build_variables(&self, prefix: &Path) -> BuildVariables {
        BuildVariables {
            prefix: prefix.to_path_buf(),
            source: PathBuf::new(),
            cc: self.cc.clone(),
            cxx: self.cxx.clone(),
            fc: self.fc.clone(),
            cflags: self.cflags.clone(),
            ar: self.ar.clone(),
            arflags: self.arflags.clone(),
            ranlib: self.ranlib.clone(),
        }
    }
}

/// Port for the host's compilers.
pub trait Toolchain {
    /// Whether a compiler for `language` is configured.
    fn has_language(&self, language: Language) -> bool;

    /// Fortran external name for `symbol` (`ddot` becomes `ddot_` with gfortran).
    fn mangle(&self, symbol: &str) -> String;

    /// Libraries needed to link Fortran objects from C.
    fn fortran_libs(&self) -> Vec<String>;

    /// Run the preprocessor over `source`.
    fn preprocess(&self, flags: &FlagContext, source: &str) -> ToolchainResult<CompileOutcome>;

    /// Compile and link `program` into an executable.
    fn compile_and_link(
        &self,
        flags: &FlagContext,
        program: &TestProgram,
    ) -> ToolchainResult<CompileOutcome>;

    /// Compile, link and execute `program`, capturing its output.
    fn run(&self, flags: &FlagContext, program: &TestProgram) -> ToolchainResult<RunOutcome>;

    /// Commands and settings for building packages from source.
    fn describe(&self) -> ToolchainDescription;
}
