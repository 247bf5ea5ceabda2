//! In-memory fakes of the ports, for tests.
//!
//! - [`MemoryFileSystem`]: directories and files held in sets
//! - [`ScriptedToolchain`]: decides compile and link outcomes from a list of
//!   fake installations and records every invocation
//! - [`RecordingShell`]: returns scripted output and records every command

use crate::domain::{Language, TestProgram};
use crate::flags::FlagContext;
use crate::ports::{
    CompileOutcome, FileSystemProbe, RunOutcome, ShellCommand, ShellOutput, ShellResult,
    ShellRunner, Toolchain, ToolchainDescription, ToolchainResult,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem made of explicitly registered paths.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    dirs: BTreeSet<PathBuf>,
    files: BTreeSet<PathBuf>,
    on_path: BTreeMap<String, PathBuf>,
    listed: RefCell<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory and all of its ancestors.
    #[must_use]
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        for dir in path.as_ref().ancestors() {
            if !dir.as_os_str().is_empty() {
                self.dirs.insert(dir.to_path_buf());
            }
        }
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self = self.with_dir(parent);
        }
        self.files.insert(path.to_path_buf());
        self
    }

    /// Register a file that `find_executable` finds through `PATH`.
    #[must_use]
    pub fn with_on_path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.on_path.insert(name.to_string(), path.to_path_buf());
        }
        self.with_file(path)
    }

    /// Directories passed to `list_dir`, in call order.
    pub fn listed(&self) -> Vec<PathBuf> {
        self.listed.borrow().clone()
    }
}

impl FileSystemProbe for MemoryFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.listed.borrow_mut().push(path.to_path_buf());
        if !self.dirs.contains(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }
        let children: BTreeSet<PathBuf> = self
            .dirs
            .iter()
            .chain(&self.files)
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        Ok(children.into_iter().collect())
    }

    fn find_executable(&self, name: &str, extra_paths: &[PathBuf]) -> Option<PathBuf> {
        extra_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| self.files.contains(candidate))
            .or_else(|| self.on_path.get(name).cloned())
    }
}

/// An installation the [`ScriptedToolchain`] pretends exists.
#[derive(Debug, Clone, Default)]
pub struct FakeInstall {
    /// Link argument that selects this installation, such as `-L/opt/mpich/lib`
    pub marker: String,
    pub symbols: Vec<String>,
    /// Include directory holding the headers; `None` puts them on the
    /// default include path
    pub include_dir: Option<PathBuf>,
    /// Printed by the version program
    pub version: Option<String>,
    /// Programs mentioning one of these strings fail to link
    pub missing: Vec<String>,
    /// `sizeof` results keyed by type name
    pub sizes: BTreeMap<String, u32>,
    /// Programs calling `dladdr` see the package code in its own object
    pub shared: bool,
}

impl FakeInstall {
    pub fn new(marker: &str, symbols: &[&str]) -> Self {
        Self {
            marker: marker.to_string(),
            symbols: symbols.iter().map(ToString::to_string).collect(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_include(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    #[must_use]
    pub fn without(mut self, text: &str) -> Self {
        self.missing.push(text.to_string());
        self
    }

    #[must_use]
    pub fn with_size(mut self, type_name: &str, size: u32) -> Self {
        self.sizes.insert(type_name.to_string(), size);
        self
    }

    #[must_use]
    pub const fn with_shared(mut self) -> Self {
        self.shared = true;
        self
    }

    fn linked(&self, flags: &FlagContext) -> bool {
        flags.libs.iter().any(|arg| *arg == self.marker)
    }

    fn headers_visible(&self, flags: &FlagContext) -> bool {
        self.include_dir.as_ref().is_none_or(|dir| {
            let flag = format!("-I{}", dir.display());
            flags.cppflags.iter().any(|arg| *arg == flag)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Preprocess,
    Link,
    Run,
}

/// One recorded toolchain invocation.
#[derive(Debug, Clone)]
pub struct ToolchainCall {
    pub kind: CallKind,
    pub flags: FlagContext,
    pub source: String,
}

/// Toolchain whose outcomes follow from a list of [`FakeInstall`]s.
#[derive(Debug)]
pub struct ScriptedToolchain {
    installs: Vec<FakeInstall>,
    languages: Vec<Language>,
    fortran_libs: Vec<String>,
    calls: RefCell<Vec<ToolchainCall>>,
}

impl Default for ScriptedToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedToolchain {
    pub fn new() -> Self {
        Self {
            installs: Vec::new(),
            languages: vec![Language::C],
            fortran_libs: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_install(mut self, install: FakeInstall) -> Self {
        self.installs.push(install);
        self
    }

    #[must_use]
    pub fn with_languages(mut self, languages: &[Language]) -> Self {
        self.languages = languages.to_vec();
        self
    }

    #[must_use]
    pub fn with_fortran_libs(mut self, libs: &[&str]) -> Self {
        self.fortran_libs = libs.iter().map(ToString::to_string).collect();
        self
    }

    pub fn calls(&self) -> Vec<ToolchainCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls.borrow().iter().filter(|c| c.kind == kind).count()
    }

    fn record(&self, kind: CallKind, flags: &FlagContext, source: String) {
        self.calls.borrow_mut().push(ToolchainCall {
            kind,
            flags: flags.clone(),
            source,
        });
    }

    fn linking_install(&self, flags: &FlagContext, program: &TestProgram) -> Option<&FakeInstall> {
        let symbol = referenced_symbol(program);
        self.installs.iter().find(|install| {
            if !install.linked(flags) {
                return false;
            }
            match symbol {
                Some(symbol) => install.symbols.iter().any(|s| s == symbol),
                None => {
                    install.headers_visible(flags)
                        && !install
                            .missing
                            .iter()
                            .any(|text| program.body.contains(text.as_str()))
                }
            }
        })
    }
}

/// The symbol a program built by [`TestProgram::symbol_reference`] calls.
fn referenced_symbol(program: &TestProgram) -> Option<&str> {
    if !program.includes.contains("Override any gcc2 internal prototype") {
        return None;
    }
    program.body.trim().strip_suffix("();")
}

impl Toolchain for ScriptedToolchain {
    fn has_language(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    fn mangle(&self, symbol: &str) -> String {
        format!("{}_", symbol.to_lowercase())
    }

    fn fortran_libs(&self) -> Vec<String> {
        self.fortran_libs.clone()
    }

    fn preprocess(&self, flags: &FlagContext, source: &str) -> ToolchainResult<CompileOutcome> {
        self.record(CallKind::Preprocess, flags, source.to_string());
        let found = self
            .installs
            .iter()
            .any(|install| install.headers_visible(flags));
        Ok(if found {
            CompileOutcome::passed("")
        } else {
            CompileOutcome::failed("fatal error: header not found")
        })
    }

    fn compile_and_link(
        &self,
        flags: &FlagContext,
        program: &TestProgram,
    ) -> ToolchainResult<CompileOutcome> {
        self.record(CallKind::Link, flags, program.source());
        Ok(if self.linking_install(flags, program).is_some() {
            CompileOutcome::passed("")
        } else {
            CompileOutcome::failed("undefined reference")
        })
    }

    fn run(&self, flags: &FlagContext, program: &TestProgram) -> ToolchainResult<RunOutcome> {
        self.record(CallKind::Run, flags, program.source());
        let Some(install) = self.linking_install(flags, program) else {
            return Ok(RunOutcome::default());
        };
        if program.body.contains("dladdr") {
            return Ok(RunOutcome {
                compiled: true,
                status: Some(i32::from(!install.shared)),
                ..Default::default()
            });
        }
        let stdout = if program.body.contains("sizeof(") {
            install
                .sizes
                .iter()
                .find(|(name, _)| program.body.contains(&format!("sizeof({name})")))
                .map(|(_, size)| format!("{size}\n"))
        } else {
            install.version.as_ref().map(|v| format!("{v}\n"))
        };
        Ok(RunOutcome {
            compiled: true,
            status: Some(if stdout.is_some() { 0 } else { 1 }),
            stdout: stdout.unwrap_or_default(),
            log: String::new(),
        })
    }

    fn describe(&self) -> ToolchainDescription {
        ToolchainDescription {
            cc: "cc".to_string(),
            cxx: self.has_language(Language::Cxx).then(|| "c++".to_string()),
            fc: self.has_language(Language::Fortran).then(|| "gfortran".to_string()),
            cflags: "-O".to_string(),
            ar: "ar".to_string(),
            arflags: "cr".to_string(),
            ranlib: "ranlib".to_string(),
        }
    }
}

/// Shell that replays scripted outputs and records every command.
#[derive(Debug, Default)]
pub struct RecordingShell {
    responses: RefCell<VecDeque<ShellOutput>>,
    commands: RefCell<Vec<ShellCommand>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next command. Unscripted commands succeed
    /// with no output.
    #[must_use]
    pub fn respond(self, status: i32, stdout: &str) -> Self {
        self.responses.borrow_mut().push_back(ShellOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            status,
        });
        self
    }

    pub fn commands(&self) -> Vec<ShellCommand> {
        self.commands.borrow().clone()
    }
}

impl ShellRunner for RecordingShell {
    fn run(&self, command: &ShellCommand) -> ShellResult<ShellOutput> {
        self.commands.borrow_mut().push(command.clone());
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_file_system_listing() {
        let fs = MemoryFileSystem::new()
            .with_dir("/soft/mpich-1.2/lib")
            .with_file("/soft/README");
        let entries = fs.list_dir(Path::new("/soft")).unwrap();
        assert_eq!(
            entries,
            vec![PathBuf::from("/soft/README"), PathBuf::from("/soft/mpich-1.2")]
        );
        assert!(fs.list_dir(Path::new("/missing")).is_err());
        assert_eq!(fs.listed().len(), 2);
    }

    #[test]
    fn test_scripted_toolchain_links_only_known_symbols() {
        let toolchain = ScriptedToolchain::new()
            .with_install(FakeInstall::new("-lmpich", &["MPI_Init"]));
        let mut flags = FlagContext::default();
        let program = TestProgram::symbol_reference("MPI_Init");

        assert!(!toolchain.compile_and_link(&flags, &program).unwrap().success);
        flags.libs.push("-lmpich".into());
        assert!(toolchain.compile_and_link(&flags, &program).unwrap().success);
        let other = TestProgram::symbol_reference("MPI_Comm_create");
        assert!(!toolchain.compile_and_link(&flags, &other).unwrap().success);
        assert_eq!(toolchain.count(CallKind::Link), 3);
    }
}
