//! Toolchain adapter driving the host's C, C++ and Fortran compilers.
//!
//! Every probe builds in a fresh scratch directory that is removed when the
//! probe finishes.

use crate::process::{BlockingRuntime, ProcessError, exit_code};
use probeconf_core::domain::{Language, TestProgram};
use probeconf_core::flags::FlagContext;
use probeconf_core::options::CompilerOptions;
use probeconf_core::ports::{
    CompileOutcome, RunOutcome, Toolchain, ToolchainDescription, ToolchainError, ToolchainResult,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

/// Timeout for a single compiler invocation or test binary.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(120);

const CC_DEFAULTS: &[&str] = &["cc", "gcc", "clang"];
const CXX_DEFAULTS: &[&str] = &["c++", "g++", "clang++"];
const FC_DEFAULTS: &[&str] = &["gfortran", "f77", "ifort"];

/// How the Fortran compiler names external symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FortranMangling {
    /// `ddot` becomes `ddot_`
    #[default]
    Underscore,
    /// `ddot` stays `ddot`
    Lowercase,
    /// `ddot` becomes `DDOT`
    Uppercase,
}

impl FortranMangling {
    const ALL: [Self; 3] = [Self::Underscore, Self::Lowercase, Self::Uppercase];

    pub fn apply(self, symbol: &str) -> String {
        match self {
            Self::Underscore => format!("{}_", symbol.to_lowercase()),
            Self::Lowercase => symbol.to_lowercase(),
            Self::Uppercase => symbol.to_uppercase(),
        }
    }
}

/// Compilers found on the host.
#[derive(Debug)]
pub struct CcToolchain {
    cc: String,
    cxx: Option<String>,
    fc: Option<String>,
    cflags: String,
    ar: String,
    arflags: String,
    ranlib: String,
    mangling: FortranMangling,
    fortran_libs: Vec<String>,
    timeout: Duration,
    runtime: BlockingRuntime,
}

/// Resolve one compiler: `0` disables it, a name is used as-is, otherwise
/// the first default found on `PATH`.
fn resolve_compiler(requested: Option<&str>, defaults: &[&str]) -> Option<String> {
    match requested {
        Some("0") => None,
        Some(name) if !name.trim().is_empty() => Some(name.to_string()),
        _ => defaults
            .iter()
            .find(|name| which::which(name).is_ok())
            .map(ToString::to_string),
    }
}

fn default_fortran_libs(fc: &str) -> Vec<String> {
    let name = Path::new(fc.split_whitespace().next().unwrap_or(fc))
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(fc);
    if name.contains("gfortran") {
        vec!["-lgfortran".to_string()]
    } else if name.starts_with("ifort") || name.starts_with("ifx") {
        vec!["-lifcore".to_string()]
    } else {
        Vec::new()
    }
}

impl CcToolchain {
    /// Find compilers for `compilers`, falling back to the usual names on `PATH`.
    pub fn detect(compilers: &CompilerOptions) -> ToolchainResult<Self> {
        let cc = resolve_compiler(compilers.cc.as_deref(), CC_DEFAULTS)
            .ok_or(ToolchainError::MissingCompiler(Language::C))?;
        let cxx = resolve_compiler(compilers.cxx.as_deref(), CXX_DEFAULTS);
        let fc = resolve_compiler(compilers.fc.as_deref(), FC_DEFAULTS);
        debug!(cc = %cc, cxx = ?cxx, fc = ?fc, "Compilers resolved");

        let mut toolchain = Self::with_compilers(cc, cxx, fc)?;
        if toolchain.fc.is_some() {
            toolchain.mangling = toolchain.detect_mangling()?;
            debug!(mangling = ?toolchain.mangling, "Fortran name mangling");
        }
        Ok(toolchain)
    }

    /// Use exactly these compilers, without probing the host.
    pub fn with_compilers(cc: String, cxx: Option<String>, fc: Option<String>) -> ToolchainResult<Self> {
        let fortran_libs = fc.as_deref().map(default_fortran_libs).unwrap_or_default();
        Ok(Self {
            cc,
            cxx,
            fc,
            cflags: String::new(),
            ar: "ar".to_string(),
            arflags: "cr".to_string(),
            ranlib: "ranlib".to_string(),
            mangling: FortranMangling::default(),
            fortran_libs,
            timeout: PROBE_TIMEOUT,
            runtime: BlockingRuntime::new().map_err(ToolchainError::Workspace)?,
        })
    }

    /// Flags used when building packages from source.
    #[must_use]
    pub fn with_cflags(mut self, cflags: impl Into<String>) -> Self {
        self.cflags = cflags.into();
        self
    }

    #[must_use]
    pub fn with_fortran_libs(mut self, libs: Vec<String>) -> Self {
        self.fortran_libs = libs;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn compiler(&self, language: Language) -> Option<&str> {
        match language {
            Language::C => Some(self.cc.as_str()),
            Language::Cxx => self.cxx.as_deref(),
            Language::Fortran => self.fc.as_deref(),
        }
    }

    /// Run `tool` (which may carry its own arguments, like `gcc -m64`).
    fn invoke(&self, tool: &str, args: &[String], dir: &Path) -> ToolchainResult<CompileOutcome> {
        let mut words = tool.split_whitespace();
        let program = words.next().unwrap_or(tool);
        let mut command = Command::new(program);
        command.args(words).args(args).current_dir(dir);

        let line = format!("{tool} {}", args.join(" "));
        debug!(command = %line, "Invoking compiler");
        match self.runtime.output(command, self.timeout) {
            Ok(output) => {
                let log = format!(
                    "{line}\n{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                if output.status.success() {
                    Ok(CompileOutcome::passed(log))
                } else {
                    debug!(status = exit_code(&output), "Compiler reported failure");
                    Ok(CompileOutcome::failed(log))
                }
            }
            Err(ProcessError::Timeout(timeout)) => {
                warn!(command = %line, "Compiler timed out");
                Ok(CompileOutcome::failed(format!("{line}\ntimed out after {}s", timeout.as_secs())))
            }
            Err(ProcessError::Spawn(source)) => Err(ToolchainError::Spawn {
                tool: program.to_string(),
                source,
            }),
        }
    }

    /// Compile and link `program` inside `dir`, returning the executable path.
    fn build(
        &self,
        dir: &Path,
        flags: &FlagContext,
        program: &TestProgram,
    ) -> ToolchainResult<(CompileOutcome, PathBuf)> {
        let compiler = self
            .compiler(program.language)
            .ok_or(ToolchainError::MissingCompiler(program.language))?;
        let source = dir.join(format!("conftest.{}", program.language.source_extension()));
        fs::write(&source, program.source()).map_err(ToolchainError::Workspace)?;
        let executable = dir.join("conftest");

        let mut args = flags.compile_args();
        args.push(source.display().to_string());
        args.push("-o".to_string());
        args.push(executable.display().to_string());
        args.extend(flags.link_args());
        let outcome = self.invoke(compiler, &args, dir)?;
        Ok((outcome, executable))
    }

    /// Find which C name links against a Fortran subroutine.
    fn detect_mangling(&self) -> ToolchainResult<FortranMangling> {
        let Some(fc) = self.fc.as_deref() else {
            return Ok(FortranMangling::default());
        };
        let dir = scratch_dir()?;
        fs::write(dir.path().join("d1chk.F"), "      subroutine d1chk()\n      return\n      end\n")
            .map_err(ToolchainError::Workspace)?;
        let object = self.invoke(
            fc,
            &["-c".to_string(), "d1chk.F".to_string(), "-o".to_string(), "d1chk.o".to_string()],
            dir.path(),
        )?;
        if !object.success {
            warn!("Could not compile a Fortran object, assuming trailing underscore mangling");
            return Ok(FortranMangling::default());
        }

        for mangling in FortranMangling::ALL {
            let name = mangling.apply("d1chk");
            let main = format!("void {name}(void);\nint main() {{\n  {name}();\n  return 0;\n}}\n");
            fs::write(dir.path().join("mangle.c"), main).map_err(ToolchainError::Workspace)?;
            let mut args = vec![
                "mangle.c".to_string(),
                "d1chk.o".to_string(),
                "-o".to_string(),
                "mangle".to_string(),
            ];
            args.extend(self.fortran_libs.iter().cloned());
            if self.invoke(&self.cc, &args, dir.path())?.success {
                return Ok(mangling);
            }
        }
        warn!("No C name links against Fortran objects, assuming trailing underscore mangling");
        Ok(FortranMangling::default())
    }
}

fn scratch_dir() -> ToolchainResult<TempDir> {
    tempfile::Builder::new()
        .prefix("probeconf-")
        .tempdir()
        .map_err(ToolchainError::Workspace)
}

impl Toolchain for CcToolchain {
    fn has_language(&self, language: Language) -> bool {
        self.compiler(language).is_some()
    }

    fn mangle(&self, symbol: &str) -> String {
        self.mangling.apply(symbol)
    }

    fn fortran_libs(&self) -> Vec<String> {
        self.fortran_libs.clone()
    }

    fn preprocess(&self, flags: &FlagContext, source: &str) -> ToolchainResult<CompileOutcome> {
        let dir = scratch_dir()?;
        let file = dir.path().join("conftest.c");
        fs::write(&file, source).map_err(ToolchainError::Workspace)?;
        let mut args = vec!["-E".to_string()];
        args.extend(flags.cppflags.iter().cloned());
        args.push(file.display().to_string());
        self.invoke(&self.cc, &args, dir.path())
    }

    fn compile_and_link(
        &self,
        flags: &FlagContext,
        program: &TestProgram,
    ) -> ToolchainResult<CompileOutcome> {
        let dir = scratch_dir()?;
        let (outcome, _) = self.build(dir.path(), flags, program)?;
        Ok(outcome)
    }

    fn run(&self, flags: &FlagContext, program: &TestProgram) -> ToolchainResult<RunOutcome> {
        let dir = scratch_dir()?;
        let (built, executable) = self.build(dir.path(), flags, program)?;
        if !built.success {
            return Ok(RunOutcome {
                compiled: false,
                status: None,
                stdout: String::new(),
                log: built.log,
            });
        }

        let mut command = Command::new(&executable);
        command.current_dir(dir.path());
        match self.runtime.output(command, self.timeout) {
            Ok(output) => Ok(RunOutcome {
                compiled: true,
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                log: format!("{}\n{}", built.log, String::from_utf8_lossy(&output.stderr)),
            }),
            Err(ProcessError::Timeout(timeout)) => Ok(RunOutcome {
                compiled: true,
                status: None,
                stdout: String::new(),
                log: format!("{}\nprogram timed out after {}s", built.log, timeout.as_secs()),
            }),
            Err(ProcessError::Spawn(source)) => Err(ToolchainError::Spawn {
                tool: executable.display().to_string(),
                source,
            }),
        }
    }

    fn describe(&self) -> ToolchainDescription {
        ToolchainDescription {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangling_styles() {
        assert_eq!(FortranMangling::Underscore.apply("DDOT"), "ddot_");
        assert_eq!(FortranMangling::Lowercase.apply("ddot"), "ddot");
        assert_eq!(FortranMangling::Uppercase.apply("dtrtrs"), "DTRTRS");
    }

    #[test]
    fn test_zero_disables_compiler() {
        assert_eq!(resolve_compiler(Some("0"), CXX_DEFAULTS), None);
        assert_eq!(resolve_compiler(Some("mpicc -g"), CC_DEFAULTS).as_deref(), Some("mpicc -g"));
    }

    #[test]
    fn test_fortran_runtime_libraries() {
        assert_eq!(default_fortran_libs("/usr/bin/gfortran-12"), vec!["-lgfortran"]);
        assert_eq!(default_fortran_libs("ifort -O2"), vec!["-lifcore"]);
        assert!(default_fortran_libs("f77").is_empty());
    }

    #[test]
    fn test_missing_language_is_an_error() {
        let toolchain = CcToolchain::with_compilers("cc".to_string(), None, None).unwrap();
        let program = TestProgram::new(Language::Fortran, "", "      call foo()\n");
        let err = toolchain
            .compile_and_link(&FlagContext::default(), &program)
            .unwrap_err();
        assert!(matches!(err, ToolchainError::MissingCompiler(Language::Fortran)));
        assert!(!toolchain.has_language(Language::Cxx));
    }
}
