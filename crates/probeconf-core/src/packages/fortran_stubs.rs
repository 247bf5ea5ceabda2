//! Generating the Fortran interface stubs with Sowing's `bfort`.
//!
//! Not a library search: when a Fortran compiler is configured and the
//! project's stubs have not been generated yet, `bfort` is located (or
//! built from source) and `make allfortranstubs` is run.

use crate::domain::{BuildStep, ConfigureArg, DownloadRecipe, Language};
use crate::engine::configurator::install_from_source;
use crate::error::{ConfigureError, ConfigureResult};
use crate::options::ConfigureOptions;
use crate::ports::{FileSystemProbe, Installer, ShellCommand, ShellRunner, Toolchain};
use crate::sink::SubstitutionSink;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout for `make allfortranstubs`.
pub const STUB_TIMEOUT: Duration = Duration::from_secs(15 * 60);

const STUB_MAKEFILE: &str = "src/fortran/auto/makefile.src";
const SOWING_KEY: &str = "sowing";

/// Routine progress lines printed by the stub build.
const PROGRESS_PREFIXES: &[&str] = &["fortranstubs in:", "Fixing pointers", "make["];

/// How to build Sowing, which provides `bfort`.
pub fn sowing_recipe() -> DownloadRecipe {
    DownloadRecipe {
        urls: vec![
            "https://ftp.mcs.anl.gov/pub/sowing/sowing.tar.gz".to_string(),
            "ftp://ftp.mcs.anl.gov/pub/sowing/sowing.tar.gz".to_string(),
        ],
        directory_prefix: SOWING_KEY.to_string(),
        libraries: Vec::new(),
        build_files: Vec::new(),
        configure: Some(vec![ConfigureArg::Always("--prefix={prefix}".to_string())]),
        build: vec![BuildStep::new("make"), BuildStep::new("make install")],
    }
}

/// Result of the stub step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StubStatus {
    /// No Fortran compiler configured
    NotNeeded,
    /// No project directory to generate stubs in
    Skipped,
    /// Stubs were already generated
    Present,
    Generated {
        bfort: PathBuf,
        /// Output lines that were not routine progress
        problems: Vec<String>,
    },
}

pub struct FortranStubs<'a> {
    toolchain: &'a dyn Toolchain,
    fs: &'a dyn FileSystemProbe,
    shell: &'a dyn ShellRunner,
    installer: &'a dyn Installer,
    options: &'a ConfigureOptions,
}

impl<'a> FortranStubs<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        fs: &'a dyn FileSystemProbe,
        shell: &'a dyn ShellRunner,
        installer: &'a dyn Installer,
        options: &'a ConfigureOptions,
    ) -> Self {
        Self {
            toolchain,
            fs,
            shell,
            installer,
            options,
        }
    }

    pub fn configure(&self, sink: &mut SubstitutionSink) -> ConfigureResult<StubStatus> {
        sink.add_described("BFORT", "bfort", "Fortran stub generator");

        if !self.toolchain.has_language(Language::Fortran) {
            return Ok(StubStatus::NotNeeded);
        }
        let Some(project) = self.options.project_dir.as_deref() else {
            debug!("No project directory, skipping Fortran stubs");
            return Ok(StubStatus::Skipped);
        };

        if self.fs.is_file(&project.join(STUB_MAKEFILE)) {
            debug!(dir = %project.join(STUB_MAKEFILE).display(), "Fortran stubs already generated");
            if let Some(bfort) = self.installed_bfort(project) {
                info!(bfort = %bfort.display(), "Using previously installed Sowing");
                sink.add_substitution("BFORT", bfort.display().to_string());
            }
            return Ok(StubStatus::Present);
        }

        let stub_dir = project.join("src/fortran/auto");
        warn!(dir = %stub_dir.display(), "Fortran stubs have not been generated");
        let bfort = match self.fs.find_executable("bfort", &[]) {
            Some(path) => path,
            None if self.options.bfort_if_needed => self.install_sowing()?,
            None => return Err(ConfigureError::MissingStubGenerator(stub_dir)),
        };
        sink.add_substitution("BFORT", bfort.display().to_string());

        let problems = self.generate(project, &bfort)?;
        Ok(StubStatus::Generated { bfort, problems })
    }

    /// `bfort` from an earlier Sowing build, if any.
    fn installed_bfort(&self, project: &Path) -> Option<PathBuf> {
        let arch = self.options.arch_name();
        let mut candidates: Vec<PathBuf> = self
            .fs
            .list_dir(project)
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| {
                entry
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(SOWING_KEY))
                    && self.fs.is_dir(entry)
            })
            .map(|entry| entry.join(arch).join("bin").join("bfort"))
            .collect();
        if let Some(dir) = self.options.install_dir(SOWING_KEY) {
            candidates.push(dir.join("bin").join("bfort"));
        }
        candidates.into_iter().find(|path| self.fs.is_file(path))
    }

    fn install_sowing(&self) -> ConfigureResult<PathBuf> {
        let install_dir = self
            .options
            .install_dir(SOWING_KEY)
            .ok_or_else(|| ConfigureError::DownloadLocationUnknown(SOWING_KEY.to_string()))?;
        info!(dir = %install_dir.display(), "bfort not found, building Sowing");
        let prefix = install_from_source(
            self.toolchain,
            self.installer,
            self.options,
            SOWING_KEY,
            &sowing_recipe(),
            &install_dir,
        )?;
        Ok(prefix.join("bin").join("bfort"))
    }

    fn generate(&self, project: &Path, bfort: &Path) -> ConfigureResult<Vec<String>> {
        let mut command = ShellCommand::new("make allfortranstubs", STUB_TIMEOUT)
            .in_dir(project)
            .env("PETSC_ARCH", self.options.arch_name());
        if let Some(dir) = bfort.parent() {
            command = command.prepend_path(dir);
        }
        info!(bfort = %bfort.display(), "Generating Fortran stubs");
        let output = self.shell.run(&command)?;

        let problems = filter_progress(&format!("{}\n{}", output.stdout, output.stderr));
        if problems.is_empty() {
            info!("Completed generating Fortran stubs");
        }
        for line in &problems {
            warn!(target: "fortranstubs", "{line}");
        }
        Ok(problems)
    }
}

fn filter_progress(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.contains("ACTION=")
                && !PROGRESS_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        })
        .map(ToString::to_string)
        .collect()
}
