//! Running the whole probe-and-select pipeline for every package.

use super::generator::CandidateGenerator;
use super::output::OutputWriter;
use super::probe::Prober;
use super::selector::{SelectionPolicy, Selector, SelectorConfig, Verdict};
use crate::domain::{
    Candidate, DownloadRecipe, PackageDescriptor, ProbeFailure, ProbeOutcome, ResolvedInstall,
    Selection, Tier,
};
use crate::error::{Attempt, Attempts, ConfigureError, ConfigureResult};
use crate::options::{ConfigureOptions, PackageOptions};
use crate::packages::fortran_stubs::{FortranStubs, StubStatus};
use crate::ports::{FileSystemProbe, InstallPlan, Installer, ShellRunner, Toolchain};
use crate::sink::SubstitutionSink;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happened to one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageOutcome {
    Found { selection: Box<Selection> },
    /// Optional package with no working installation
    NotFound { attempts: Attempts },
    Disabled,
    /// Declared only for its fixed substitutions
    Placeholder,
}

impl PackageOutcome {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Self::Found { selection } => Some(selection),
            _ => None,
        }
    }

    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Outcomes of a configure run, in package order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigureReport {
    packages: Vec<(String, PackageOutcome)>,
    stubs: Option<StubStatus>,
}

impl ConfigureReport {
    pub fn get(&self, key: &str) -> Option<&PackageOutcome> {
        self.packages
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageOutcome)> {
        self.packages
            .iter()
            .map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub const fn stubs(&self) -> Option<&StubStatus> {
        self.stubs.as_ref()
    }

    fn push(&mut self, key: &str, outcome: PackageOutcome) {
        self.packages.push((key.to_string(), outcome));
    }
}

/// Drives generation, probing, selection and output for each package.
pub struct Configurator<'a> {
    toolchain: &'a dyn Toolchain,
    fs: &'a dyn FileSystemProbe,
    shell: &'a dyn ShellRunner,
    installer: &'a dyn Installer,
    options: &'a ConfigureOptions,
}

impl<'a> Configurator<'a> {
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

    /// Configure `descriptors` in order, then the Fortran stubs.
    ///
    /// Options are validated before anything is probed. Packages listed
    /// after the packages they depend on see their selections.
    pub fn run(
        &self,
        descriptors: &[PackageDescriptor],
        sink: &mut SubstitutionSink,
    ) -> ConfigureResult<ConfigureReport> {
        self.options.validate(descriptors)?;

        let mut report = ConfigureReport::default();
        for descriptor in descriptors {
            let outcome = self.configure_package(descriptor, &report, sink)?;
            report.push(&descriptor.key, outcome);
        }

        let stubs = FortranStubs::new(self.toolchain, self.fs, self.shell, self.installer, self.options);
        report.stubs = Some(stubs.configure(sink)?);
        Ok(report)
    }

    /// Every candidate the generator yields for `descriptor`, without probing.
    pub fn candidates(&self, descriptor: &PackageDescriptor) -> ConfigureResult<Vec<Candidate>> {
        CandidateGenerator::new(descriptor, self.options, self.fs)
            .candidates()
            .collect()
    }

    pub fn configure_package(
        &self,
        descriptor: &PackageDescriptor,
        report: &ConfigureReport,
        sink: &mut SubstitutionSink,
    ) -> ConfigureResult<PackageOutcome> {
        let package = self.options.package_or_default(&descriptor.key);
        let writer = OutputWriter::new(descriptor);

        if descriptor.is_placeholder() {
            writer.write_placeholders(sink);
            return Ok(PackageOutcome::Placeholder);
        }
        if !package.enabled.unwrap_or(descriptor.enabled_by_default) {
            debug!(package = %descriptor.key, "Package disabled");
            writer.write_not_found(sink);
            return Ok(PackageOutcome::Disabled);
        }

        let mandatory = package
            .required
            .unwrap_or(package.enabled == Some(true) || descriptor.required_by_default);

        let mut prober = Prober::new(self.toolchain, descriptor, self.options.can_execute);
        for dependency in &descriptor.dependencies {
            if let Some(selection) = report.get(dependency).and_then(PackageOutcome::selection) {
                prober = prober.with_dependency(selection);
                continue;
            }
            let failure = ProbeFailure::DependencyMissing {
                dependency: dependency.clone(),
            };
            let attempts = Attempts(vec![Attempt::new(
                descriptor.display_name.clone(),
                Tier::Environment,
                failure.to_string(),
            )]);
            if mandatory {
                return Err(ConfigureError::NotFound {
                    package: descriptor.display_name.clone(),
                    key: descriptor.key.clone(),
                    attempts,
                });
            }
            warn!(package = %descriptor.key, dependency = %dependency, "Dependency not available");
            writer.write_not_found(sink);
            return Ok(PackageOutcome::NotFound { attempts });
        }

        info!(package = %descriptor.key, "Checking for {}", descriptor.display_name);
        let selector = Selector::new(SelectorConfig {
            policy: if self.options.alternatives {
                SelectionPolicy::BestOfAll
            } else {
                SelectionPolicy::FirstSuccess
            },
            require_shared: package.shared,
            override_policy: self.options.override_policy,
            mandatory,
        });
        let generator = CandidateGenerator::new(descriptor, self.options, self.fs);
        let mut flags = self.options.flags.clone();

        let verdict = selector.select(descriptor, generator.candidates(), |candidate| {
            if let Some(install_dir) = candidate.install_dir() {
                self.install(descriptor, install_dir)?;
            }
            prober.probe(&mut flags, candidate)
        })?;

        let (result, attempts) = match verdict {
            Verdict::Selected { result, attempts } => (result, attempts),
            Verdict::NotFound(attempts) => {
                info!(package = %descriptor.key, tried = attempts.len(), "No working installation, continuing without it");
                writer.write_not_found(sink);
                return Ok(PackageOutcome::NotFound { attempts });
            }
        };
        debug!(package = %descriptor.key, rejected = attempts.len(), "Selection made");

        let (candidate, outcome) = result.into_parts();
        let resolved = match outcome {
            ProbeOutcome::Success(resolved) => resolved,
            ProbeOutcome::Failure(_) => {
                writer.write_not_found(sink);
                return Ok(PackageOutcome::NotFound { attempts });
            }
        };
        let defines = prober.detect_features(&mut flags, &resolved)?;
        let executables = self.locate_executables(descriptor, &package, &resolved);
        let selection = Selection::new(candidate, resolved, defines, executables);

        info!(
            package = %descriptor.key,
            candidate = %selection.candidate(),
            libraries = %selection.libraries(),
            version = %selection.version().map_or_else(|| "unknown".to_string(), ToString::to_string),
            "Selected {}",
            descriptor.display_name
        );
        writer.write_selection(&selection, sink);
        Ok(PackageOutcome::Found {
            selection: Box::new(selection),
        })
    }

    fn install(&self, descriptor: &PackageDescriptor, install_dir: &Path) -> ConfigureResult<PathBuf> {
        let recipe = descriptor
            .download
            .as_ref()
            .ok_or_else(|| ConfigureError::DownloadUnavailable(descriptor.key.clone()))?;
        info!(package = %descriptor.key, dir = %install_dir.display(), "Installing from source");
        install_from_source(self.toolchain, self.installer, self.options, &descriptor.key, recipe, install_dir)
    }

    /// Look for the descriptor's executables next to the selected installation.
    fn locate_executables(
        &self,
        descriptor: &PackageDescriptor,
        package: &PackageOptions,
        resolved: &ResolvedInstall,
    ) -> BTreeMap<String, PathBuf> {
        let mut found = BTreeMap::new();
        for executable in &descriptor.executables {
            let mut search = Vec::new();
            let mut name = executable.name.clone();
            if let Some(requested) = self.options.executables.get(&executable.name) {
                if let Some(parent) = requested.parent().filter(|p| !p.as_os_str().is_empty()) {
                    search.push(parent.to_path_buf());
                }
                if let Some(file) = requested.file_name().and_then(|f| f.to_str()) {
                    name = file.to_string();
                }
            }
            if let Some(dir) = &package.dir {
                search.push(dir.join("bin"));
            }
            let install_dirs = resolved
                .includes
                .dirs()
                .iter()
                .cloned()
                .chain(resolved.libraries.directories());
            for dir in install_dirs {
                if let Some(parent) = dir.parent() {
                    search.push(parent.join("bin"));
                }
            }

            match self.fs.find_executable(&name, &search) {
                Some(path) => {
                    debug!(program = %name, path = %path.display(), "Located executable");
                    found.insert(executable.substitution.clone(), path);
                }
                None => warn!(package = %descriptor.key, program = %name, "Could not locate executable"),
            }
        }
        found
    }
}

/// Build `recipe` into `install_dir` through the installer port.
pub(crate) fn install_from_source(
    toolchain: &dyn Toolchain,
    installer: &dyn Installer,
    options: &ConfigureOptions,
    key: &str,
    recipe: &DownloadRecipe,
    install_dir: &Path,
) -> ConfigureResult<PathBuf> {
    let download_root = options
        .download_root()
        .ok_or_else(|| ConfigureError::DownloadLocationUnknown(key.to_string()))?;
    let plan = InstallPlan {
        package: key.to_string(),
        recipe: recipe.clone(),
        download_root,
        variables: toolchain.describe().build_variables(install_dir),
    };
    installer
        .install(&plan)
        .map_err(|source| ConfigureError::Install {
            package: key.to_string(),
            source,
        })
}
