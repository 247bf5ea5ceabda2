//! Configuration option surface.
//!
//! Options come from a JSON file, environment variables and the command
//! line. The command line uses the traditional configure spelling:
//!
//! - `--with-<pkg>=<bool>` enables or disables a package
//! - `--with-<pkg>-dir=<root>`, `--with-<pkg>-include=<dir>`,
//!   `--with-<pkg>-lib=<lib>[,<lib>...]`, `--with-<pkg>-shared=<bool>`,
//!   `--with-<pkg>-required=<bool>`
//! - `--download-<pkg>[=yes|no|if-needed]`
//! - `--with-<program>=<path>` names an executable such as `mpirun`
//! - `--with-cc`, `--with-cxx`, `--with-fc` name compilers; `0` disables one
//! - `--with-alternatives`, `--with-bfort-if-needed`, `--package-dirs`,
//!   `--project-dir`, `--arch`, `--can-execute`, `--override-policy`

use crate::domain::{Language, PackageDescriptor};
use crate::error::{ConfigureError, ConfigureResult};
use crate::flags::FlagContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading configure-style arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Unrecognized option: {0}")]
    UnknownOption(String),

    #[error("Invalid value {value:?} for --{option}: expected {expected}")]
    InvalidValue {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("Option --{0} requires a value")]
    MissingValue(String),
}

/// Whether to build a package from source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadPolicy {
    #[default]
    Never,
    /// Only when nothing else works
    IfNeeded,
    /// Instead of searching the system
    Always,
}

impl DownloadPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "if-needed" | "ifneeded" => Some(Self::IfNeeded),
            other => parse_bool(other).map(|yes| if yes { Self::Always } else { Self::Never }),
        }
    }
}

/// What happens when an installation named by the user does not work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverridePolicy {
    /// Abort with an error naming the option
    #[default]
    FailFast,
    /// Log the failure and continue with automatic discovery
    FallThrough,
}

impl OverridePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fail-fast" => Some(Self::FailFast),
            "fall-through" => Some(Self::FallThrough),
            _ => None,
        }
    }
}

/// Options for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageOptions {
    /// `None` keeps the package's own default
    pub enabled: Option<bool>,
    /// `None` keeps the package's own default
    pub required: Option<bool>,
    pub dir: Option<PathBuf>,
    pub include: Option<PathBuf>,
    pub lib: Option<Vec<String>>,
    /// Only accept shared-library installations
    pub shared: bool,
    pub download: DownloadPolicy,
}

/// Compilers named by the user. The value `0` disables a language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub cc: Option<String>,
    pub cxx: Option<String>,
    pub fc: Option<String>,
}

impl CompilerOptions {
    pub fn get(&self, language: Language) -> Option<&str> {
        match language {
            Language::C => self.cc.as_deref(),
            Language::Cxx => self.cxx.as_deref(),
            Language::Fortran => self.fc.as_deref(),
        }
    }

    pub fn is_disabled(&self, language: Language) -> bool {
        self.get(language) == Some("0")
    }
}

/// Every option that influences a configure run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConfigureOptions {
    pub packages: BTreeMap<String, PackageOptions>,
    /// Exhaust every candidate and rank the working ones
    pub alternatives: bool,
    /// Directories scanned for package installations
    pub package_dirs: Vec<PathBuf>,
    /// Root of the project being configured
    pub project_dir: Option<PathBuf>,
    /// Build configuration name, used for per-arch directories
    pub arch: Option<String>,
    /// Home directory scanned for user installations
    pub home_dir: Option<PathBuf>,
    /// Whether test binaries can run on this host
    pub can_execute: bool,
    pub override_policy: OverridePolicy,
    pub compilers: CompilerOptions,
    /// Flags every probe starts from
    pub flags: FlagContext,
    /// Executables named by the user, keyed by program name
    pub executables: BTreeMap<String, PathBuf>,
    /// Install the Fortran stub generator when it is missing
    pub bfort_if_needed: bool,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        Self {
            packages: BTreeMap::new(),
            alternatives: false,
            package_dirs: Vec::new(),
            project_dir: None,
            arch: None,
            home_dir: None,
            can_execute: true,
            override_policy: OverridePolicy::default(),
            compilers: CompilerOptions::default(),
            flags: FlagContext::default(),
            executables: BTreeMap::new(),
            bfort_if_needed: true,
        }
    }
}

impl ConfigureOptions {
    pub fn package(&self, key: &str) -> Option<&PackageOptions> {
        self.packages.get(key)
    }

    pub fn package_or_default(&self, key: &str) -> PackageOptions {
        self.packages.get(key).cloned().unwrap_or_default()
    }

    pub fn package_mut(&mut self, key: &str) -> &mut PackageOptions {
        self.packages.entry(key.to_string()).or_default()
    }

    /// Build configuration name, `default` when none was given.
    pub fn arch_name(&self) -> &str {
        self.arch.as_deref().unwrap_or("default")
    }

    /// Directory source tarballs are unpacked into.
    pub fn download_root(&self) -> Option<PathBuf> {
        self.project_dir
            .as_ref()
            .map(|dir| dir.join("externalpackages"))
    }

    /// Install prefix for a package built from source.
    pub fn install_dir(&self, key: &str) -> Option<PathBuf> {
        self.download_root()
            .map(|root| root.join(key).join(self.arch_name()))
    }

    pub fn apply_arguments<I, S>(&mut self, args: I) -> Result<(), OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.apply_argument(arg.as_ref())?;
        }
        Ok(())
    }

    /// Apply one configure-style argument such as `--with-mpi-dir=/opt/mpich`.
    pub fn apply_argument(&mut self, arg: &str) -> Result<(), OptionsError> {
        let body = arg
            .strip_prefix("--")
            .ok_or_else(|| OptionsError::UnknownOption(arg.to_string()))?;
        let (name, value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        if let Some(key) = name.strip_prefix("download-") {
            let policy = match value {
                None => DownloadPolicy::Always,
                Some(v) => DownloadPolicy::parse(v).ok_or_else(|| invalid(name, v, "yes, no or if-needed"))?,
            };
            self.package_mut(key).download = policy;
            return Ok(());
        }

        if let Some(rest) = name.strip_prefix("with-") {
            return self.apply_with(name, rest, value);
        }

        match name {
            "package-dirs" => {
                self.package_dirs = split_list(required(name, value)?)
                    .into_iter()
                    .map(PathBuf::from)
                    .collect();
            }
            "project-dir" => self.project_dir = Some(PathBuf::from(required(name, value)?)),
            "arch" => self.arch = Some(required(name, value)?.to_string()),
            "can-execute" => self.can_execute = flag(name, value)?,
            "override-policy" => {
                let v = required(name, value)?;
                self.override_policy = OverridePolicy::parse(v)
                    .ok_or_else(|| invalid(name, v, "fail-fast or fall-through"))?;
            }
            _ => return Err(OptionsError::UnknownOption(arg.to_string())),
        }
        Ok(())
    }

    fn apply_with(&mut self, option: &str, rest: &str, value: Option<&str>) -> Result<(), OptionsError> {
        match rest {
            "alternatives" => {
                self.alternatives = flag(option, value)?;
                return Ok(());
            }
            "bfort-if-needed" => {
                self.bfort_if_needed = flag(option, value)?;
                return Ok(());
            }
            "cc" => {
                self.compilers.cc = Some(required(option, value)?.to_string());
                return Ok(());
            }
            "cxx" => {
                self.compilers.cxx = Some(required(option, value)?.to_string());
                return Ok(());
            }
            "fc" => {
                self.compilers.fc = Some(required(option, value)?.to_string());
                return Ok(());
            }
            _ => {}
        }

        let (key, suffix) = rest.split_once('-').unwrap_or((rest, ""));
        match suffix {
            "" => match value {
                None => self.package_mut(key).enabled = Some(true),
                Some(v) => match parse_bool(v) {
                    Some(enabled) => self.package_mut(key).enabled = Some(enabled),
                    None => {
                        self.executables.insert(key.to_string(), PathBuf::from(v));
                    }
                },
            },
            "dir" => self.package_mut(key).dir = Some(PathBuf::from(required(option, value)?)),
            "include" => {
                self.package_mut(key).include = Some(PathBuf::from(required(option, value)?));
            }
            "lib" => self.package_mut(key).lib = Some(split_list(required(option, value)?)),
            "shared" => self.package_mut(key).shared = flag(option, value)?,
            "required" => self.package_mut(key).required = Some(flag(option, value)?),
            _ => return Err(OptionsError::UnknownOption(format!("--{option}"))),
        }
        Ok(())
    }

    /// Reject contradictory options before anything is probed.
    pub fn validate(&self, descriptors: &[PackageDescriptor]) -> ConfigureResult<()> {
        for (key, package) in &self.packages {
            let Some(descriptor) = descriptors.iter().find(|d| d.key == *key) else {
                // --with-mpirun=1 parses as a package toggle
                let names_program = descriptors
                    .iter()
                    .any(|d| d.executables.iter().any(|e| e.name == *key));
                if names_program {
                    let value = if package.enabled == Some(false) { "0" } else { "1" };
                    return Err(invalid(&format!("with-{key}"), value, "a path to the program").into());
                }
                return Err(ConfigureError::UnknownPackage(key.clone()));
            };

            if package.lib.is_some() && package.dir.is_some() {
                return Err(conflict(key, descriptor.option_name("lib"), descriptor.option_name("dir")));
            }
            if package.download == DownloadPolicy::Always {
                let download = format!("download-{key}");
                if package.lib.is_some() {
                    return Err(conflict(key, download, descriptor.option_name("lib")));
                }
                if package.dir.is_some() {
                    return Err(conflict(key, download, descriptor.option_name("dir")));
                }
            }
            if package.download != DownloadPolicy::Never {
                if descriptor.download.is_none() {
                    return Err(ConfigureError::DownloadUnavailable(key.clone()));
                }
                if self.project_dir.is_none() {
                    return Err(ConfigureError::DownloadLocationUnknown(key.clone()));
                }
            }
        }
        Ok(())
    }
}

fn conflict(package: &str, first: String, second: String) -> ConfigureError {
    ConfigureError::ConflictingOptions {
        package: package.to_string(),
        first,
        second,
    }
}

fn invalid(option: &str, value: &str, expected: &'static str) -> OptionsError {
    OptionsError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn required<'a>(option: &str, value: Option<&'a str>) -> Result<&'a str, OptionsError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OptionsError::MissingValue(option.to_string()))
}

/// A boolean option; a bare `--option` means true.
fn flag(option: &str, value: Option<&str>) -> Result<bool, OptionsError> {
    match value {
        None => Ok(true),
        Some(v) => parse_bool(v).ok_or_else(|| invalid(option, v, "a boolean")),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Split `a,b`, `a b` or `[a, b]` into its items.
fn split_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(trimmed);
    inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DownloadRecipe, ExecutableSearch};

    fn descriptors() -> Vec<PackageDescriptor> {
        vec![
            PackageDescriptor {
                key: "mpi".into(),
                executables: vec![ExecutableSearch {
                    name: "mpirun".into(),
                    substitution: "MPIRUN".into(),
                }],
                download: Some(DownloadRecipe {
                    urls: vec!["https://example.org/mpich.tar.gz".into()],
                    directory_prefix: "mpich".into(),
                    libraries: vec![],
                    build_files: vec![],
                    configure: None,
                    build: vec![],
                }),
                ..Default::default()
            },
            PackageDescriptor {
                key: "blaslapack".into(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_package_arguments() {
        let mut options = ConfigureOptions::default();
        options
            .apply_arguments([
                "--with-mpi-dir=/opt/mpich",
                "--with-mpi-include=/opt/mpich/include",
                "--with-mpi-shared",
                "--with-blaslapack-lib=[/usr/lib/liblapack.a, /usr/lib/libblas.a]",
                "--with-scotch=0",
            ])
            .unwrap();

        let mpi = options.package("mpi").unwrap();
        assert_eq!(mpi.dir, Some(PathBuf::from("/opt/mpich")));
        assert_eq!(mpi.include, Some(PathBuf::from("/opt/mpich/include")));
        assert!(mpi.shared);
        assert_eq!(
            options.package("blaslapack").unwrap().lib,
            Some(vec!["/usr/lib/liblapack.a".to_string(), "/usr/lib/libblas.a".to_string()])
        );
        assert_eq!(options.package("scotch").unwrap().enabled, Some(false));
    }

    #[test]
    fn test_download_arguments() {
        let mut options = ConfigureOptions::default();
        options
            .apply_arguments(["--download-mpi", "--download-chaco=if-needed", "--download-scotch=no"])
            .unwrap();
        assert_eq!(options.package("mpi").unwrap().download, DownloadPolicy::Always);
        assert_eq!(options.package("chaco").unwrap().download, DownloadPolicy::IfNeeded);
        assert_eq!(options.package("scotch").unwrap().download, DownloadPolicy::Never);

        let err = options.apply_argument("--download-mpi=sometimes").unwrap_err();
        assert!(matches!(err, OptionsError::InvalidValue { .. }));
    }

    #[test]
    fn test_global_and_executable_arguments() {
        let mut options = ConfigureOptions::default();
        options
            .apply_arguments([
                "--with-alternatives",
                "--with-mpirun=/usr/bin/mpiexec",
                "--with-fc=0",
                "--package-dirs=/soft,/opt/pkgs",
                "--project-dir=/home/u/proj",
                "--arch=linux-gnu",
                "--can-execute=no",
                "--override-policy=fall-through",
            ])
            .unwrap();

        assert!(options.alternatives);
        assert_eq!(options.executables["mpirun"], PathBuf::from("/usr/bin/mpiexec"));
        assert!(options.compilers.is_disabled(Language::Fortran));
        assert!(!options.compilers.is_disabled(Language::C));
        assert_eq!(options.package_dirs.len(), 2);
        assert!(!options.can_execute);
        assert_eq!(options.override_policy, OverridePolicy::FallThrough);
        assert_eq!(
            options.install_dir("mpi"),
            Some(PathBuf::from("/home/u/proj/externalpackages/mpi/linux-gnu"))
        );
        assert!(!options.packages.contains_key("mpirun"));
    }

    #[test]
    fn test_unknown_arguments_are_rejected() {
        let mut options = ConfigureOptions::default();
        assert!(matches!(
            options.apply_argument("--with-mpi-colour=blue"),
            Err(OptionsError::UnknownOption(_))
        ));
        assert!(matches!(
            options.apply_argument("--frobnicate"),
            Err(OptionsError::UnknownOption(_))
        ));
        assert_eq!(
            options.apply_argument("--with-mpi-dir"),
            Err(OptionsError::MissingValue("with-mpi-dir".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_lib_with_dir() {
        let mut options = ConfigureOptions::default();
        options
            .apply_arguments(["--with-mpi-lib=/x/libmpi.a", "--with-mpi-dir=/x"])
            .unwrap();
        let err = options.validate(&descriptors()).unwrap_err();
        match err {
            ConfigureError::ConflictingOptions { package, first, second } => {
                assert_eq!(package, "mpi");
                assert_eq!(first, "with-mpi-lib");
                assert_eq!(second, "with-mpi-dir");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_download_with_dir() {
        let mut options = ConfigureOptions::default();
        options
            .apply_arguments(["--download-mpi", "--with-mpi-dir=/x", "--project-dir=/p"])
            .unwrap();
        assert!(matches!(
            options.validate(&descriptors()),
            Err(ConfigureError::ConflictingOptions { .. })
        ));
    }

    #[test]
    fn test_validate_download_requirements() {
        let mut options = ConfigureOptions::default();
        options.apply_argument("--download-blaslapack").unwrap();
        options.apply_argument("--project-dir=/p").unwrap();
        assert!(matches!(
            options.validate(&descriptors()),
            Err(ConfigureError::DownloadUnavailable(_))
        ));

        let mut options = ConfigureOptions::default();
        options.apply_argument("--download-mpi=if-needed").unwrap();
        assert!(matches!(
            options.validate(&descriptors()),
            Err(ConfigureError::DownloadLocationUnknown(_))
        ));
    }

    #[test]
    fn test_validate_unknown_package() {
        let mut options = ConfigureOptions::default();
        options.apply_argument("--with-petsc=1").unwrap();
        assert!(matches!(
            options.validate(&descriptors()),
            Err(ConfigureError::UnknownPackage(key)) if key == "petsc"
        ));
    }

    #[test]
    fn test_validate_flag_given_for_program_path() {
        let mut options = ConfigureOptions::default();
        options.apply_argument("--with-mpirun=1").unwrap();
        let err = options.validate(&descriptors()).unwrap_err();
        assert!(matches!(
            &err,
            ConfigureError::Options(OptionsError::InvalidValue { option, value, .. })
                if option == "with-mpirun" && value == "1"
        ));
        assert!(err.to_string().contains("a path to the program"));

        let mut options = ConfigureOptions::default();
        options.apply_argument("--with-mpirun=/opt/mpich/bin/mpirun").unwrap();
        assert!(options.validate(&descriptors()).is_ok());
    }

    #[test]
    fn test_json_layer_uses_kebab_case_and_defaults() {
        let json = r#"{
            "alternatives": true,
            "project-dir": "/p",
            "packages": { "mpi": { "dir": "/opt/mpich", "download": "if-needed" } }
        }"#;
        let options: ConfigureOptions = serde_json::from_str(json).unwrap();
        assert!(options.alternatives);
        assert!(options.can_execute);
        assert!(options.bfort_if_needed);
        assert_eq!(options.package("mpi").unwrap().download, DownloadPolicy::IfNeeded);
    }
}
