//! Per-dependency descriptors that parameterise the probe-and-select engine.
//!
//! Every dependency is probed by the same engine. What differs between MPI,
//! BLAS/LAPACK or a graph partitioner is captured here: which symbols and
//! headers prove an installation works, where installations usually live,
//! how to build one from source and which extra facts to record once one is
//! chosen.

use super::library::{LibraryEntry, LibraryGroup};
use super::program::{Language, TestProgram};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for a `configure` script run by the source installer.
pub const CONFIGURE_TIMEOUT: Duration = Duration::from_secs(900);

/// Default timeout for a `make` step run by the source installer.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(2500);

/// One library inside an installation's library directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryTemplate {
    /// File relative to the library directory (`shared/libmpich.a`)
    InDir(String),
    /// System library named as-is on every layout (`ws2_32.lib`)
    System(String),
}

impl LibraryTemplate {
    fn expand(&self, lib_dir: &Path) -> LibraryEntry {
        match self {
            Self::InDir(rel) => LibraryEntry::Path(lib_dir.join(rel)),
            Self::System(name) => LibraryEntry::parse(name),
        }
    }
}

/// Shorthand for [`LibraryTemplate::InDir`].
pub fn lib(rel: &str) -> LibraryTemplate {
    LibraryTemplate::InDir(rel.to_string())
}

/// A sub-directory of a user-supplied root that may hold an installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootVariant {
    /// Path below the root; empty for the root itself
    pub subdir: String,
    /// Candidate description
    pub label: String,
}

impl RootVariant {
    pub fn new(subdir: &str, label: &str) -> Self {
        Self {
            subdir: subdir.to_string(),
            label: label.to_string(),
        }
    }
}

/// Extra fact recorded about the selected installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureCheck {
    /// Define `define` to 1 when `program` links against the selection
    Links { define: String, program: TestProgram },
    /// Define `define` to `sizeof(type_name)`; needs a host that can run binaries
    SizeOf {
        define: String,
        type_name: String,
        header: String,
    },
}

/// Executable expected next to an installation, such as `mpirun`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableSearch {
    /// Program name, also the option key users override it with (`--with-mpirun`)
    pub name: String,
    /// Substitution receiving the full path
    pub substitution: String,
}

/// Argument of a source package's `configure` script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigureArg {
    Always(String),
    /// Chooses between two arguments depending on whether a compiler for
    /// `language` is configured
    WithLanguage {
        language: Language,
        present: String,
        absent: String,
    },
}

/// A file the installer writes into the unpacked source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFile {
    /// Path relative to the source directory
    pub path: String,
    pub template: String,
}

/// A shell command run inside the unpacked source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub command: String,
    /// Directory relative to the source directory; `None` runs at its top
    pub subdir: Option<String>,
    pub timeout: Duration,
}

impl BuildStep {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            subdir: None,
            timeout: BUILD_TIMEOUT,
        }
    }

    #[must_use]
    pub fn in_subdir(mut self, subdir: &str) -> Self {
        self.subdir = Some(subdir.to_string());
        self
    }
}

/// How to download and build a dependency from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecipe {
    /// Tarball locations, tried in order
    pub urls: Vec<String>,
    /// Name prefix of the directory the tarball unpacks into
    pub directory_prefix: String,
    /// Libraries the build installs into `<prefix>/lib`
    pub libraries: Vec<String>,
    pub build_files: Vec<BuildFile>,
    /// Arguments for `./configure`; `None` for packages without one
    pub configure: Option<Vec<ConfigureArg>>,
    pub build: Vec<BuildStep>,
}

impl DownloadRecipe {
    /// Rendered `./configure` arguments, joined by spaces.
    pub fn configure_arguments(&self, vars: &BuildVariables) -> Option<String> {
        let args = self.configure.as_ref()?;
        let rendered: Vec<String> = args
            .iter()
            .map(|arg| match arg {
                ConfigureArg::Always(text) => vars.render(text),
                ConfigureArg::WithLanguage {
                    language,
                    present,
                    absent,
                } => {
                    if vars.compiler(*language).is_some() {
                        vars.render(present)
                    } else {
                        vars.render(absent)
                    }
                }
            })
            .collect();
        Some(rendered.join(" "))
    }

    /// Everything that influences the build, used to decide whether a
    /// previous install can be reused.
    pub fn fingerprint(&self, vars: &BuildVariables) -> String {
        let mut parts = Vec::new();
        if let Some(args) = self.configure_arguments(vars) {
            parts.push(args);
        }
        for file in &self.build_files {
            parts.push(format!("{}:{}", file.path, vars.render(&file.template)));
        }
        parts.join("\n")
    }
}

/// Toolchain facts substituted into recipe templates.
///
/// Placeholders: `{prefix}`, `{source}`, `{cc}`, `{cxx}`, `{fc}`,
/// `{cflags}`, `{ar}`, `{arflags}`, `{ranlib}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildVariables {
    pub prefix: PathBuf,
    pub source: PathBuf,
    pub cc: String,
    pub cxx: Option<String>,
    pub fc: Option<String>,
    pub cflags: String,
    pub ar: String,
    pub arflags: String,
    pub ranlib: String,
}

impl BuildVariables {
    pub fn compiler(&self, language: Language) -> Option<&str> {
        match language {
            Language::C => Some(self.cc.as_str()),
            Language::Cxx => self.cxx.as_deref(),
            Language::Fortran => self.fc.as_deref(),
        }
    }

    pub fn render(&self, template: &str) -> String {
        template
            .replace("{prefix}", &self.prefix.display().to_string())
            .replace("{source}", &self.source.display().to_string())
            .replace("{cc}", &self.cc)
            .replace("{cxx}", self.cxx.as_deref().unwrap_or(""))
            .replace("{fc}", self.fc.as_deref().unwrap_or(""))
            .replace("{cflags}", &self.cflags)
            .replace("{arflags}", &self.arflags)
            .replace("{ar}", &self.ar)
            .replace("{ranlib}", &self.ranlib)
    }
}

/// Substitution emitted by packages that are declared but never probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub description: String,
}

/// Everything the engine needs to know about one dependency.
#[derive(Debug, Clone, Default)]
pub struct PackageDescriptor {
    /// Option key: `--with-<key>-dir`, `--download-<key>`
    pub key: String,
    /// Human-readable name used in messages
    pub display_name: String,
    /// Prefix of emitted substitutions (`MPI` gives `MPI_LIB`, `HAVE_MPI`)
    pub substitution_prefix: String,
    pub enabled_by_default: bool,
    /// Whether a failed search aborts the run unless the user overrides it
    pub required_by_default: bool,
    /// Symbols every library group must define
    pub functions: Vec<String>,
    /// Apply the toolchain's Fortran name mangling to `functions`
    pub fortran_mangle: bool,
    /// Headers every include group must provide; empty skips the check
    pub headers: Vec<String>,
    /// Linker flags always appended after the candidate's libraries
    pub extra_libraries: Vec<String>,
    /// Library groups expected inside an installation's `lib` directory
    pub library_layouts: Vec<Vec<LibraryTemplate>>,
    /// Library groups tried with the compiler's default search paths
    pub default_libraries: Vec<Vec<String>>,
    /// Sub-directories of `--with-<key>-dir` that may hold an installation
    pub root_variants: Vec<RootVariant>,
    /// Regex matched against entries of the package directories
    pub directory_pattern: Option<String>,
    /// Hard-coded installation roots with their descriptions
    pub well_known_roots: Vec<(String, PathBuf)>,
    /// Substring identifying installations under `/usr/local` and `$HOME`
    pub search_hint: Option<String>,
    /// Try `<project-dir>/../<key>` and its per-arch sub-directories
    pub project_locations: bool,
    /// Programs that must link once symbols and headers are found
    pub link_tests: Vec<TestProgram>,
    /// Program printing the version on stdout
    pub version_program: Option<TestProgram>,
    /// Program that exits 0 only when the package code was loaded from a
    /// shared object rather than linked into the executable
    pub shared_check: Option<TestProgram>,
    /// Facts recorded about the selected installation
    pub features: Vec<FeatureCheck>,
    pub executables: Vec<ExecutableSearch>,
    /// Keys of packages whose flags this package needs
    pub dependencies: Vec<String>,
    pub download: Option<DownloadRecipe>,
    /// Non-empty for packages that only emit fixed substitutions
    pub placeholders: Vec<Placeholder>,
}

impl PackageDescriptor {
    /// Whether this package is declared only for its fixed substitutions.
    pub fn is_placeholder(&self) -> bool {
        !self.placeholders.is_empty() && self.functions.is_empty()
    }

    /// Library groups for an installation whose libraries live in `lib_dir`.
    pub fn libraries_in(&self, lib_dir: &Path) -> Vec<LibraryGroup> {
        self.library_layouts
            .iter()
            .map(|layout| LibraryGroup::new(layout.iter().map(|t| t.expand(lib_dir)).collect()))
            .collect()
    }

    /// Library groups for an installation rooted at `root`.
    pub fn libraries_in_root(&self, root: &Path) -> Vec<LibraryGroup> {
        self.libraries_in(&root.join("lib"))
    }

    /// Library groups resolved by the compiler's default search paths.
    pub fn default_library_groups(&self) -> Vec<LibraryGroup> {
        self.default_libraries.iter().map(LibraryGroup::parse).collect()
    }

    /// Option name for a per-package setting, e.g. `with-mpi-dir`.
    pub fn option_name(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("with-{}", self.key)
        } else {
            format!("with-{}-{suffix}", self.key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> BuildVariables {
        BuildVariables {
            prefix: PathBuf::from("/p/linux/externalpackages/mpi"),
            source: PathBuf::from("/p/externalpackages/mpich-1.2.7"),
            cc: "gcc".to_string(),
            cxx: None,
            fc: Some("gfortran".to_string()),
            cflags: "-O2".to_string(),
            ar: "ar".to_string(),
            arflags: "cr".to_string(),
            ranlib: "ranlib".to_string(),
        }
    }

    #[test]
    fn test_render_replaces_every_placeholder() {
        let text = vars().render("{cc} {cflags} {ar} {arflags} {ranlib} {prefix} {cxx}|");
        assert_eq!(
            text,
            "gcc -O2 ar cr ranlib /p/linux/externalpackages/mpi |"
        );
    }

    #[test]
    fn test_configure_arguments_follow_available_languages() {
        let recipe = DownloadRecipe {
            urls: vec![],
            directory_prefix: "mpich".into(),
            libraries: vec![],
            build_files: vec![],
            configure: Some(vec![
                ConfigureArg::Always("--prefix={prefix}".into()),
                ConfigureArg::WithLanguage {
                    language: Language::Cxx,
                    present: "-c++={cxx}".into(),
                    absent: "--disable-c++".into(),
                },
                ConfigureArg::WithLanguage {
                    language: Language::Fortran,
                    present: "-fc={fc}".into(),
                    absent: "--disable-f77".into(),
                },
            ]),
            build: vec![],
        };
        assert_eq!(
            recipe.configure_arguments(&vars()).unwrap(),
            "--prefix=/p/linux/externalpackages/mpi --disable-c++ -fc=gfortran"
        );
    }

    #[test]
    fn test_libraries_in_root_expands_layouts() {
        let descriptor = PackageDescriptor {
            key: "mpi".into(),
            library_layouts: vec![
                vec![lib("libmpich.a"), lib("libpmpich.a")],
                vec![lib("mpich.lib"), LibraryTemplate::System("ws2_32.lib".into())],
            ],
            ..Default::default()
        };
        let groups = descriptor.libraries_in_root(Path::new("/opt/mpich"));
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0].link_line(),
            "-L/opt/mpich/lib -lmpich -L/opt/mpich/lib -lpmpich"
        );
        assert_eq!(groups[1].link_line(), "-L/opt/mpich/lib -lmpich -lws2_32");
    }

    #[test]
    fn test_option_names() {
        let descriptor = PackageDescriptor {
            key: "scotch".into(),
            ..Default::default()
        };
        assert_eq!(descriptor.option_name(""), "with-scotch");
        assert_eq!(descriptor.option_name("dir"), "with-scotch-dir");
    }
}
