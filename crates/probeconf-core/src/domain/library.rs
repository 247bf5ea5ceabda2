//! Library and include path groups.
//!
//! A candidate never names a single library: MPI alone ships as anything
//! from one archive to five cooperating ones, so the unit of probing is an
//! ordered group of library entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extensions of static archives. A group holding one of these is
/// not a shared-library installation.
const STATIC_EXTENSIONS: &[&str] = &["a", "lib"];

/// File extensions that mark an entry as a path rather than a bare name.
const LIBRARY_EXTENSIONS: &[&str] = &["a", "lib", "so", "dylib", "dll"];

/// One element of a link line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LibraryEntry {
    /// Path to a library file (`/opt/mpich/lib/libmpich.a`)
    Path(PathBuf),
    /// Bare library name resolved by the linker (`mpich` links as `-lmpich`)
    Name(String),
    /// Linker flag passed through unchanged (`-lm`, `-L/opt/x/lib`)
    Flag(String),
}

impl LibraryEntry {
    /// Classify a user- or descriptor-supplied library string.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('-') {
            return Self::Flag(raw.to_string());
        }

        let path = Path::new(raw);
        let has_library_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| LIBRARY_EXTENSIONS.contains(&ext));

        if has_library_extension || raw.contains('/') || raw.contains('\\') {
            Self::Path(path.to_path_buf())
        } else {
            Self::Name(raw.to_string())
        }
    }

    /// Link arguments for this entry.
    ///
    /// A path becomes `-L<dir> -l<name>` with the `lib` prefix and the
    /// extension stripped; a path without a directory becomes `-l<name>`.
    pub fn link_args(&self) -> Vec<String> {
        match self {
            Self::Path(path) => {
                let Some(name) = library_name(path) else {
                    return vec![path.display().to_string()];
                };
                match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    Some(dir) => vec![format!("-L{}", dir.display()), format!("-l{name}")],
                    None => vec![format!("-l{name}")],
                }
            }
            Self::Name(name) if name.is_empty() => Vec::new(),
            Self::Name(name) => vec![format!("-l{name}")],
            Self::Flag(flag) => vec![flag.clone()],
        }
    }

    /// Whether this entry is a static archive.
    pub fn is_static(&self) -> bool {
        match self {
            Self::Path(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| STATIC_EXTENSIONS.contains(&ext)),
            Self::Name(_) | Self::Flag(_) => false,
        }
    }

    /// Directory holding the library, for path entries with one.
    pub fn directory(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => path.parent().filter(|dir| !dir.as_os_str().is_empty()),
            Self::Name(_) | Self::Flag(_) => None,
        }
    }
}

impl fmt::Display for LibraryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Name(name) | Self::Flag(name) => write!(f, "{name}"),
        }
    }
}

/// Strip directory, `lib` prefix and extension: `/x/libmpich.a` -> `mpich`.
fn library_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem.strip_prefix("lib").unwrap_or(stem);
    (!name.is_empty()).then(|| name.to_string())
}

/// Ordered group of libraries probed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryGroup(Vec<LibraryEntry>);

impl LibraryGroup {
    pub fn new(entries: Vec<LibraryEntry>) -> Self {
        Self(entries)
    }

    /// Build a group from raw strings, dropping empty ones.
    pub fn parse<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            raw.into_iter()
                .filter(|s| !s.as_ref().trim().is_empty())
                .map(|s| LibraryEntry::parse(s.as_ref()))
                .collect(),
        )
    }

    /// Group of library files `names` inside `dir`.
    pub fn in_dir(dir: &Path, names: &[&str]) -> Self {
        Self(
            names
                .iter()
                .map(|name| LibraryEntry::Path(dir.join(name)))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn link_args(&self) -> Vec<String> {
        self.0.iter().flat_map(LibraryEntry::link_args).collect()
    }

    /// Link arguments joined into a single command-line fragment.
    pub fn link_line(&self) -> String {
        self.link_args().join(" ")
    }

    /// Distinct library directories, in first-seen order.
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for dir in self.0.iter().filter_map(LibraryEntry::directory) {
            if !dirs.iter().any(|seen| seen == dir) {
                dirs.push(dir.to_path_buf());
            }
        }
        dirs
    }

    /// A group is shared unless one of its entries is a static archive.
    /// Bare names count as shared because the linker prefers shared objects.
    pub fn is_shared(&self) -> bool {
        !self.0.iter().any(LibraryEntry::is_static)
    }
}

impl fmt::Display for LibraryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(no libraries)");
        }
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Ordered group of include directories probed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncludeGroup(Vec<PathBuf>);

impl IncludeGroup {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self(dirs)
    }

    pub fn single(dir: impl Into<PathBuf>) -> Self {
        Self(vec![dir.into()])
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Path> {
        self.0.first().map(PathBuf::as_path)
    }

    /// `-I<dir>` for each directory.
    pub fn flags(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|dir| format!("-I{}", dir.display()))
            .collect()
    }
}

impl fmt::Display for IncludeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(no include dirs)");
        }
        let parts: Vec<String> = self.0.iter().map(|d| d.display().to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
