//! Read-only view of the host filesystem used during candidate generation.

use std::io;
use std::path::{Path, PathBuf};

/// Port for the filesystem queries candidate generation needs.
pub trait FileSystemProbe {
    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Entries of `path`, sorted by name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Locate `name` in `extra_paths` first, then on `PATH`.
    fn find_executable(&self, name: &str, extra_paths: &[PathBuf]) -> Option<PathBuf>;
}
