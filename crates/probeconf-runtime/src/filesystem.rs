//! Host filesystem adapter.

use probeconf_core::ports::FileSystemProbe;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Copy)]
pub struct HostFileSystem;

impl HostFileSystem {
    pub const fn new() -> Self {
        Self
    }
}

impl FileSystemProbe for HostFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn find_executable(&self, name: &str, extra_paths: &[PathBuf]) -> Option<PathBuf> {
        extra_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
            .or_else(|| which::which(name).ok())
    }
}
