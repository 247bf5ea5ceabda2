//! Source installer: fetch a tarball, unpack it, configure, build and install.
//!
//! Installs are cached: the recipe's fingerprint is written to
//! `<install-dir>/config.args` after a successful build, and a later install
//! with the same fingerprint and all libraries present is skipped.

use crate::process::BlockingRuntime;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use probeconf_core::domain::{BuildVariables, CONFIGURE_TIMEOUT, DownloadRecipe};
use probeconf_core::ports::{
    InstallError, InstallPlan, InstallResult, Installer, ShellCommand, ShellRunner,
};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CACHE_FILE: &str = "config.args";

/// Installer running build commands through a [`ShellRunner`].
pub struct SourceInstaller<S> {
    shell: S,
    runtime: BlockingRuntime,
    client: reqwest::Client,
}

impl<S: ShellRunner> SourceInstaller<S> {
    pub fn new(shell: S) -> InstallResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("probeconf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| io::Error::other(err.to_string()))?;
        Ok(Self {
            shell,
            runtime: BlockingRuntime::new()?,
            client,
        })
    }

    /// Unpacked source directory for `recipe`, downloading it when absent.
    fn source_dir(&self, plan: &InstallPlan) -> InstallResult<PathBuf> {
        let root = &plan.download_root;
        if let Some(dir) = find_source_dir(root, &plan.recipe.directory_prefix, &plan.package)? {
            debug!(dir = %dir.display(), "Reusing unpacked sources");
            return Ok(dir);
        }

        fs::create_dir_all(root)?;
        let archive = self.download(&plan.recipe, root)?;
        extract(&archive, root)?;
        if let Err(err) = fs::remove_file(&archive) {
            warn!(archive = %archive.display(), error = %err, "Could not remove downloaded archive");
        }
        find_source_dir(root, &plan.recipe.directory_prefix, &plan.package)?.ok_or_else(|| {
            InstallError::SourceNotFound {
                prefix: plan.recipe.directory_prefix.clone(),
                dir: root.clone(),
            }
        })
    }

    /// Fetch the first reachable URL into `root`.
    fn download(&self, recipe: &DownloadRecipe, root: &Path) -> InstallResult<PathBuf> {
        let mut reasons = Vec::new();
        for url in &recipe.urls {
            let name = url.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("package.tar.gz");
            let dest = root.join(name);
            info!(url = %url, "Downloading");
            match self.fetch(url, &dest) {
                Ok(()) => return Ok(dest),
                Err(reason) => {
                    warn!(url = %url, reason = %reason, "Download failed");
                    reasons.push(format!("{url}: {reason}"));
                }
            }
        }
        Err(InstallError::Download {
            urls: recipe.urls.clone(),
            reason: reasons.join("; "),
        })
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<(), String> {
        if let Some(path) = url.strip_prefix("file://") {
            return fs::copy(path, dest).map(|_| ()).map_err(|err| err.to_string());
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err("unsupported URL scheme".to_string());
        }

        self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| err.to_string())?;
            if !response.status().is_success() {
                return Err(format!("HTTP {}", response.status()));
            }
            let mut file = File::create(dest).map_err(|err| err.to_string())?;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|err| err.to_string())?;
                file.write_all(&chunk).map_err(|err| err.to_string())?;
            }
            Ok(())
        })
    }

    fn run_step(&self, command: ShellCommand) -> InstallResult<()> {
        let output = self.shell.run(&command)?;
        output.ensure_success(&command)?;
        Ok(())
    }
}

/// Newest-named directory in `root` starting with `prefix`.
///
/// The entry named exactly `key` holds install trees, not sources.
fn find_source_dir(root: &Path, prefix: &str, key: &str) -> io::Result<Option<PathBuf>> {
    if !root.is_dir() {
        return Ok(None);
    }
    let mut matches: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with(prefix) && name != key)
        })
        .collect();
    matches.sort();
    Ok(matches.pop())
}

fn extract(archive: &Path, root: &Path) -> InstallResult<()> {
    let file = File::open(archive)?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(root)
        .map_err(|err| InstallError::Extract {
            archive: archive.to_path_buf(),
            reason: err.to_string(),
        })
}

fn write_build_files(recipe: &DownloadRecipe, vars: &BuildVariables) -> InstallResult<()> {
    for file in &recipe.build_files {
        let path = vars.source.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(file = %path.display(), "Writing build file");
        fs::write(&path, vars.render(&file.template))?;
    }
    Ok(())
}

fn missing_libraries(recipe: &DownloadRecipe, lib_dir: &Path) -> Vec<String> {
    recipe
        .libraries
        .iter()
        .filter(|name| !lib_dir.join(name).is_file())
        .cloned()
        .collect()
}

impl<S: ShellRunner> Installer for SourceInstaller<S> {
    fn install(&self, plan: &InstallPlan) -> InstallResult<PathBuf> {
        let install_dir = plan.install_dir().to_path_buf();
        let recipe = &plan.recipe;
        let source = self.source_dir(plan)?;
        let vars = BuildVariables {
            source: source.clone(),
            ..plan.variables.clone()
        };

        fs::create_dir_all(&install_dir)?;
        write_build_files(recipe, &vars)?;

        let fingerprint = recipe.fingerprint(&vars);
        let cache = install_dir.join(CACHE_FILE);
        let previous = fs::read_to_string(&cache).unwrap_or_default();
        let lib_dir = install_dir.join("lib");
        if previous == fingerprint && missing_libraries(recipe, &lib_dir).is_empty() {
            info!(package = %plan.package, dir = %install_dir.display(), "Already installed, skipping build");
            return Ok(install_dir);
        }

        info!(package = %plan.package, source = %source.display(), "Building from source; this may take several minutes");
        if let Some(args) = recipe.configure_arguments(&vars) {
            self.run_step(ShellCommand::new(format!("./configure {args}"), CONFIGURE_TIMEOUT).in_dir(&source))?;
        }
        for step in &recipe.build {
            let dir = step
                .subdir
                .as_ref()
                .map_or_else(|| source.clone(), |sub| source.join(sub));
            self.run_step(ShellCommand::new(vars.render(&step.command), step.timeout).in_dir(dir))?;
        }

        let missing = missing_libraries(recipe, &lib_dir);
        if !missing.is_empty() {
            return Err(InstallError::LibrariesMissing { dir: lib_dir, missing });
        }
        fs::write(&cache, fingerprint)?;
        info!(package = %plan.package, dir = %install_dir.display(), "Installed");
        Ok(install_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_dir_skips_install_tree() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("scotch/linux")).unwrap();
        fs::create_dir_all(root.path().join("scotch_5.1.11_esmumps")).unwrap();
        fs::write(root.path().join("scotch.tar.gz"), b"").unwrap();

        let found = find_source_dir(root.path(), "scotch", "scotch").unwrap();
        assert_eq!(found, Some(root.path().join("scotch_5.1.11_esmumps")));
    }

    #[test]
    fn test_source_dir_missing_root() {
        let found = find_source_dir(Path::new("/nonexistent/probeconf"), "mpich", "mpi").unwrap();
        assert!(found.is_none());
    }
}
