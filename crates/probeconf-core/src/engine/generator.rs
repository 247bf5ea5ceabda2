//! Candidate generation.
//!
//! Candidates come in five tiers, highest priority first. Tiers are
//! expanded lazily: the filesystem is only scanned for a tier once every
//! candidate of the previous tiers has been handed out.

use crate::domain::{
    Candidate, IncludeGroup, LibraryEntry, LibraryGroup, PackageDescriptor, RootVariant, Tier,
};
use crate::error::{ConfigureError, ConfigureResult};
use crate::options::{ConfigureOptions, DownloadPolicy, PackageOptions};
use crate::ports::FileSystemProbe;
use regex::Regex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Expands a descriptor and the user's options into candidates.
pub struct CandidateGenerator<'a> {
    descriptor: &'a PackageDescriptor,
    options: &'a ConfigureOptions,
    package: PackageOptions,
    fs: &'a dyn FileSystemProbe,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(
        descriptor: &'a PackageDescriptor,
        options: &'a ConfigureOptions,
        fs: &'a dyn FileSystemProbe,
    ) -> Self {
        Self {
            descriptor,
            options,
            package: options.package_or_default(&descriptor.key),
            fs,
        }
    }

    /// Lazy sequence of candidates in priority order.
    pub fn candidates(&self) -> Candidates<'_, 'a> {
        Candidates {
            generator: self,
            pending: VecDeque::new(),
            next_tier: 0,
            failed: false,
        }
    }

    /// Candidates of one tier.
    pub fn expand(&self, tier: Tier) -> ConfigureResult<Vec<Candidate>> {
        match tier {
            Tier::UserOverride => Ok(self.user_override()),
            Tier::UserRoot => Ok(self.user_root()),
            Tier::Environment => self.environment(),
            Tier::WellKnown => Ok(self.well_known()),
            Tier::Download => Ok(self.download_fallback()),
        }
    }

    fn user_override(&self) -> Vec<Candidate> {
        let key = &self.descriptor.key;
        let mut candidates = Vec::new();

        if self.package.download == DownloadPolicy::Always
            && let Some(candidate) = self.download_candidate(Tier::UserOverride)
        {
            candidates.push(candidate.with_intent(format!("download-{key}"), "yes"));
        }

        if let Some(libs) = &self.package.lib {
            let group = LibraryGroup::parse(libs);
            let includes = match &self.package.include {
                Some(dir) => vec![IncludeGroup::single(dir)],
                None => self.include_guesses(&group),
            };
            candidates.push(
                Candidate::new(
                    "User specified library and include directory",
                    Tier::UserOverride,
                    vec![group],
                    includes,
                )
                .with_intent(self.descriptor.option_name("lib"), libs.join(",")),
            );
        } else if let Some(include) = &self.package.include
            && self.package.dir.is_none()
        {
            candidates.push(
                Candidate::new(
                    "User specified include directory",
                    Tier::UserOverride,
                    self.descriptor.default_library_groups(),
                    vec![IncludeGroup::single(include)],
                )
                .with_intent(
                    self.descriptor.option_name("include"),
                    include.display().to_string(),
                ),
            );
        }

        candidates
    }

    /// Every `include` directory found walking up from the grandparent of
    /// the first library, then the compiler's default include path.
    fn include_guesses(&self, group: &LibraryGroup) -> Vec<IncludeGroup> {
        let mut guesses = Vec::new();
        if let Some(lib_dir) = group.directories().first()
            && let Some(start) = lib_dir.parent()
        {
            for dir in start.ancestors() {
                let include = dir.join("include");
                if self.fs.is_dir(&include) {
                    guesses.push(IncludeGroup::single(include));
                }
            }
        }
        guesses.push(IncludeGroup::default());
        guesses
    }

    fn user_root(&self) -> Vec<Candidate> {
        let Some(root) = &self.package.dir else {
            return Vec::new();
        };
        let option = self.descriptor.option_name("dir");
        let value = root.display().to_string();

        let variants = if self.descriptor.root_variants.is_empty() {
            vec![RootVariant::new("", "User specified installation root")]
        } else {
            self.descriptor.root_variants.clone()
        };

        variants
            .iter()
            .map(|variant| {
                let layout = if variant.subdir.is_empty() {
                    root.clone()
                } else {
                    root.join(&variant.subdir)
                };
                self.rooted(&variant.label, Tier::UserRoot, &layout)
                    .with_intent(option.clone(), value.clone())
            })
            .collect()
    }

    fn environment(&self) -> ConfigureResult<Vec<Candidate>> {
        let mut candidates = Vec::new();

        if let Some(pattern) = &self.descriptor.directory_pattern {
            let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
                ConfigureError::InvalidPattern {
                    package: self.descriptor.key.clone(),
                    reason: e.to_string(),
                }
            })?;
            for packages in &self.options.package_dirs {
                if !self.fs.is_dir(packages) {
                    return Err(ConfigureError::InvalidPackageDirectory(packages.clone()));
                }
                let entries = self
                    .fs
                    .list_dir(packages)
                    .map_err(|source| ConfigureError::Filesystem {
                        path: packages.clone(),
                        source,
                    })?;
                for entry in entries {
                    let matches = entry
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| regex.is_match(name));
                    if matches && self.fs.is_dir(&entry) {
                        let name = format!("Package directory installation root ({})", entry.display());
                        candidates.push(self.rooted(&name, Tier::Environment, &entry));
                    }
                }
            }
        }

        if let Some(install) = self.options.install_dir(&self.descriptor.key)
            && self.package.download != DownloadPolicy::Always
            && self.fs.is_dir(&install.join("lib"))
        {
            candidates.push(self.rooted("Previously installed from source", Tier::Environment, &install));
        }

        if self.descriptor.project_locations
            && let (Some(project), Some(arch)) = (&self.options.project_dir, &self.options.arch)
        {
            let root = project.join("..").join(&self.descriptor.key);
            let lib_dir = root.join("lib");
            let include = vec![IncludeGroup::single(root.join("include")), IncludeGroup::default()];
            let locations = [
                ("Project location 1", lib_dir.clone()),
                ("Project location 2", lib_dir.join("libg_c++").join(arch)),
                ("Project location 3", lib_dir.join("libO_c++").join(arch)),
            ];
            for (name, dir) in locations {
                candidates.push(Candidate::new(
                    name,
                    Tier::Environment,
                    self.descriptor.libraries_in(&dir),
                    include.clone(),
                ));
            }
        }

        Ok(candidates)
    }

    fn well_known(&self) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        let defaults = self.descriptor.default_library_groups();
        if !defaults.is_empty() {
            candidates.push(Candidate::new(
                "Default compiler locations",
                Tier::WellKnown,
                defaults,
                vec![IncludeGroup::default()],
            ));
        }

        for (label, root) in &self.descriptor.well_known_roots {
            if self.fs.is_dir(root) {
                candidates.push(self.rooted(label, Tier::WellKnown, root));
            } else {
                debug!(package = %self.descriptor.key, root = %root.display(), "Skipping missing location");
            }
        }

        if let Some(hint) = &self.descriptor.search_hint {
            let mut search_roots = vec![PathBuf::from("/usr/local")];
            search_roots.extend(self.options.home_dir.clone());
            for search_root in search_roots {
                for entry in self.hinted_entries(&search_root, hint) {
                    let name = format!("Installation under {} ({})", search_root.display(), entry.display());
                    candidates.push(self.rooted(&name, Tier::WellKnown, &entry));
                }
            }
        }

        candidates
    }

    /// Directories directly below `root` whose name contains `hint`.
    fn hinted_entries(&self, root: &Path, hint: &str) -> Vec<PathBuf> {
        match self.fs.list_dir(root) {
            Ok(entries) => entries
                .into_iter()
                .filter(|entry| {
                    entry
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.contains(hint))
                        && self.fs.is_dir(entry)
                })
                .collect(),
            Err(e) => {
                debug!(root = %root.display(), error = %e, "Cannot scan directory");
                Vec::new()
            }
        }
    }

    fn download_fallback(&self) -> Vec<Candidate> {
        if self.package.download != DownloadPolicy::IfNeeded {
            return Vec::new();
        }
        self.download_candidate(Tier::Download)
            .map(|candidate| candidate.with_intent(format!("download-{}", self.descriptor.key), "if-needed"))
            .into_iter()
            .collect()
    }

    fn download_candidate(&self, tier: Tier) -> Option<Candidate> {
        let recipe = self.descriptor.download.as_ref()?;
        let install = self.options.install_dir(&self.descriptor.key)?;
        let lib_dir = install.join("lib");
        let libraries = LibraryGroup::new(
            recipe
                .libraries
                .iter()
                .map(|name| LibraryEntry::Path(lib_dir.join(name)))
                .collect(),
        );
        Some(
            Candidate::new(
                format!("Downloaded {}", self.descriptor.display_name),
                tier,
                vec![libraries],
                vec![IncludeGroup::single(install.join("include"))],
            )
            .with_install_dir(install),
        )
    }

    /// Candidate for an installation rooted at `root`.
    fn rooted(&self, name: &str, tier: Tier, root: &Path) -> Candidate {
        Candidate::new(
            name,
            tier,
            self.descriptor.libraries_in_root(root),
            vec![IncludeGroup::single(root.join("include"))],
        )
    }
}

/// Iterator over a generator's candidates.
pub struct Candidates<'g, 'a> {
    generator: &'g CandidateGenerator<'a>,
    pending: VecDeque<Candidate>,
    next_tier: usize,
    failed: bool,
}

impl Iterator for Candidates<'_, '_> {
    type Item = ConfigureResult<Candidate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(candidate) = self.pending.pop_front() {
                return Some(Ok(candidate));
            }
            let tier = *Tier::ALL.get(self.next_tier)?;
            self.next_tier += 1;
            match self.generator.expand(tier) {
                Ok(candidates) => {
                    if !candidates.is_empty() {
                        info!(
                            package = %self.generator.descriptor.key,
                            tier = %tier,
                            count = candidates.len(),
                            "Generated candidates"
                        );
                    }
                    self.pending.extend(candidates);
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
