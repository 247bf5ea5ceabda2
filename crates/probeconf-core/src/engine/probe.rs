//! Probing one candidate with minimal compile and link tests.

use crate::domain::{
    Candidate, FeatureCheck, IncludeGroup, Language, LibraryGroup, PackageDescriptor,
    ProbeFailure, ProbeResult, ResolvedInstall, Selection, TestProgram, Version,
};
use crate::error::ConfigureResult;
use crate::flags::FlagContext;
use crate::ports::Toolchain;
use std::collections::BTreeMap;
use tracing::debug;

/// Runs the probe stages for one package.
pub struct Prober<'a> {
    toolchain: &'a dyn Toolchain,
    descriptor: &'a PackageDescriptor,
    can_execute: bool,
    dependency_libs: Vec<String>,
    dependency_includes: Vec<String>,
}

impl<'a> Prober<'a> {
    pub fn new(toolchain: &'a dyn Toolchain, descriptor: &'a PackageDescriptor, can_execute: bool) -> Self {
        Self {
            toolchain,
            descriptor,
            can_execute,
            dependency_libs: Vec::new(),
            dependency_includes: Vec::new(),
        }
    }

    /// Add the flags of a package this one builds on.
    #[must_use]
    pub fn with_dependency(mut self, dependency: &Selection) -> Self {
        self.dependency_includes.extend(dependency.includes().flags());
        self.dependency_libs.extend(dependency.libraries().link_args());
        self
    }

    /// Probe `candidate`. Every flag change is undone before returning.
    ///
    /// Library groups are tried in order; for each one that defines every
    /// required symbol the include groups are tried in order. The first
    /// pair passing every stage wins. On failure the reason from the
    /// furthest stage reached is reported.
    pub fn probe(&self, flags: &mut FlagContext, candidate: &Candidate) -> ConfigureResult<ProbeResult> {
        debug!(package = %self.descriptor.key, candidate = %candidate, "Probing candidate");
        if candidate.libraries().is_empty() {
            return Ok(ProbeResult::failure(candidate.clone(), ProbeFailure::NoLibraries));
        }

        let default_includes = [IncludeGroup::default()];
        let include_groups = if candidate.includes().is_empty() {
            &default_includes[..]
        } else {
            candidate.includes()
        };

        let mut furthest: Option<ProbeFailure> = None;
        let mut record = |failure: ProbeFailure| {
            if furthest.as_ref().is_none_or(|f| failure.stage() > f.stage()) {
                furthest = Some(failure);
            }
        };

        for libraries in candidate.libraries() {
            if let Some(failure) = self.check_symbols(flags, libraries)? {
                record(failure);
                continue;
            }
            for includes in include_groups {
                if let Some(failure) = self.check_headers(flags, libraries, includes)? {
                    record(failure);
                    continue;
                }
                if let Some(failure) = self.check_working_link(flags, libraries, includes)? {
                    record(failure);
                    continue;
                }
                let version = self.detect_version(flags, libraries, includes)?;
                let shared = self.detect_shared(flags, libraries, includes)?;
                let resolved = ResolvedInstall {
                    libraries: libraries.clone(),
                    includes: includes.clone(),
                    version,
                    shared,
                };
                debug!(
                    package = %self.descriptor.key,
                    libraries = %libraries,
                    includes = %includes,
                    "Candidate works"
                );
                return Ok(ProbeResult::success(candidate.clone(), resolved));
            }
        }

        let failure = furthest.unwrap_or(ProbeFailure::NoLibraries);
        debug!(package = %self.descriptor.key, candidate = %candidate, reason = %failure, "Candidate rejected");
        Ok(ProbeResult::failure(candidate.clone(), failure))
    }

    /// Link arguments for `libraries` plus everything they need.
    fn link_arguments(&self, libraries: &LibraryGroup) -> Vec<String> {
        let mut args = libraries.link_args();
        args.extend(self.dependency_libs.iter().cloned());
        args.extend(self.descriptor.extra_libraries.iter().cloned());
        if self.descriptor.fortran_mangle {
            args.extend(self.toolchain.fortran_libs());
        }
        args
    }

    fn include_arguments(&self, includes: &IncludeGroup) -> Vec<String> {
        let mut args = includes.flags();
        args.extend(self.dependency_includes.iter().cloned());
        args
    }

    fn check_symbols(
        &self,
        flags: &mut FlagContext,
        libraries: &LibraryGroup,
    ) -> ConfigureResult<Option<ProbeFailure>> {
        let mut scope = flags.scoped();
        scope.prepend_libs(self.link_arguments(libraries));

        for function in &self.descriptor.functions {
            let symbol = if self.descriptor.fortran_mangle {
                self.toolchain.mangle(function)
            } else {
                function.clone()
            };
            let outcome = self
                .toolchain
                .compile_and_link(&scope, &TestProgram::symbol_reference(&symbol))?;
            debug!(symbol = %symbol, libraries = %libraries, success = outcome.success, "Checked symbol");
            if !outcome.success {
                return Ok(Some(ProbeFailure::MissingSymbol {
                    symbol,
                    libraries: libraries.to_string(),
                }));
            }
        }
        Ok(None)
    }

    fn check_headers(
        &self,
        flags: &mut FlagContext,
        libraries: &LibraryGroup,
        includes: &IncludeGroup,
    ) -> ConfigureResult<Option<ProbeFailure>> {
        if self.descriptor.headers.is_empty() {
            return Ok(None);
        }
        let mut scope = flags.scoped();
        scope.append_cppflags(self.include_arguments(includes));

        let source = TestProgram::header_inclusion(&self.descriptor.headers);
        let outcome = self.toolchain.preprocess(&scope, &source)?;
        debug!(includes = %includes, success = outcome.success, "Checked headers");
        if outcome.success {
            Ok(None)
        } else {
            Ok(Some(ProbeFailure::MissingHeader {
                headers: self.descriptor.headers.join(", "),
                libraries: libraries.to_string(),
            }))
        }
    }

    fn check_working_link(
        &self,
        flags: &mut FlagContext,
        libraries: &LibraryGroup,
        includes: &IncludeGroup,
    ) -> ConfigureResult<Option<ProbeFailure>> {
        let mut scope = flags.scoped();
        scope.append_cppflags(self.include_arguments(includes));
        scope.prepend_libs(self.link_arguments(libraries));

        for program in &self.descriptor.link_tests {
            if !self.toolchain.has_language(program.language) {
                continue;
            }
            let outcome = self.toolchain.compile_and_link(&scope, program)?;
            debug!(language = %program.language, success = outcome.success, "Checked working link");
            if !outcome.success {
                return Ok(Some(ProbeFailure::LinkTestFailed {
                    language: program.language,
                    libraries: libraries.to_string(),
                }));
            }
        }
        Ok(None)
    }

    fn detect_version(
        &self,
        flags: &mut FlagContext,
        libraries: &LibraryGroup,
        includes: &IncludeGroup,
    ) -> ConfigureResult<Option<Version>> {
        let Some(program) = &self.descriptor.version_program else {
            return Ok(None);
        };
        if !self.can_execute {
            return Ok(None);
        }
        let mut scope = flags.scoped();
        scope.append_cppflags(self.include_arguments(includes));
        scope.prepend_libs(self.link_arguments(libraries));

        let outcome = self.toolchain.run(&scope, program)?;
        if !outcome.succeeded() {
            debug!(package = %self.descriptor.key, "Version program did not run");
            return Ok(None);
        }
        Ok(Version::extract(&outcome.stdout))
    }

    /// Run the descriptor's shared-library program when programs can be
    /// executed. Without one, or when it does not compile, the file names
    /// of the library group decide.
    fn detect_shared(
        &self,
        flags: &mut FlagContext,
        libraries: &LibraryGroup,
        includes: &IncludeGroup,
    ) -> ConfigureResult<bool> {
        let Some(program) = self.descriptor.shared_check.as_ref().filter(|_| self.can_execute) else {
            return Ok(libraries.is_shared());
        };
        let mut scope = flags.scoped();
        scope.append_cppflags(self.include_arguments(includes));
        scope.prepend_libs(self.link_arguments(libraries));

        let outcome = self.toolchain.run(&scope, program)?;
        if !outcome.compiled {
            debug!(package = %self.descriptor.key, "Shared library check did not compile");
            return Ok(libraries.is_shared());
        }
        debug!(libraries = %libraries, status = ?outcome.status, "Checked shared libraries");
        Ok(outcome.succeeded())
    }

    /// Evaluate the descriptor's feature checks against the chosen install.
    pub fn detect_features(
        &self,
        flags: &mut FlagContext,
        resolved: &ResolvedInstall,
    ) -> ConfigureResult<BTreeMap<String, String>> {
        let mut defines = BTreeMap::new();
        let mut scope = flags.scoped();
        scope.append_cppflags(self.include_arguments(&resolved.includes));
        scope.prepend_libs(self.link_arguments(&resolved.libraries));

        for feature in &self.descriptor.features {
            match feature {
                FeatureCheck::Links { define, program } => {
                    if !self.toolchain.has_language(program.language) {
                        continue;
                    }
                    if self.toolchain.compile_and_link(&scope, program)?.success {
                        defines.insert(define.clone(), "1".to_string());
                    }
                }
                FeatureCheck::SizeOf {
                    define,
                    type_name,
                    header,
                } => {
                    if !self.can_execute {
                        debug!(type_name = %type_name, "Cannot run programs, skipping size check");
                        continue;
                    }
                    let program = TestProgram::new(
                        Language::C,
                        format!("#include <stdio.h>\n#include <{header}>\n"),
                        format!("printf(\"%d\\n\", (int) sizeof({type_name}));\n"),
                    );
                    let outcome = self.toolchain.run(&scope, &program)?;
                    if outcome.succeeded()
                        && let Ok(size) = outcome.stdout.trim().parse::<u32>()
                    {
                        defines.insert(define.clone(), size.to_string());
                    }
                }
            }
        }
        Ok(defines)
    }
}
