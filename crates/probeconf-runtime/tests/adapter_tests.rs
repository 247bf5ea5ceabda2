//! Filesystem and toolchain adapters on the host.
//!
//! Toolchain tests return early when no C compiler is installed.

use probeconf_core::domain::{Language, TestProgram};
use probeconf_core::flags::FlagContext;
use probeconf_core::options::CompilerOptions;
use probeconf_core::ports::{FileSystemProbe, Toolchain};
use probeconf_runtime::{CcToolchain, HostFileSystem};
use std::fs;
use std::path::PathBuf;

fn host_toolchain() -> Option<CcToolchain> {
    let options = CompilerOptions {
        cc: None,
        cxx: Some("0".to_string()),
        fc: Some("0".to_string()),
    };
    CcToolchain::detect(&options).ok()
}

#[test]
fn test_list_dir_is_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["mpich-2", "blas", "mpich-1"] {
        fs::create_dir(dir.path().join(name)).unwrap();
    }
    let fs_probe = HostFileSystem::new();
    let names: Vec<PathBuf> = fs_probe
        .list_dir(dir.path())
        .unwrap()
        .into_iter()
        .map(|p| PathBuf::from(p.file_name().unwrap()))
        .collect();
    assert_eq!(names, vec![PathBuf::from("blas"), PathBuf::from("mpich-1"), PathBuf::from("mpich-2")]);
    assert!(fs_probe.list_dir(&dir.path().join("missing")).is_err());
}

#[test]
fn test_find_executable_prefers_extra_paths() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("bin");
    fs::create_dir(&bin).unwrap();
    fs::write(bin.join("mpirun"), "").unwrap();

    let fs_probe = HostFileSystem::new();
    assert_eq!(fs_probe.find_executable("mpirun", &[bin.clone()]), Some(bin.join("mpirun")));
    assert_eq!(fs_probe.find_executable("probeconf-no-such-tool", &[bin]), None);
}

#[test]
fn test_links_only_defined_symbols() {
    let Some(toolchain) = host_toolchain() else {
        return;
    };
    let flags = FlagContext::default();
    let present = TestProgram::new(Language::C, "#include <stdio.h>\n", "printf(\"hi\\n\");\n");
    assert!(toolchain.compile_and_link(&flags, &present).unwrap().success);

    let missing = TestProgram::symbol_reference("probeconf_no_such_symbol");
    let outcome = toolchain.compile_and_link(&flags, &missing).unwrap();
    assert!(!outcome.success);
    assert!(outcome.log.contains("conftest.c"));
}

#[test]
fn test_preprocess_reports_missing_header() {
    let Some(toolchain) = host_toolchain() else {
        return;
    };
    let flags = FlagContext::default();
    assert!(toolchain.preprocess(&flags, "#include <stdio.h>\n").unwrap().success);
    assert!(!toolchain.preprocess(&flags, "#include <probeconf_missing.h>\n").unwrap().success);
}

#[test]
fn test_run_captures_stdout() {
    let Some(toolchain) = host_toolchain() else {
        return;
    };
    let program = TestProgram::new(Language::C, "#include <stdio.h>\n", "printf(\"1.2\\n\");\n");
    let outcome = toolchain.run(&FlagContext::default(), &program).unwrap();
    assert!(outcome.succeeded());
    assert_eq!(outcome.stdout, "1.2\n");
    assert!(!toolchain.has_language(Language::Fortran));
}
