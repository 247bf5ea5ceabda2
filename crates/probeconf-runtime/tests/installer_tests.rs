//! Source installer tests against local tarballs.

use flate2::Compression;
use flate2::write::GzEncoder;
use probeconf_core::domain::{BuildFile, BuildStep, BuildVariables, DownloadRecipe};
use probeconf_core::ports::{InstallError, InstallPlan, Installer};
use probeconf_core::testing::RecordingShell;
use probeconf_runtime::{SourceInstaller, SystemShell};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

fn tarball(dir: &Path) -> PathBuf {
    let archive = dir.join("demo-1.0.tar.gz");
    let file = File::create(&archive).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let content = b"!<arch>\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "demo-1.0/libdemo.a", &content[..])
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
    archive
}

fn plan(root: &Path, urls: Vec<String>) -> InstallPlan {
    let download_root = root.join("externalpackages");
    InstallPlan {
        package: "demo".to_string(),
        recipe: DownloadRecipe {
            urls,
            directory_prefix: "demo".to_string(),
            libraries: vec!["libdemo.a".to_string()],
            build_files: vec![BuildFile {
                path: "make.inc".to_string(),
                template: "CC = {cc}\n".to_string(),
            }],
            configure: None,
            build: vec![BuildStep::new(
                "mkdir -p {prefix}/lib && cp libdemo.a {prefix}/lib/ && echo built >> {prefix}/build.log",
            )],
        },
        variables: BuildVariables {
            prefix: download_root.join("demo").join("linux"),
            cc: "cc".to_string(),
            ..Default::default()
        },
        download_root,
    }
}

#[test]
fn test_installs_from_local_tarball_and_caches() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = tarball(scratch.path());
    let plan = plan(
        scratch.path(),
        vec![
            "ftp://example.invalid/demo.tar.gz".to_string(),
            format!("file://{}", archive.display()),
        ],
    );
    let installer = SourceInstaller::new(SystemShell::new().unwrap()).unwrap();

    let installed = installer.install(&plan).unwrap();
    assert_eq!(installed, plan.variables.prefix);
    assert!(installed.join("lib/libdemo.a").is_file());
    assert!(installed.join("config.args").is_file());

    let source = plan.download_root.join("demo-1.0");
    assert_eq!(fs::read_to_string(source.join("make.inc")).unwrap(), "CC = cc\n");
    assert!(!plan.download_root.join("demo-1.0.tar.gz").exists());

    installer.install(&plan).unwrap();
    let log = fs::read_to_string(installed.join("build.log")).unwrap();
    assert_eq!(log.lines().count(), 1, "second install should reuse the build");
}

#[test]
fn test_missing_libraries_after_build() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = tarball(scratch.path());
    let plan = plan(scratch.path(), vec![format!("file://{}", archive.display())]);
    let installer = SourceInstaller::new(RecordingShell::new()).unwrap();

    let err = installer.install(&plan).unwrap_err();
    match err {
        InstallError::LibrariesMissing { missing, .. } => assert_eq!(missing, vec!["libdemo.a"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_build_commands_are_rendered_in_source_dir() {
    let scratch = tempfile::tempdir().unwrap();
    let archive = tarball(scratch.path());
    let plan = plan(scratch.path(), vec![format!("file://{}", archive.display())]);
    let shell = RecordingShell::new();
    let installer = SourceInstaller::new(&shell).unwrap();

    let _ = installer.install(&plan);
    let commands = shell.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].command.starts_with(&format!(
        "mkdir -p {}/lib",
        plan.variables.prefix.display()
    )));
    assert_eq!(commands[0].cwd.as_deref(), Some(plan.download_root.join("demo-1.0").as_path()));
}

#[test]
fn test_unreachable_sources() {
    let scratch = tempfile::tempdir().unwrap();
    let plan = plan(
        scratch.path(),
        vec![
            "ftp://example.invalid/demo.tar.gz".to_string(),
            format!("file://{}/missing.tar.gz", scratch.path().display()),
        ],
    );
    let installer = SourceInstaller::new(SystemShell::new().unwrap()).unwrap();

    let err = installer.install(&plan).unwrap_err();
    assert!(matches!(err, InstallError::Download { .. }));
    assert!(err.to_string().contains("unsupported URL scheme"));
}
