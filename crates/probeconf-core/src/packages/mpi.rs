//! MPI: MPICH, LAM, SGI and the Windows MPICH SDKs.

use crate::domain::{
    BuildStep, ConfigureArg, DownloadRecipe, ExecutableSearch, FeatureCheck, Language,
    LibraryTemplate, PackageDescriptor, RootVariant, TestProgram, lib,
};
use std::path::PathBuf;

const MPI_HEADER: &str = "#include <mpi.h>\n";
const SHARED_CHECK_INCLUDES: &str = "#define _GNU_SOURCE\n#include <dlfcn.h>\n#include <string.h>\n#include <mpi.h>\n";
const SHARED_CHECK_BODY: &str = "Dl_info lib, exe;\nint flag;\nif (!dladdr((void *) MPI_Init, &lib) || !dladdr((void *) main, &exe)) return 1;\nif (strcmp(lib.dli_fname, exe.dli_fname) == 0) return 1;\nif (MPI_Initialized(&flag)) return 1;\nif (flag) MPI_Finalize();\n";
const COMM_SIZE_BODY: &str = "MPI_Comm comm = MPI_COMM_WORLD;\nint size;\n\nMPI_Comm_size(comm, &size);\n";

pub fn descriptor() -> PackageDescriptor {
    PackageDescriptor {
        key: "mpi".to_string(),
        display_name: "MPI".to_string(),
        substitution_prefix: "MPI".to_string(),
        enabled_by_default: true,
        required_by_default: true,
        functions: vec!["MPI_Init".to_string(), "MPI_Comm_create".to_string()],
        fortran_mangle: false,
        headers: vec!["mpi.h".to_string()],
        extra_libraries: Vec::new(),
        library_layouts: library_layouts(),
        default_libraries: default_libraries(),
        root_variants: vec![
            RootVariant::new("", "User specified installation root"),
            RootVariant::new("SDK.gcc", "User specified installation root for cygwin"),
            RootVariant::new("SDK", "User specified installation root for MS Windows"),
        ],
        directory_pattern: Some("mpi(ch)?(-.*)?".to_string()),
        well_known_roots: vec![
            ("Default SUSE location".to_string(), PathBuf::from("/opt/mpich")),
            (
                "Frequent user install location (/usr/local)".to_string(),
                PathBuf::from("/usr/local"),
            ),
            (
                "Default MPICH install location (C:\\Program Files\\MPICH with MS compatible SDK)".to_string(),
                PathBuf::from("/cygdrive/c/Program Files/MPICH/SDK"),
            ),
            (
                "Default MPICH install location (C:\\Program Files\\MPICH with SDK.gcc)".to_string(),
                PathBuf::from("/cygdrive/c/Program Files/MPICH/SDK.gcc"),
            ),
        ],
        search_hint: Some("mpich".to_string()),
        project_locations: false,
        link_tests: vec![
            TestProgram::new(Language::C, MPI_HEADER, COMM_SIZE_BODY),
            TestProgram::new(Language::Cxx, MPI_HEADER, COMM_SIZE_BODY),
            TestProgram::new(
                Language::Fortran,
                "",
                "          integer comm,size,ierr\n          call MPI_Comm_size(comm, size, ierr)\n",
            ),
            TestProgram::new(Language::Fortran, "", "          call MPI_Init(ierr)\n"),
        ],
        version_program: Some(TestProgram::new(
            Language::C,
            "#include <stdio.h>\n#include <mpi.h>\n",
            "int ver, subver;\nif (MPI_Get_version(&ver, &subver)) return 1;\nprintf(\"%d.%d\\n\", ver, subver);\n",
        )),
        shared_check: Some(TestProgram::new(
            Language::C,
            SHARED_CHECK_INCLUDES,
            SHARED_CHECK_BODY,
        )),
        features: features(),
        executables: vec![ExecutableSearch {
            name: "mpirun".to_string(),
            substitution: "MPIRUN".to_string(),
        }],
        dependencies: Vec::new(),
        download: Some(download()),
        placeholders: Vec::new(),
    }
}

fn library_layouts() -> Vec<Vec<LibraryTemplate>> {
    vec![
        vec![lib("shared/libfmpich.a"), lib("shared/libmpich.a"), lib("libmpichfarg.a")],
        vec![lib("shared/libmpich.a")],
        vec![lib("shared/libmpi.a")],
        vec![lib("shared/libmpich.a"), lib("shared/libpmpich.a")],
        vec![lib("libfmpich.a"), lib("libmpich.a")],
        vec![lib("libmpich.a")],
        // LAM
        vec![lib("liblammpio.a"), lib("libpmpi.a"), lib("libmpi.a"), lib("liblam.a")],
        // SGI
        vec![lib("libmpi.a"), lib("libmpi++.a")],
        vec![lib("libmpi.a")],
        vec![lib("libmpich.a"), lib("libpmpich.a")],
        // MS Windows
        vec![lib("mpich.lib"), LibraryTemplate::System("ws2_32.lib".to_string())],
        vec![lib("libmpi.so")],
        vec![lib("libmpich.so")],
    ]
}

fn default_libraries() -> Vec<Vec<String>> {
    let groups: &[&[&str]] = &[
        &[],
        &["fmpich", "mpich"],
        &["mpich"],
        &["mpi", "mpi++"],
        &["mpi"],
        &["mpich", "pmpich"],
        &["lammpio", "pmpi", "lamf77mpi", "mpi", "lam"],
        &["lammpio", "pmpi", "lamf90mpi", "mpi", "lam"],
        &["lammpio", "pmpi", "mpi", "lam"],
    ];
    groups
        .iter()
        .map(|group| group.iter().map(ToString::to_string).collect())
        .collect()
}

fn features() -> Vec<FeatureCheck> {
    let links = |define: &str, body: &str| FeatureCheck::Links {
        define: define.to_string(),
        program: TestProgram::new(Language::C, MPI_HEADER, body),
    };
    let size_of = |define: &str, type_name: &str| FeatureCheck::SizeOf {
        define: define.to_string(),
        type_name: type_name.to_string(),
        header: "mpi.h".to_string(),
    };
    vec![
        links("HAVE_MPI_COMM_F2C", "MPI_Comm_f2c((MPI_Fint)0);\n"),
        links("HAVE_MPI_COMM_C2F", "MPI_Comm_c2f(MPI_COMM_WORLD);\n"),
        links("HAVE_MPI_FINT", "MPI_Fint a;\n(void)a;\n"),
        size_of("SIZEOF_MPI_COMM", "MPI_Comm"),
        size_of("SIZEOF_MPI_FINT", "MPI_Fint"),
    ]
}

fn download() -> DownloadRecipe {
    DownloadRecipe {
        urls: vec![
            "https://www.mpich.org/static/downloads/1.2.7p1/mpich.tar.gz".to_string(),
            "ftp://ftp.mcs.anl.gov/pub/mpi/mpich.tar.gz".to_string(),
        ],
        directory_prefix: "mpich".to_string(),
        libraries: vec!["libmpich.a".to_string(), "libpmpich.a".to_string()],
        build_files: Vec::new(),
        configure: Some(vec![
            ConfigureArg::Always("--prefix={prefix}".to_string()),
            ConfigureArg::Always("-cc={cc}".to_string()),
            ConfigureArg::WithLanguage {
                language: Language::Cxx,
                present: "-c++={cxx}".to_string(),
                absent: "--disable-c++".to_string(),
            },
            ConfigureArg::WithLanguage {
                language: Language::Fortran,
                present: "-fc={fc}".to_string(),
                absent: "--disable-f77 --disable-f90".to_string(),
            },
            ConfigureArg::Always("--without-mpe".to_string()),
            ConfigureArg::Always("-rsh=ssh".to_string()),
        ]),
        build: vec![BuildStep::new("make"), BuildStep::new("make install")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildVariables;
    use std::path::Path;

    #[test]
    fn test_layouts_cover_sgi_and_windows() {
        let groups = descriptor().libraries_in_root(Path::new("/opt/sgi"));
        assert!(groups.iter().any(|g| g.link_line() == "-L/opt/sgi/lib -lmpi -L/opt/sgi/lib -lmpi++"));
        assert!(groups.iter().any(|g| g.link_line() == "-L/opt/sgi/lib -lmpich -lws2_32"));
        assert!(groups.iter().any(|g| g.is_shared()));
    }

    #[test]
    fn test_first_default_group_is_empty() {
        let groups = descriptor().default_library_groups();
        assert!(groups[0].is_empty());
        assert_eq!(groups[2].link_line(), "-lmpich");
    }

    #[test]
    fn test_shared_check_compares_objects() {
        let program = descriptor().shared_check.unwrap();
        let source = program.source();
        assert!(source.contains("#include <dlfcn.h>"));
        assert!(source.contains("dladdr((void *) MPI_Init, &lib)"));
        assert!(source.contains("MPI_Initialized(&flag)"));
    }

    #[test]
    fn test_mpich_configure_arguments() {
        let vars = BuildVariables {
            prefix: PathBuf::from("/p/externalpackages/mpi/linux"),
            cc: "gcc".to_string(),
            cxx: Some("g++".to_string()),
            ..Default::default()
        };
        let args = download().configure_arguments(&vars).unwrap();
        assert_eq!(
            args,
            "--prefix=/p/externalpackages/mpi/linux -cc=gcc -c++=g++ --disable-f77 --disable-f90 --without-mpe -rsh=ssh"
        );
    }
}
