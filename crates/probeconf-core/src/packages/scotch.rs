//! PT-Scotch graph partitioning, built against the selected MPI.

use crate::domain::{BuildFile, BuildStep, DownloadRecipe, PackageDescriptor, RootVariant, lib};

const MAKEFILE_INC: &str = "\
EXE\t=
LIB\t= .a
OBJ\t= .o

MAKE\t= make
AR\t= {ar}
ARFLAGS\t= {arflags}
CAT\t= cat
CC\t= {cc}
CCD\t= {cc}
CCS\t= {cc}
CCP\t= {cc}
CFLAGS\t= {cflags} -DCOMMON_PTHREAD -DCOMMON_RANDOM_FIXED_SEED -DSCOTCH_RENAME -Drestrict=\"\" -DINTSIZE32
LDFLAGS\t= -lm
CP\t= cp
LEX\t= flex
LN\t= ln
MKDIR\t= mkdir
MV\t= mv
RANLIB\t= {ranlib}
YACC\t= bison -y
";

const LIBRARIES: [&str; 3] = ["libptesmumps.a", "libptscotch.a", "libptscotcherr.a"];

pub fn descriptor() -> PackageDescriptor {
    PackageDescriptor {
        key: "scotch".to_string(),
        display_name: "Scotch".to_string(),
        substitution_prefix: "SCOTCH".to_string(),
        functions: vec!["SCOTCH_archBuild".to_string()],
        headers: vec!["ptscotch.h".to_string()],
        extra_libraries: vec!["-lm".to_string()],
        library_layouts: vec![LIBRARIES.iter().map(|name| lib(name)).collect()],
        default_libraries: vec![vec![
            "ptesmumps".to_string(),
            "ptscotch".to_string(),
            "ptscotcherr".to_string(),
        ]],
        root_variants: vec![RootVariant::new("", "User specified installation root")],
        dependencies: vec!["mpi".to_string()],
        download: Some(DownloadRecipe {
            urls: vec![
                "https://web.cels.anl.gov/projects/petsc/download/externalpackages/scotch_5.1.11_esmumps.tar.gz"
                    .to_string(),
                "https://gforge.inria.fr/frs/download.php/28044/scotch_5.1.11_esmumps.tar.gz".to_string(),
            ],
            directory_prefix: "scotch".to_string(),
            libraries: LIBRARIES.iter().map(ToString::to_string).collect(),
            build_files: vec![BuildFile {
                path: "src/Makefile.inc".to_string(),
                template: MAKEFILE_INC.to_string(),
            }],
            configure: None,
            build: vec![
                BuildStep::new("make clean ptscotch").in_subdir("src"),
                BuildStep::new(
                    "mkdir -p {prefix}/lib {prefix}/include && cp -f lib/*.a {prefix}/lib/ && cp -f include/*.h {prefix}/include/",
                ),
            ],
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildVariables;
    use std::path::PathBuf;

    #[test]
    fn test_makefile_inc_uses_toolchain() {
        let descriptor = descriptor();
        let recipe = descriptor.download.as_ref().unwrap();
        let vars = BuildVariables {
            prefix: PathBuf::from("/p/externalpackages/scotch/linux"),
            cc: "mpicc".to_string(),
            cflags: "-O2".to_string(),
            ar: "ar".to_string(),
            arflags: "cr".to_string(),
            ranlib: "ranlib".to_string(),
            ..Default::default()
        };
        let text = vars.render(&recipe.build_files[0].template);
        assert!(text.contains("AR\t= ar\nARFLAGS\t= cr\n"));
        assert!(text.contains("CCP\t= mpicc\n"));
        assert!(text.contains("CFLAGS\t= -O2 -DCOMMON_PTHREAD"));
        assert!(recipe.fingerprint(&vars).starts_with("src/Makefile.inc:"));
    }

    #[test]
    fn test_scotch_needs_mpi_and_is_opt_in() {
        let descriptor = descriptor();
        assert_eq!(descriptor.dependencies, vec!["mpi"]);
        assert!(!descriptor.enabled_by_default);
        assert_eq!(descriptor.extra_libraries, vec!["-lm"]);
    }
}
