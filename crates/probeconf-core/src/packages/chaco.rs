//! Chaco graph partitioning. Ships no header.

use crate::domain::{BuildFile, BuildStep, DownloadRecipe, PackageDescriptor, RootVariant, lib};

const MAKE_INC: &str = "CC = {cc}\nCFLAGS = {cflags}\nOFLAGS = {cflags}\n";

pub fn descriptor() -> PackageDescriptor {
    PackageDescriptor {
        key: "chaco".to_string(),
        display_name: "Chaco".to_string(),
        substitution_prefix: "CHACO".to_string(),
        functions: vec!["interface".to_string()],
        extra_libraries: vec!["-lm".to_string()],
        library_layouts: vec![vec![lib("libchaco.a")]],
        default_libraries: vec![vec!["chaco".to_string()]],
        root_variants: vec![RootVariant::new("", "User specified installation root")],
        download: Some(DownloadRecipe {
            urls: vec![
                "https://web.cels.anl.gov/projects/petsc/download/externalpackages/Chaco-2.2.tar.gz".to_string(),
                "ftp://ftp.mcs.anl.gov/pub/petsc/externalpackages/Chaco-2.2.tar.gz".to_string(),
            ],
            directory_prefix: "Chaco".to_string(),
            libraries: vec!["libchaco.a".to_string()],
            build_files: vec![BuildFile {
                path: "make.inc".to_string(),
                template: MAKE_INC.to_string(),
            }],
            configure: None,
            build: vec![
                BuildStep::new("make clean && make").in_subdir("code"),
                BuildStep::new(
                    "mkdir -p {prefix}/lib && {ar} {arflags} {prefix}/lib/libchaco.a `find {source}/code -name '*.o'` \
                     && {ar} d {prefix}/lib/libchaco.a main.o && {ranlib} {prefix}/lib/libchaco.a",
                ),
            ],
        }),
        ..Default::default()
    }
}
