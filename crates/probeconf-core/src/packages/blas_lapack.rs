//! BLAS and LAPACK, probed together as one Fortran library pair.

use crate::domain::{PackageDescriptor, RootVariant, lib};

pub fn descriptor() -> PackageDescriptor {
    PackageDescriptor {
        key: "blaslapack".to_string(),
        display_name: "BLAS/LAPACK".to_string(),
        substitution_prefix: "BLASLAPACK".to_string(),
        enabled_by_default: true,
        required_by_default: true,
        functions: vec!["ddot".to_string(), "dtrtrs".to_string()],
        fortran_mangle: true,
        library_layouts: vec![vec![lib("liblapack.a"), lib("libblas.a")]],
        default_libraries: vec![vec!["lapack".to_string(), "blas".to_string()]],
        root_variants: vec![RootVariant::new("", "User specified installation root")],
        project_locations: true,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_lapack_links_before_blas() {
        let descriptor = descriptor();
        let groups = descriptor.libraries_in(Path::new("/home/u/blaslapack/lib"));
        assert_eq!(
            groups[0].link_line(),
            "-L/home/u/blaslapack/lib -llapack -L/home/u/blaslapack/lib -lblas"
        );
        assert_eq!(descriptor.default_library_groups()[0].link_line(), "-llapack -lblas");
        assert!(descriptor.headers.is_empty());
    }
}
