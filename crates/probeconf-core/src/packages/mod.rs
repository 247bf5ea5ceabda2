//! Built-in package descriptors.
//!
//! Packages are configured in registry order, so a package is listed after
//! the packages it depends on.

pub mod blas_lapack;
pub mod chaco;
pub mod fortran_stubs;
pub mod mpi;
pub mod placeholders;
pub mod scotch;

use crate::domain::PackageDescriptor;

/// Every built-in package, in configure order.
pub fn builtin_packages() -> Vec<PackageDescriptor> {
    vec![
        mpi::descriptor(),
        blas_lapack::descriptor(),
        scotch::descriptor(),
        chaco::descriptor(),
        placeholders::adic(),
        placeholders::blocksolve(),
    ]
}

pub fn find(key: &str) -> Option<PackageDescriptor> {
    builtin_packages().into_iter().find(|descriptor| descriptor.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_come_first() {
        let packages = builtin_packages();
        for (index, package) in packages.iter().enumerate() {
            for dependency in &package.dependencies {
                let position = packages.iter().position(|p| &p.key == dependency);
                assert!(position.is_some_and(|p| p < index), "{} listed before {dependency}", package.key);
            }
        }
    }

    #[test]
    fn test_directory_patterns_compile() {
        for package in builtin_packages() {
            if let Some(pattern) = &package.directory_pattern {
                assert!(regex::Regex::new(pattern).is_ok(), "{pattern}");
            }
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find("chaco").unwrap().display_name, "Chaco");
        assert!(find("petsc").is_none());
    }
}
