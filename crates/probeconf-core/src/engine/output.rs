//! Turning a selection into substitutions and defines.

use crate::domain::{PackageDescriptor, Selection};
use crate::sink::SubstitutionSink;

/// Writes one package's results into the shared sink.
///
/// With substitution prefix `P`: define `HAVE_P`, then `P_INCLUDE`,
/// `P_INCLUDE_DIR`, `P_LIB`, `P_LIBRARY`, `P_DIR` and `P_VERSION`, the
/// detected feature defines and located executables. Writing twice gives
/// the same sink.
pub struct OutputWriter<'a> {
    descriptor: &'a PackageDescriptor,
}

impl<'a> OutputWriter<'a> {
    pub const fn new(descriptor: &'a PackageDescriptor) -> Self {
        Self { descriptor }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.descriptor.substitution_prefix)
    }

    pub fn write_selection(&self, selection: &Selection, sink: &mut SubstitutionSink) {
        let includes = selection.includes();
        let libraries = selection.libraries();

        sink.add_define(&format!("HAVE_{}", self.descriptor.substitution_prefix), "1");
        sink.add_substitution(&self.key("INCLUDE"), includes.flags().join(" "));
        sink.add_substitution(
            &self.key("INCLUDE_DIR"),
            includes
                .first()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
        );
        sink.add_substitution(&self.key("LIB"), libraries.link_line());
        sink.add_substitution(
            &self.key("LIBRARY"),
            libraries
                .entries()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        );
        sink.add_substitution(
            &self.key("DIR"),
            libraries
                .directories()
                .iter()
                .map(|dir| dir.display().to_string())
                .collect::<Vec<_>>(),
        );
        sink.add_substitution(
            &self.key("VERSION"),
            selection
                .version()
                .map_or_else(|| "Unknown".to_string(), ToString::to_string),
        );

        for (name, value) in selection.defines() {
            sink.add_define(name, value.clone());
        }
        for (name, path) in selection.executables() {
            sink.add_substitution(name, path.display().to_string());
        }
    }

    /// Empty substitutions so downstream interpolation stays defined.
    pub fn write_not_found(&self, sink: &mut SubstitutionSink) {
        sink.add_substitution(&self.key("INCLUDE"), "");
        sink.add_substitution(&self.key("INCLUDE_DIR"), "");
        sink.add_substitution(&self.key("LIB"), "");
        sink.add_substitution(&self.key("LIBRARY"), Vec::<String>::new());
    }

    pub fn write_placeholders(&self, sink: &mut SubstitutionSink) {
        for placeholder in &self.descriptor.placeholders {
            sink.add_described(&placeholder.name, "", &placeholder.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candidate, IncludeGroup, LibraryGroup, Placeholder, ResolvedInstall, Tier, Version};
    use crate::sink::SubstitutionValue;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    fn descriptor() -> PackageDescriptor {
        PackageDescriptor {
            key: "mpi".into(),
            substitution_prefix: "MPI".into(),
            ..Default::default()
        }
    }

    fn selection() -> Selection {
        let libraries = LibraryGroup::in_dir(Path::new("/opt/mpich/lib"), &["libmpich.a", "libpmpich.a"]);
        Selection::new(
            Candidate::new("Default SUSE location", Tier::WellKnown, vec![libraries.clone()], vec![]),
            ResolvedInstall {
                libraries,
                includes: IncludeGroup::single("/opt/mpich/include"),
                version: Version::parse("1.2"),
                shared: false,
            },
            BTreeMap::from([("HAVE_MPI_FINT".to_string(), "1".to_string())]),
            BTreeMap::from([("MPIRUN".to_string(), PathBuf::from("/opt/mpich/bin/mpirun"))]),
        )
    }

    #[test]
    fn test_selection_substitutions() {
        let descriptor = descriptor();
        let mut sink = SubstitutionSink::new();
        OutputWriter::new(&descriptor).write_selection(&selection(), &mut sink);

        assert_eq!(sink.define("HAVE_MPI"), Some("1"));
        assert_eq!(sink.define("HAVE_MPI_FINT"), Some("1"));
        assert_eq!(sink.substitution("MPI_INCLUDE").unwrap().to_string(), "-I/opt/mpich/include");
        assert_eq!(sink.substitution("MPI_INCLUDE_DIR").unwrap().to_string(), "/opt/mpich/include");
        assert_eq!(
            sink.substitution("MPI_LIB").unwrap().to_string(),
            "-L/opt/mpich/lib -lmpich -L/opt/mpich/lib -lpmpich"
        );
        assert_eq!(
            sink.substitution("MPI_DIR"),
            Some(&SubstitutionValue::List(vec!["/opt/mpich/lib".into()]))
        );
        assert_eq!(sink.substitution("MPI_VERSION").unwrap().to_string(), "1.2");
        assert_eq!(sink.substitution("MPIRUN").unwrap().to_string(), "/opt/mpich/bin/mpirun");
    }

    #[test]
    fn test_writing_is_idempotent() {
        let descriptor = descriptor();
        let writer = OutputWriter::new(&descriptor);
        let mut once = SubstitutionSink::new();
        writer.write_selection(&selection(), &mut once);
        let mut twice = once.clone();
        writer.write_selection(&selection(), &mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_not_found_defines_empty_values() {
        let descriptor = descriptor();
        let mut sink = SubstitutionSink::new();
        OutputWriter::new(&descriptor).write_not_found(&mut sink);
        assert!(sink.define("HAVE_MPI").is_none());
        for key in ["MPI_INCLUDE", "MPI_INCLUDE_DIR", "MPI_LIB", "MPI_LIBRARY"] {
            assert!(sink.substitution(key).unwrap().is_empty(), "{key} should be empty");
        }
    }

    #[test]
    fn test_placeholders() {
        let descriptor = PackageDescriptor {
            key: "blocksolve".into(),
            placeholders: vec![Placeholder {
                name: "BLOCKSOLVE_LIB".into(),
                description: "BlockSolve libraries".into(),
            }],
            ..Default::default()
        };
        let mut sink = SubstitutionSink::new();
        OutputWriter::new(&descriptor).write_placeholders(&mut sink);
        assert!(sink.render_makefile().contains("# BlockSolve libraries\nBLOCKSOLVE_LIB = \n"));
    }
}
