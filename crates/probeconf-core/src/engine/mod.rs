//! The probe-and-select engine.
//!
//! - `generator` - lazy, tier-ordered candidate generation
//! - `probe` - symbol, header, link, version and shared checks
//! - `selector` - first-success or best-of-all selection
//! - `output` - substitutions and defines for a selection
//! - `configurator` - runs the above for every package

pub mod configurator;
pub mod generator;
pub mod output;
pub mod probe;
pub mod selector;

pub use configurator::{ConfigureReport, Configurator, PackageOutcome};
pub use generator::{CandidateGenerator, Candidates};
pub use output::OutputWriter;
pub use probe::Prober;
pub use selector::{SelectionPolicy, Selector, SelectorConfig, Verdict};
