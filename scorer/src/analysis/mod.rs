// scorer/src/analysis/mod.rs
//
// Descriptive statistics layered over the catalog.  None of these feed back
// into the simulator; they only annotate results.

pub mod coverage;
pub mod entropy;
pub mod independence;
pub mod phase;
pub mod verify;

pub use coverage::coverage;
pub use entropy::summarize;
pub use independence::{discover_independent_sets, IndependenceReport};
pub use phase::classify;
pub use verify::las_vegas_verify;
