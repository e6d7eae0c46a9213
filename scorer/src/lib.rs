// scorer/src/lib.rs
//
// Scenario scorer: Monte Carlo success estimation for multi-step scenarios,
// with transition entropy, phase classification, co-occurrence independence
// analysis and clustering detection layered on top.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod external;
pub mod model;
pub mod report;

pub use catalog::Catalog;
pub use config::EngineConfig;
pub use engine::BatchRunner;
pub use error::{ErrorKind, Result, ScorerError};
pub use report::ValidationSummary;
