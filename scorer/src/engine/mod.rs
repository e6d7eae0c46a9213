// scorer/src/engine/mod.rs

pub mod batch;
pub mod simulator;

pub use batch::{pair_seed, BatchRunner};
pub use simulator::{TrialSimulator, TrialStats};
