//! Pairwise coverage engine.
//!
//! One generation run drives a pluggable row-proposal strategy against
//! the oracle until every pair in the universe is classified, then
//! minimizes the discovered suite by greedy set cover and materializes
//! the retained artifacts.

pub mod artifacts;
pub mod coverage;
pub mod minimize;
pub mod rng;
pub mod runner;
pub mod strategy;

pub use artifacts::{filename_for_row, ArtifactError, ArtifactWriter};
pub use coverage::{CoverageState, PartitionError};
pub use minimize::{greedy_minimize, MinimizeError};
pub use rng::run_rng;
pub use runner::{run_generation, GenerationConfig, RunError, RunReport, Test};
pub use strategy::{DefaultFillStrategy, DirectStrategy, IpoStreamStrategy, Proposal, RowStrategy};
