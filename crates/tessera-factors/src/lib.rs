//! Factor model for pairwise scenario generation.
//!
//! A *factor* is one testing dimension with a finite, ordered domain of
//! values, each value backed by a temporal predicate over the transition
//! model. This crate owns the normalized factor model, the pair universe,
//! full-row assignments and their canonical keys, and the configuration
//! document they are loaded from.

pub mod config;
pub mod factor;
pub mod pair;
pub mod value;

pub use config::{FactorConfig, ConfigError};
pub use factor::{Factor, FactorKind, FactorSet};
pub use pair::{pair_universe, pairs_in_row, row_satisfies, Pair, Row, RowKey};
pub use value::FactorValue;
