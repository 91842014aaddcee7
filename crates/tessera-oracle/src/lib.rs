//! Temporal-formula construction and the external model-checking oracle.
//!
//! The checker is an opaque decision procedure: we hand it the negation of
//! a formula; a counterexample to the negation is a witness trace for the
//! formula. This crate builds the formulas, drives the checker subprocess,
//! parses its verdict and raw trace text, and validates the model contract.

pub mod formula;
pub mod gateway;
pub mod mock;
pub mod trace;
pub mod validate;

pub use formula::FormulaError;
pub use gateway::{CheckerConfig, NuXmvOracle, Oracle, OracleError, Verdict};
pub use mock::MockOracle;
pub use trace::{State, TraceError};
pub use validate::ContractError;
