//! Fundamental data structures for trajectory analysis and λ scheduling.
//!
//! Defines the evaluated-energy traces and paired ensembles read from
//! trajectory files, the reduced-potential matrix consumed by the estimator,
//! the multi-axis λ grid with its segment decomposition, and the plain
//! records holding estimates and their diagnostics.

pub mod estimate;
pub mod grid;
pub mod matrix;
pub mod trace;
