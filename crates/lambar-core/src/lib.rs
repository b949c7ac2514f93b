//! # lambar
//!
//! A library for free-energy estimation and λ-schedule optimization over
//! alchemical molecular-simulation trajectories, built around the two-state
//! MBAR estimator with correlation-aware resampling.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to keep the
//! numerics testable in isolation and the public surface small.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`EnergyTrace`,
//!   `LambdaGrid`, `ReducedPotentialMatrix`), numerical primitives (bisection,
//!   monotone interpolation, autocorrelation analysis), and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful algorithms: the MBAR solver,
//!   the estimate assembly, resampling and convergence scanning, the
//!   error-equalizing schedule optimizer, and cross-file aggregation.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures from input files
//!   to convergence tables, batch summaries, and schedule keyword files.
//!
//! Randomness never enters implicitly: every sampling routine takes a caller
//! provided generator, so any analysis is reproducible from a seed.

pub mod core;
pub mod engine;
pub mod workflows;
