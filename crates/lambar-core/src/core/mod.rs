//! # Core Module
//!
//! This module provides the stateless building blocks of lambar: the data
//! models for trajectories, schedules, and estimates, the numerical
//! primitives the algorithms are built from, and the file formats the tool
//! reads and writes.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Energy traces, paired ensembles, reduced
//!   potential matrices, λ grids, and estimate/diagnostic records
//! - **Numerical Primitives** ([`stats`]) - Bounded bisection, monotone
//!   interpolation, and autocorrelation analysis of time series
//! - **File I/O** ([`io`]) - Paired trajectory files, λ grid and error-value
//!   inputs, and per-state schedule keyword files
//!
//! Nothing in this layer holds algorithm state; everything is a plain value
//! or a pure function, which keeps the numerics testable in isolation.

pub mod io;
pub mod models;
pub mod stats;
