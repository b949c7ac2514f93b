//! # Engine Module
//!
//! This module implements the stateful analysis algorithms of lambar: free-energy
//! estimation over paired alchemical trajectories, correlation-aware resampling,
//! convergence scanning, schedule optimization, and cross-file aggregation.
//!
//! ## Overview
//!
//! The engine sits between the stateless `core` layer (data models, numerical
//! primitives, file I/O) and the user-facing `workflows` layer. Every algorithm
//! here consumes plain `core` types and returns plain results; randomness enters
//! only through caller-provided generators, so runs are reproducible by seed.
//!
//! ## Architecture
//!
//! - **Estimation** ([`mbar`], [`estimator`]) - The two-state MBAR solver and the
//!   full estimate assembly (directional averages, gaps, overlap diagnostics)
//! - **Resampling** ([`resampler`]) - Equilibration trimming, decorrelated
//!   subsampling, and sample-count balancing between legs
//! - **Convergence** ([`convergence`]) - Whole-trace and block-wise regime scans
//!   producing the tabular convergence report
//! - **Scheduling** ([`schedule`]) - Error-equalizing redistribution of λ states
//!   along a multi-axis schedule
//! - **Aggregation** ([`aggregate`]) - Condensation of convergence tables across
//!   many window files
//! - **Error Handling** ([`error`]) - The pipeline-level error umbrella

pub mod aggregate;
pub mod convergence;
pub mod error;
pub mod estimator;
pub mod mbar;
pub mod resampler;
pub mod schedule;
