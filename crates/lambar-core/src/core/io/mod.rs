//! Provides input/output functionality for the tool's file formats.
//!
//! Covers the paired trajectory files produced by alchemical simulations
//! (Tinker BAR layout), the whitespace-separated λ grid and error-value
//! inputs of the schedule optimizer, and the per-state keyword files an
//! optimized schedule is written back as.

pub mod bar;
pub mod grid;
pub mod schedule;
