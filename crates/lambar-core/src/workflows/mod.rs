//! # Workflows Module
//!
//! This module provides the high-level, user-facing entry points of lambar.
//! Each workflow ties the `core` and `engine` layers together into one complete
//! procedure, from input files to finished tables or schedules.
//!
//! ## Architecture
//!
//! - **Analysis Workflow** ([`analyze`]) - Reads one paired trajectory file and
//!   produces the full convergence table plus its headline summary
//! - **Optimization Workflow** ([`optimize`]) - Reads a λ grid and matching
//!   error values, redistributes the states, and optionally writes the
//!   per-state keyword files
//! - **Batch Workflow** ([`batch`]) - Sweeps many convergence tables, skipping
//!   malformed files, and aggregates their block statistics across windows

pub mod analyze;
pub mod batch;
pub mod optimize;
