//! Numerical primitives shared across the analysis algorithms.
//!
//! Contains bounded root bisection with bracket validation, piecewise
//! interpolants (monotone shape-preserving cubic and previous-value step),
//! and autocorrelation analysis of correlated time series.

pub mod bisect;
pub mod interp;
pub mod timeseries;
