//! Cross-file error aggregation over convergence tables.
//!
//! A single convergence table describes one trajectory pair; a production
//! campaign produces one table per window. This module condenses each table
//! into a [`FileSummary`] of block-level statistics and collapses a column of
//! per-window errors into an [`ErrorSummary`] that weighs total error against
//! how evenly it is spread across windows.

use crate::engine::convergence::{ConvergenceRow, Regime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Cannot summarize an empty error list")]
    Empty,
    #[error("Error values sum to zero, ratios to the mean are undefined")]
    ZeroMean,
    #[error("Convergence table has no whole-trace row for regime '{0}'")]
    MissingRegime(&'static str),
    #[error("Convergence table has no block rows for regime '{0}'")]
    MissingBlocks(&'static str),
}

/// Spread-weighted condensation of a list of per-window errors.
///
/// `sum_squares` is the plain quadratic total. The two weighted sums divide
/// each square by the window's error relative to the mean (first order) or by
/// its normalized squared ratio (second order), so windows far above the mean
/// count for less. Comparing the three reveals whether total error is driven
/// by a few outliers or spread evenly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub sum_squares: f64,
    pub first_order: f64,
    pub second_order: f64,
    /// Largest error divided by the mean.
    pub max_ratio: f64,
    /// Smallest error divided by the mean.
    pub min_ratio: f64,
}

/// Collapses per-window error values into the three weighted sums plus
/// spread diagnostics.
pub fn summarize(errors: &[f64]) -> Result<ErrorSummary, AggregateError> {
    if errors.is_empty() {
        return Err(AggregateError::Empty);
    }
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    if mean == 0.0 {
        return Err(AggregateError::ZeroMean);
    }

    let sum_squares = errors.iter().map(|e| e * e).sum::<f64>();

    let ratios: Vec<f64> = errors.iter().map(|e| e / mean).collect();
    let squared: Vec<f64> = ratios.iter().map(|r| r * r).collect();
    let squared_mean = squared.iter().sum::<f64>() / squared.len() as f64;

    let first_order = errors
        .iter()
        .zip(&ratios)
        .map(|(e, r)| e * e / r)
        .sum::<f64>();
    let second_order = errors
        .iter()
        .zip(&squared)
        .map(|(e, s)| e * e / (s / squared_mean))
        .sum::<f64>();

    let max = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = errors.iter().copied().fold(f64::INFINITY, f64::min);

    Ok(ErrorSummary {
        sum_squares,
        first_order,
        second_order,
        max_ratio: max / mean,
        min_ratio: min / mean,
    })
}

/// Mean over a table's block rows plus the first block alone. The first
/// block covers the earliest simulation segment, so the gap between `first`
/// and `mean` exposes residual equilibration drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub mean: f64,
    pub first: f64,
}

impl BlockSummary {
    fn over(values: &[f64]) -> Self {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Self {
            mean,
            first: values[0],
        }
    }
}

/// Block-level condensation of one convergence table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    /// Estimate uncertainty over the raw-data blocks.
    pub sigma_raw: BlockSummary,
    /// Uncertainty over the equilibrated-and-decorrelated blocks.
    pub sigma_equilibrated: BlockSummary,
    /// Uncertainty over the decorrelated-only blocks.
    pub sigma_decorrelated: BlockSummary,
    /// Signed forward-minus-backward free-energy gap, raw blocks.
    pub directional_gap: BlockSummary,
    /// Quadrature sum of the directional spreads, raw blocks.
    pub directional_spread: BlockSummary,
    /// Eigenvalue overlap scalar, raw blocks.
    pub overlap_scalar: BlockSummary,
}

fn block_column<F>(rows: &[ConvergenceRow], regime: Regime, f: F) -> Result<Vec<f64>, AggregateError>
where
    F: Fn(&ConvergenceRow) -> f64,
{
    let values: Vec<f64> = rows
        .iter()
        .filter(|r| r.regime == regime && r.block.is_some())
        .map(|r| f(r))
        .collect();
    if values.is_empty() {
        return Err(AggregateError::MissingBlocks(regime.label()));
    }
    Ok(values)
}

/// Condenses the block rows of one convergence table. Block rows are keyed
/// by regime, so tables from runs too short for blocking are rejected.
pub fn summarize_blocks(rows: &[ConvergenceRow]) -> Result<FileSummary, AggregateError> {
    let sigma_raw = block_column(rows, Regime::All, |r| r.sigma)?;
    let sigma_equ = block_column(rows, Regime::Equ, |r| r.sigma)?;
    let sigma_dec = block_column(rows, Regime::Uncorr, |r| r.sigma)?;
    let gap = block_column(rows, Regime::All, |r| r.forward - r.backward)?;
    let spread = block_column(rows, Regime::All, |r| {
        (r.spread_forward * r.spread_forward + r.spread_backward * r.spread_backward).sqrt()
    })?;
    let overlap = block_column(rows, Regime::All, |r| r.overlap_scalar)?;

    Ok(FileSummary {
        sigma_raw: BlockSummary::over(&sigma_raw),
        sigma_equilibrated: BlockSummary::over(&sigma_equ),
        sigma_decorrelated: BlockSummary::over(&sigma_dec),
        directional_gap: BlockSummary::over(&gap),
        directional_spread: BlockSummary::over(&spread),
        overlap_scalar: BlockSummary::over(&overlap),
    })
}

/// Headline convergence figures drawn from the whole-trace rows of one
/// table. The equilibrated regime supplies the central estimate; the raw
/// regime supplies the conservative spread and overlap figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSummary {
    pub delta_f: f64,
    pub sigma_raw: f64,
    pub sigma_equilibrated: f64,
    pub sigma_decorrelated: f64,
    /// |forward − backward| free energy, equilibrated regime.
    pub free_energy_gap: f64,
    /// |forward − backward| mean energy gap, equilibrated regime.
    pub energy_gap: f64,
    /// Quadrature sum of the directional spreads, raw regime.
    pub directional_spread: f64,
    pub overlap_scalar_raw: f64,
    /// min of the two cross-ensemble overlap entries, raw regime.
    pub overlap_min_raw: f64,
    pub overlap_scalar_equilibrated: f64,
    pub overlap_min_equilibrated: f64,
}

fn whole_row(rows: &[ConvergenceRow], regime: Regime) -> Result<&ConvergenceRow, AggregateError> {
    rows.iter()
        .find(|r| r.regime == regime && r.block.is_none())
        .ok_or(AggregateError::MissingRegime(regime.label()))
}

/// Condenses the whole-trace rows of one convergence table.
pub fn summarize_convergence(
    rows: &[ConvergenceRow],
) -> Result<ConvergenceSummary, AggregateError> {
    let all = whole_row(rows, Regime::All)?;
    let uncorr = whole_row(rows, Regime::Uncorr)?;
    let equ = whole_row(rows, Regime::Equ)?;

    Ok(ConvergenceSummary {
        delta_f: equ.delta_f,
        sigma_raw: all.sigma,
        sigma_equilibrated: equ.sigma,
        sigma_decorrelated: uncorr.sigma,
        free_energy_gap: (equ.forward - equ.backward).abs(),
        energy_gap: (equ.gap_forward - equ.gap_backward).abs(),
        directional_spread: (all.spread_forward * all.spread_forward
            + all.spread_backward * all.spread_backward)
            .sqrt(),
        overlap_scalar_raw: all.overlap_scalar,
        overlap_min_raw: all.overlap_ab.min(all.overlap_ba),
        overlap_scalar_equilibrated: equ.overlap_scalar,
        overlap_min_equilibrated: equ.overlap_ab.min(equ.overlap_ba),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(regime: Regime, block: Option<usize>) -> ConvergenceRow {
        let label = match block {
            Some(i) => format!("block{}{}", i, regime.label()),
            None => regime.label().to_string(),
        };
        ConvergenceRow {
            label,
            regime,
            block,
            start_a: 0,
            end_a: 100,
            start_b: 0,
            end_b: 100,
            g_a: 1.0,
            g_b: 1.0,
            delta_f: 2.0,
            sigma: 0.1,
            forward: 2.1,
            backward: 1.9,
            gap_forward: 2.5,
            gap_backward: 1.5,
            spread_forward: 0.3,
            spread_backward: 0.4,
            overlap_ab: 0.4,
            overlap_ba: 0.45,
            overlap_scalar: 0.8,
        }
    }

    fn full_table() -> Vec<ConvergenceRow> {
        let mut rows = Vec::new();
        for regime in Regime::ORDER {
            rows.push(row(regime, None));
        }
        for regime in Regime::ORDER {
            for i in 1..=5 {
                let mut r = row(regime, Some(i));
                r.sigma = 0.1 * i as f64;
                rows.push(r);
            }
        }
        rows
    }

    #[test]
    fn uniform_errors_weigh_all_orders_equally() {
        let summary = summarize(&[0.5, 0.5, 0.5, 0.5]).unwrap();
        assert_relative_eq!(summary.sum_squares, 1.0);
        assert_relative_eq!(summary.first_order, 1.0);
        assert_relative_eq!(summary.second_order, 1.0);
        assert_relative_eq!(summary.max_ratio, 1.0);
        assert_relative_eq!(summary.min_ratio, 1.0);
    }

    #[test]
    fn outlier_is_downweighted_in_the_first_order_sum() {
        // mean = 2: the outlier's 25 shrinks to 25/2.5 = 10 in first_order,
        // while the mean normalization in second_order restores the
        // sub-mean terms (1.75 * (4 + 4 + 4 + 4) = 28).
        let summary = summarize(&[1.0, 1.0, 1.0, 5.0]).unwrap();
        assert_relative_eq!(summary.sum_squares, 28.0, epsilon = 1e-12);
        assert_relative_eq!(summary.first_order, 16.0, epsilon = 1e-12);
        assert_relative_eq!(summary.second_order, 28.0, epsilon = 1e-12);
        assert!(summary.first_order < summary.sum_squares);
        assert!(summary.max_ratio > 1.0 && summary.min_ratio < 1.0);
    }

    #[test]
    fn first_order_matches_direct_arithmetic() {
        let errors = [0.2, 0.4, 0.6];
        let mean = 0.4;
        let expected: f64 = errors.iter().map(|e| e * e / (e / mean)).sum();
        let summary = summarize(&errors).unwrap();
        assert_relative_eq!(summary.first_order, expected, epsilon = 1e-12);
    }

    #[test]
    fn empty_and_zero_mean_inputs_are_rejected() {
        assert!(matches!(summarize(&[]), Err(AggregateError::Empty)));
        assert!(matches!(
            summarize(&[1.0, -1.0]),
            Err(AggregateError::ZeroMean)
        ));
    }

    #[test]
    fn block_summary_separates_regimes() {
        let summary = summarize_blocks(&full_table()).unwrap();
        assert_relative_eq!(summary.sigma_raw.mean, 0.3, epsilon = 1e-12);
        assert_relative_eq!(summary.sigma_raw.first, 0.1, epsilon = 1e-12);
        assert_relative_eq!(summary.sigma_equilibrated.mean, 0.3, epsilon = 1e-12);
        assert_relative_eq!(summary.directional_gap.mean, 0.2, epsilon = 1e-12);
        assert_relative_eq!(summary.directional_spread.mean, 0.5, epsilon = 1e-12);
        assert_relative_eq!(summary.overlap_scalar.mean, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn block_summary_requires_block_rows() {
        let whole_only: Vec<_> = Regime::ORDER.iter().map(|&r| row(r, None)).collect();
        assert!(matches!(
            summarize_blocks(&whole_only),
            Err(AggregateError::MissingBlocks("all"))
        ));
    }

    #[test]
    fn convergence_summary_reads_whole_rows() {
        let mut rows = full_table();
        for r in rows.iter_mut().filter(|r| r.block.is_none()) {
            if r.regime == Regime::Equ {
                r.delta_f = 1.8;
                r.sigma = 0.05;
            }
        }
        let summary = summarize_convergence(&rows).unwrap();
        assert_relative_eq!(summary.delta_f, 1.8);
        assert_relative_eq!(summary.sigma_equilibrated, 0.05);
        assert_relative_eq!(summary.sigma_raw, 0.1);
        assert_relative_eq!(summary.free_energy_gap, 0.2, epsilon = 1e-12);
        assert_relative_eq!(summary.energy_gap, 1.0, epsilon = 1e-12);
        assert_relative_eq!(summary.overlap_min_raw, 0.4);
    }

    #[test]
    fn convergence_summary_requires_all_regimes() {
        let rows = vec![row(Regime::All, None), row(Regime::Uncorr, None)];
        assert!(matches!(
            summarize_convergence(&rows),
            Err(AggregateError::MissingRegime("equ"))
        ));
    }
}
