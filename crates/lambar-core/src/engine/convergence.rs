use crate::core::models::trace::PairedEnsemble;
use crate::core::stats::timeseries::DEFAULT_BLOCK_HINT;
use crate::engine::error::AnalysisError;
use crate::engine::estimator;
use crate::engine::resampler::{self, ResampleOptions};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Correlation-handling regime of one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// No correlation handling.
    All,
    /// Decorrelation only.
    Uncorr,
    /// Equilibration trim plus decorrelation.
    Equ,
}

impl Regime {
    pub const ORDER: [Regime; 3] = [Regime::All, Regime::Uncorr, Regime::Equ];

    pub fn label(&self) -> &'static str {
        match self {
            Regime::All => "all",
            Regime::Uncorr => "uncorr",
            Regime::Equ => "equ",
        }
    }

    fn resample_options(&self, min_floor: usize, block_hint: usize) -> ResampleOptions {
        let (equilibrate, decorrelate) = match self {
            Regime::All => (false, false),
            Regime::Uncorr => (false, true),
            Regime::Equ => (true, true),
        };
        ResampleOptions {
            equilibrate,
            decorrelate,
            min_floor,
            block_hint,
        }
    }
}

/// One row of the convergence table: the estimate of a single regime over
/// the whole pair or over one contiguous block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRow {
    /// Table key, e.g. `equ` or `block3all`.
    pub label: String,
    pub regime: Regime,
    /// Block number (1-based); `None` for whole-trace rows.
    pub block: Option<usize>,
    pub start_a: usize,
    pub end_a: usize,
    pub start_b: usize,
    pub end_b: usize,
    pub g_a: f64,
    pub g_b: f64,
    pub delta_f: f64,
    pub sigma: f64,
    pub forward: f64,
    pub backward: f64,
    pub gap_forward: f64,
    pub gap_backward: f64,
    pub spread_forward: f64,
    pub spread_backward: f64,
    pub overlap_ab: f64,
    pub overlap_ba: f64,
    pub overlap_scalar: f64,
}

impl ConvergenceRow {
    /// Absolute discrepancy between the directional estimates.
    pub fn directional_discrepancy(&self) -> f64 {
        (self.forward - self.backward).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Number of contiguous blocks for the block-convergence scan.
    pub block_count: usize,
    /// Minimum per-leg samples required per block (and bootstrap floor).
    pub min_floor: usize,
    /// Scan resolution for equilibration detection.
    pub block_hint: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            block_count: 5,
            min_floor: 100,
            block_hint: DEFAULT_BLOCK_HINT,
        }
    }
}

/// Runs the estimator over all three correlation-handling regimes on the
/// whole pair, then over contiguous blocks per regime when each leg carries
/// at least `min_floor × block_count` samples. Rows come out in regime order,
/// whole-trace first, exactly as keyed in the table.
#[instrument(skip_all, name = "convergence_analysis", fields(len_a = pair.leg_a().len(), len_b = pair.leg_b().len()))]
pub fn analyze(
    pair: &PairedEnsemble,
    options: &AnalysisOptions,
    rng: &mut impl Rng,
) -> Result<Vec<ConvergenceRow>, AnalysisError> {
    let len_a = pair.leg_a().len();
    let len_b = pair.leg_b().len();
    let mut rows = Vec::new();

    for regime in Regime::ORDER {
        let mut row = run_regime(pair, regime, options, rng)?;
        row.end_a = len_a;
        row.end_b = len_b;
        rows.push(row);
    }

    let block_a = len_a / options.block_count.max(1);
    let block_b = len_b / options.block_count.max(1);
    if len_a.min(len_b) >= options.block_count * options.min_floor
        && block_a > 0
        && block_b > 0
    {
        for regime in Regime::ORDER {
            for i in 0..options.block_count {
                let Some(sub_pair) = PairedEnsemble::new(
                    pair.leg_a().window(block_a * i, block_a * (i + 1)),
                    pair.leg_b().window(block_b * i, block_b * (i + 1)),
                ) else {
                    continue;
                };
                let mut row = run_regime(&sub_pair, regime, options, rng)?;
                row.label = format!("block{}{}", i + 1, regime.label());
                row.block = Some(i + 1);
                row.start_a = block_a * i;
                row.end_a = block_a * (i + 1);
                row.start_b = block_b * i;
                row.end_b = block_b * (i + 1);
                rows.push(row);
            }
        }
    } else {
        debug!(
            len_a,
            len_b,
            required = options.block_count * options.min_floor,
            "Too few samples for block analysis; emitting whole-trace rows only"
        );
    }

    Ok(rows)
}

fn run_regime(
    pair: &PairedEnsemble,
    regime: Regime,
    options: &AnalysisOptions,
    rng: &mut impl Rng,
) -> Result<ConvergenceRow, AnalysisError> {
    let resample_options = regime.resample_options(options.min_floor, options.block_hint);
    let (balanced, report) = resampler::balance(pair, &resample_options, rng)?;
    let matrix = estimator::build_matrix(&balanced);
    let estimate = estimator::estimate(&matrix, report.effective_size)?;

    Ok(ConvergenceRow {
        label: regime.label().to_string(),
        regime,
        block: None,
        start_a: report.t_a,
        end_a: pair.leg_a().len(),
        start_b: report.t_b,
        end_b: pair.leg_b().len(),
        g_a: report.g_a,
        g_b: report.g_b,
        delta_f: estimate.delta_f,
        sigma: estimate.sigma,
        forward: estimate.forward,
        backward: estimate.backward,
        gap_forward: estimate.gap_forward,
        gap_backward: estimate.gap_backward,
        spread_forward: estimate.spread_forward,
        spread_backward: estimate.spread_backward,
        overlap_ab: estimate.overlap.a_in_b(),
        overlap_ba: estimate.overlap.b_in_a(),
        overlap_scalar: estimate.overlap.scalar,
    })
}

/// Serializes a convergence table as CSV, one record per row.
pub fn write_table<W: std::io::Write>(
    rows: &[ConvergenceRow],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Reads a convergence table previously written by [`write_table`].
pub fn read_table<R: std::io::Read>(reader: R) -> Result<Vec<ConvergenceRow>, csv::Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader.deserialize().collect()
}
