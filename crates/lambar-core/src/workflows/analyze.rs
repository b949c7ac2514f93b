use crate::core::io::bar::{BarReadOptions, read_paired_trajectory_file};
use crate::engine::aggregate::{self, ConvergenceSummary};
use crate::engine::convergence::{self, AnalysisOptions, ConvergenceRow};
use crate::engine::error::AnalysisError;
use rand::Rng;
use std::path::Path;
use tracing::{info, instrument};

/// Complete output of one analysis run: the full convergence table and the
/// headline figures drawn from its whole-trace rows.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub rows: Vec<ConvergenceRow>,
    pub summary: ConvergenceSummary,
}

/// Analyzes one paired trajectory file end to end: parse, reduce, run all
/// three correlation regimes (whole-trace and block-wise), and summarize.
#[instrument(skip(read_options, analysis_options, rng), name = "analysis_workflow")]
pub fn run(
    path: &Path,
    read_options: &BarReadOptions,
    analysis_options: &AnalysisOptions,
    rng: &mut impl Rng,
) -> Result<AnalysisReport, AnalysisError> {
    info!("Reading paired trajectory from {}", path.display());
    let pair = read_paired_trajectory_file(path, read_options)?;
    info!(
        len_a = pair.leg_a().len(),
        len_b = pair.leg_b().len(),
        "Trajectory loaded, starting convergence analysis."
    );

    let rows = convergence::analyze(&pair, analysis_options, rng)?;
    let summary = aggregate::summarize_convergence(&rows)?;

    info!(
        delta_f = summary.delta_f,
        sigma = summary.sigma_equilibrated,
        overlap = summary.overlap_scalar_equilibrated,
        "Analysis complete."
    );
    Ok(AnalysisReport { rows, summary })
}
