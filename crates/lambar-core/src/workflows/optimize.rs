use crate::core::io::grid::{read_error_values_file, read_lambda_grid_file};
use crate::core::io::schedule::write_schedule;
use crate::engine::error::AnalysisError;
use crate::engine::schedule::{self, ScheduleResult};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Reads a λ grid and its matching per-interval error values, then
/// redistributes the states so that estimated error is equalized across the
/// new intervals. `target_points` of `None` keeps the current state count.
#[instrument(skip(target_points), name = "optimization_workflow")]
pub fn run(
    grid_path: &Path,
    errors_path: &Path,
    target_points: Option<usize>,
) -> Result<ScheduleResult, AnalysisError> {
    let grid = read_lambda_grid_file(grid_path)?;
    let errors = read_error_values_file(errors_path)?;
    info!(
        states = grid.len(),
        dims = grid.dims(),
        "Grid loaded, optimizing schedule."
    );

    let result = schedule::optimize(&grid, &errors, target_points)?;
    info!(
        states = result.grid.len(),
        digits = result.decimal_digits,
        "Schedule optimization complete."
    );
    Ok(result)
}

/// Writes an optimized schedule as one keyword file per state, named
/// `<prefix>.<index>`.
pub fn write(
    result: &ScheduleResult,
    variable_names: &[&str],
    prefix: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, AnalysisError> {
    let files = write_schedule(&result.grid, variable_names, prefix)?;
    info!(count = files.len(), "Schedule files written.");
    Ok(files)
}
