use crate::engine::aggregate::{self, ErrorSummary, FileSummary};
use crate::engine::convergence;
use crate::engine::error::AnalysisError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Block-level summary of one successfully parsed convergence table.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub summary: FileSummary,
}

/// Aggregated view over a whole campaign of convergence tables.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    /// Files that failed to parse or lacked block rows.
    pub skipped: usize,
    /// Cross-window condensation of the raw-block uncertainties.
    pub sigma_raw: Option<ErrorSummary>,
    /// Cross-window condensation of the equilibrated-block uncertainties.
    pub sigma_equilibrated: Option<ErrorSummary>,
}

/// Sweeps convergence tables across windows, condensing each table's block
/// rows and then the per-window uncertainty columns. Malformed files are
/// skipped with a diagnostic rather than aborting the sweep; a sweep in which
/// every file was skipped still reports, with both condensations absent.
#[instrument(skip_all, name = "batch_workflow", fields(files = paths.len()))]
pub fn run(paths: &[PathBuf]) -> Result<BatchReport, AnalysisError> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for path in paths {
        match summarize_file(path) {
            Ok(summary) => entries.push(BatchEntry {
                path: path.clone(),
                summary,
            }),
            Err(err) => {
                warn!("Skipping {}: {}", path.display(), err);
                skipped += 1;
            }
        }
    }

    let raw_column: Vec<f64> = entries.iter().map(|e| e.summary.sigma_raw.mean).collect();
    let equ_column: Vec<f64> = entries
        .iter()
        .map(|e| e.summary.sigma_equilibrated.mean)
        .collect();
    let sigma_raw = aggregate::summarize(&raw_column).ok();
    let sigma_equilibrated = aggregate::summarize(&equ_column).ok();

    info!(
        processed = entries.len(),
        skipped, "Batch aggregation complete."
    );
    Ok(BatchReport {
        entries,
        skipped,
        sigma_raw,
        sigma_equilibrated,
    })
}

fn summarize_file(path: &Path) -> Result<FileSummary, AnalysisError> {
    let file = File::open(path).map_err(|e| AnalysisError::Table { source: e.into() })?;
    let rows = convergence::read_table(file)?;
    Ok(aggregate::summarize_blocks(&rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::convergence::{ConvergenceRow, Regime};
    use std::fs;

    fn table_with_sigma(sigma: f64) -> Vec<ConvergenceRow> {
        let mut rows = Vec::new();
        for regime in Regime::ORDER {
            rows.push(ConvergenceRow {
                label: regime.label().to_string(),
                regime,
                block: None,
                start_a: 0,
                end_a: 500,
                start_b: 0,
                end_b: 500,
                g_a: 1.0,
                g_b: 1.0,
                delta_f: 2.0,
                sigma,
                forward: 2.1,
                backward: 1.9,
                gap_forward: 2.5,
                gap_backward: 1.5,
                spread_forward: 0.3,
                spread_backward: 0.4,
                overlap_ab: 0.4,
                overlap_ba: 0.45,
                overlap_scalar: 0.8,
            });
        }
        for regime in Regime::ORDER {
            for i in 1..=5 {
                let mut row = rows[0].clone();
                row.label = format!("block{}{}", i, regime.label());
                row.regime = regime;
                row.block = Some(i);
                row.sigma = sigma;
                rows.push(row);
            }
        }
        rows
    }

    fn write_table_file(dir: &tempfile::TempDir, name: &str, sigma: f64) -> PathBuf {
        let path = dir.path().join(name);
        let file = fs::File::create(&path).unwrap();
        convergence::write_table(&table_with_sigma(sigma), file).unwrap();
        path
    }

    #[test]
    fn aggregates_across_files_and_skips_malformed_ones() {
        let dir = tempfile::tempdir().unwrap();
        let good1 = write_table_file(&dir, "w1.csv", 0.1);
        let good2 = write_table_file(&dir, "w2.csv", 0.3);
        let bad = dir.path().join("w3.csv");
        fs::write(&bad, "this is not a table\n").unwrap();

        let report = run(&[good1, good2, bad]).unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.skipped, 1);
        let raw = report.sigma_raw.unwrap();
        assert!((raw.sum_squares - (0.01 + 0.09)).abs() < 1e-12);
    }

    #[test]
    fn all_skipped_sweep_reports_without_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.csv");
        let report = run(&[missing]).unwrap();
        assert!(report.entries.is_empty());
        assert_eq!(report.skipped, 1);
        assert!(report.sigma_raw.is_none());
        assert!(report.sigma_equilibrated.is_none());
    }
}
