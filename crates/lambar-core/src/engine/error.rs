use thiserror::Error;

use crate::core::io::bar::BarFileError;
use crate::core::io::grid::GridFileError;
use crate::core::io::schedule::ScheduleWriteError;
use crate::engine::aggregate::AggregateError;
use crate::engine::mbar::MbarError;
use crate::engine::resampler::ResampleError;
use crate::engine::schedule::ScheduleError;

/// Umbrella error for the analysis pipeline and the workflows built on it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Trajectory file error: {source}")]
    BarFile {
        #[from]
        source: BarFileError,
    },

    #[error("Grid file error: {source}")]
    GridFile {
        #[from]
        source: GridFileError,
    },

    #[error("Schedule output error: {source}")]
    ScheduleWrite {
        #[from]
        source: ScheduleWriteError,
    },

    #[error("Estimator failed: {source}")]
    Estimator {
        #[from]
        source: MbarError,
    },

    #[error("Resampling failed: {source}")]
    Resample {
        #[from]
        source: ResampleError,
    },

    #[error("Schedule optimization failed: {source}")]
    Schedule {
        #[from]
        source: ScheduleError,
    },

    #[error("Aggregation failed: {source}")]
    Aggregate {
        #[from]
        source: AggregateError,
    },

    #[error("Convergence table I/O failed: {source}")]
    Table {
        #[from]
        source: csv::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
