use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("A λ grid requires at least one point")]
    Empty,
    #[error("Row {row} has {actual} coordinates, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error(
        "Ambiguous segmentation: {count} coordinate axes change between rows {row} and {next}; exactly one may vary per step"
    )]
    MultipleAxesChanged { row: usize, next: usize, count: usize },
}

/// A maximal run of consecutive grid rows along which a single coordinate
/// axis varies while all others stay fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// The coordinate axis that varies within this run.
    pub axis: usize,
    /// Index of the run's first row.
    pub start: usize,
    /// Number of intervals (steps) in the run; the run spans rows
    /// `start ..= start + len`.
    pub len: usize,
}

/// An ordered sequence of points in an M-dimensional coupling space.
///
/// Within a maximal contiguous run exactly one coordinate axis varies between
/// consecutive points; a run's last row doubles as the next run's first row.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaGrid {
    rows: Vec<Vec<f64>>,
    dims: usize,
}

impl LambdaGrid {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, GridError> {
        let first = rows.first().ok_or(GridError::Empty)?;
        let dims = first.len();
        if dims == 0 {
            return Err(GridError::Empty);
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dims {
                return Err(GridError::DimensionMismatch {
                    row: i,
                    expected: dims,
                    actual: row.len(),
                });
            }
        }
        Ok(Self { rows, dims })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    /// One explicit segmentation pass: detects the active axis of every step
    /// and groups consecutive steps sharing an axis into maximal runs.
    ///
    /// A step changing more than one axis is malformed input and fails fast;
    /// a step changing nothing inherits the current active axis.
    pub fn segments(&self) -> Result<Vec<Segment>, GridError> {
        let mut step_axes = Vec::with_capacity(self.rows.len().saturating_sub(1));
        let mut current_axis = 0;
        for i in 0..self.rows.len().saturating_sub(1) {
            let changed: Vec<usize> = (0..self.dims)
                .filter(|&j| self.rows[i][j] != self.rows[i + 1][j])
                .collect();
            match changed.len() {
                0 => {}
                1 => current_axis = changed[0],
                count => {
                    return Err(GridError::MultipleAxesChanged {
                        row: i,
                        next: i + 1,
                        count,
                    });
                }
            }
            step_axes.push(current_axis);
        }

        let mut segments: Vec<Segment> = Vec::new();
        for (step, &axis) in step_axes.iter().enumerate() {
            match segments.last_mut() {
                Some(segment) if segment.axis == axis => segment.len += 1,
                _ => segments.push(Segment {
                    axis,
                    start: step,
                    len: 1,
                }),
            }
        }
        Ok(segments)
    }

    /// The 1-D sub-grid of a segment along its active axis
    /// (rows `start ..= start + len`).
    pub fn axis_values(&self, segment: &Segment) -> Vec<f64> {
        (segment.start..=segment.start + segment.len)
            .map(|i| self.rows[i][segment.axis])
            .collect()
    }

    /// Decimal digits required to externalize this grid without collisions:
    /// `max(2, ⌊−log10(dmin)⌋ + 2)` where dmin is the smallest nonzero
    /// magnitude among consecutive-row coordinate differences.
    pub fn decimal_digits(&self) -> usize {
        let mut min_diff = f64::INFINITY;
        for pair in self.rows.windows(2) {
            for j in 0..self.dims {
                let diff = (pair[1][j] - pair[0][j]).abs();
                if diff > 0.0 && diff < min_diff {
                    min_diff = diff;
                }
            }
        }
        if !min_diff.is_finite() {
            return 2;
        }
        let digits = (-min_diff.log10()).floor() as i64 + 2;
        digits.max(2) as usize
    }
}
