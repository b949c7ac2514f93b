use crate::core::models::grid::{GridError, LambdaGrid, Segment};
use crate::core::stats::bisect::{BisectError, bisect};
use crate::core::stats::interp::{InterpError, PchipInterpolant, StepInterpolant};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Malformed λ grid: {0}")]
    Grid(#[from] GridError),
    #[error("Got {errors} interval errors for a grid of {points} points (expected {})", points - 1)]
    ErrorCountMismatch { errors: usize, points: usize },
    #[error("Interval error values must be positive and finite (value {value} at interval {index})")]
    InvalidError { index: usize, value: f64 },
    #[error("Segment starting at row {start} is not strictly increasing along axis {axis}")]
    SegmentNotIncreasing { start: usize, axis: usize },
    #[error("Requested {requested} points but a grid with {segments} segments needs at least {minimum}")]
    TargetTooSmall {
        requested: usize,
        segments: usize,
        minimum: usize,
    },
    #[error(
        "Step-budget bracket [{lower}, {upper}] contains no solution for {target} points: {source}"
    )]
    BudgetBracket {
        lower: f64,
        upper: f64,
        target: usize,
        source: BisectError,
    },
    #[error("Interpolant construction failed: {0}")]
    Interp(#[from] InterpError),
    #[error("Internal schedule inconsistency: {0}")]
    Internal(String),
}

/// A new λ schedule with its externalization precision and per-row error
/// density (dError/dλ at each new point, from the piecewise-constant
/// derivative proxy of its segment).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleResult {
    pub grid: LambdaGrid,
    pub decimal_digits: usize,
    pub error_density: Vec<f64>,
}

/// Computes a new λ grid of `target_points` (default: the current count)
/// that approximately equalizes cumulative estimation error per interval.
///
/// The grid is segmented into maximal single-axis runs; each segment is
/// reduced to a 1-D problem, re-spaced by an equal-error-budget walk over a
/// monotone interpolant of its cumulative error, and recomposed into full
/// rows with the segment's inactive coordinates held fixed. The input grid
/// is left untouched.
#[instrument(skip_all, name = "schedule_optimization", fields(points = grid.len(), target = target_points))]
pub fn optimize(
    grid: &LambdaGrid,
    errors: &[f64],
    target_points: Option<usize>,
) -> Result<ScheduleResult, ScheduleError> {
    if errors.len() + 1 != grid.len() {
        return Err(ScheduleError::ErrorCountMismatch {
            errors: errors.len(),
            points: grid.len(),
        });
    }
    if let Some((index, &value)) = errors
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v <= 0.0)
    {
        return Err(ScheduleError::InvalidError { index, value });
    }

    let segments = grid.segments()?;
    let target = target_points.unwrap_or(grid.len());
    let allocations = allocate_points(grid.len(), &segments, errors, target)?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut error_density = Vec::new();
    for (segment, &point_count) in segments.iter().zip(&allocations) {
        let lambdas = grid.axis_values(segment);
        let segment_errors = &errors[segment.start..segment.start + segment.len];
        let curve = SegmentCurve::build(segment, &lambdas, segment_errors)?;

        let values = if segment.len < 2 && point_count == 2 {
            // Single-interval segment at its minimum allocation: the
            // endpoints pass through unchanged, with no boundary roundoff.
            vec![lambdas[0], lambdas[segment.len]]
        } else {
            let budget = solve_budget(&curve, segment_errors, point_count)?;
            debug!(
                axis = segment.axis,
                start = segment.start,
                points = point_count,
                budget,
                "Solved per-step error budget for segment"
            );
            let outcome = curve.walk(budget, point_count);
            if outcome.points.len() != point_count {
                return Err(ScheduleError::Internal(format!(
                    "segment walk produced {} points, expected {}",
                    outcome.points.len(),
                    point_count
                )));
            }
            outcome.points
        };

        let template = grid.row(segment.start).to_vec();
        // The shared boundary row was already emitted by the previous
        // segment; skip its duplicate.
        let skip = usize::from(!rows.is_empty());
        for &value in &values[skip..] {
            let mut row = template.clone();
            row[segment.axis] = value;
            rows.push(row);
            error_density.push(curve.density.evaluate(value));
        }
    }

    let new_grid = LambdaGrid::new(rows)?;
    let decimal_digits = new_grid.decimal_digits();
    info!(
        points = new_grid.len(),
        decimal_digits, "λ schedule optimized"
    );
    Ok(ScheduleResult {
        grid: new_grid,
        decimal_digits,
        error_density,
    })
}

/// The 1-D error model of one segment: a monotone interpolant of the
/// cumulative error through the grid points, and a piecewise-constant
/// derivative proxy held flat beyond the segment's ends.
struct SegmentCurve {
    cumulative: PchipInterpolant,
    density: StepInterpolant,
    start: f64,
    end: f64,
}

struct WalkOutcome {
    points: Vec<f64>,
    /// Integer steps plus the fractional remainder when the walk exhausts
    /// its step allowance before reaching the segment end.
    count: f64,
}

impl SegmentCurve {
    fn build(
        segment: &Segment,
        lambdas: &[f64],
        errors: &[f64],
    ) -> Result<Self, ScheduleError> {
        if lambdas.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(ScheduleError::SegmentNotIncreasing {
                start: segment.start,
                axis: segment.axis,
            });
        }

        let mut cumulative_values = Vec::with_capacity(lambdas.len());
        cumulative_values.push(0.0);
        for &error in errors {
            cumulative_values.push(cumulative_values.last().copied().unwrap_or(0.0) + error);
        }
        let cumulative = PchipInterpolant::new(lambdas.to_vec(), cumulative_values)?;

        let density_values: Vec<f64> = errors
            .iter()
            .zip(lambdas.windows(2))
            .map(|(&error, pair)| error / (pair[1] - pair[0]))
            .collect();
        let density = StepInterpolant::new(lambdas[..errors.len()].to_vec(), density_values)?;

        Ok(Self {
            cumulative,
            density,
            start: lambdas[0],
            end: *lambdas.last().unwrap_or(&0.0),
        })
    }

    /// Greedy equal-budget walk: starting at the segment's first point,
    /// repeatedly solves `E(λ) − E(λ_last) = budget` for the next point,
    /// stopping after `max_points` steps or upon reaching the segment end.
    /// Pure in `budget`; the fractional count makes the outer budget search
    /// well behaved.
    fn walk(&self, budget: f64, max_points: usize) -> WalkOutcome {
        let mut points = vec![self.start];
        let mut fractional = 0.0;

        for step in 0..max_points {
            let last = *points.last().unwrap_or(&self.start);
            let last_cumulative = self.cumulative.evaluate(last);
            let remaining_at_end = self.cumulative.evaluate(self.end) - last_cumulative - budget;
            if remaining_at_end < 0.0 {
                // Budget overshoots the segment end: close the walk there.
                // The count stays integer on this branch, which pins the
                // outer bisection onto an exact-count plateau.
                points.push(self.end);
                break;
            }

            let crossing = |t: f64| self.cumulative.evaluate(t) - last_cumulative - budget;
            let next = match bisect(crossing, last, self.end) {
                Ok(value) => value,
                // crossing(last) = −budget < 0 and crossing(end) ≥ 0 hold
                // here, so bisection only fails at an exact boundary hit.
                Err(_) => {
                    points.push(self.end);
                    break;
                }
            };
            points.push(next);
            if next >= self.end {
                break;
            }
            if step == max_points - 1 {
                fractional = (self.cumulative.evaluate(self.end)
                    - self.cumulative.evaluate(next))
                    / budget;
            }
        }

        let count = points.len() as f64 + fractional;
        WalkOutcome { points, count }
    }
}

/// Finds the per-step error budget whose walk yields exactly `target`
/// points, searching the bracket `[min(errors)/10, max(errors)·10]`.
///
/// The count is monotone-decreasing in the budget and sits on an exact
/// plateau for every achievable integer; the smallest budget on the target
/// plateau is the one that equalizes error across the new intervals, so the
/// bisection converges onto the plateau's lower edge. An invalid bracket is
/// a hard domain error, not a silently clamped answer.
fn solve_budget(
    curve: &SegmentCurve,
    errors: &[f64],
    target: usize,
) -> Result<f64, ScheduleError> {
    let lower = errors.iter().copied().fold(f64::INFINITY, f64::min) / 10.0;
    let upper = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max) * 10.0;

    let count_gap = |budget: f64| curve.walk(budget, target).count - target as f64;
    let gap_lower = count_gap(lower);
    let gap_upper = count_gap(upper);
    if gap_lower < 0.0 || gap_upper > 0.0 {
        return Err(ScheduleError::BudgetBracket {
            lower,
            upper,
            target,
            source: BisectError::NoSignChange {
                lower,
                upper,
                f_lower: gap_lower,
                f_upper: gap_upper,
            },
        });
    }

    let (mut lo, mut hi) = (lower, upper);
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if mid == lo || mid == hi || (hi - lo) < 1e-14 * hi.abs() {
            break;
        }
        if count_gap(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    // `hi` sits just inside the plateau; nudge upward if the plateau is
    // narrower than the bisection resolution.
    let mut budget = hi;
    for _ in 0..8 {
        if curve.walk(budget, target).points.len() == target {
            return Ok(budget);
        }
        budget *= 1.0 + 1e-9;
    }
    Err(ScheduleError::Internal(format!(
        "no exact-count budget near {} for {} points",
        budget, target
    )))
}

/// Per-segment point allocation. When the request matches the current count
/// every segment keeps its own size; otherwise points are apportioned by
/// each segment's share of the total error (largest-remainder rounding,
/// at least two points per segment), counting shared boundary rows once.
fn allocate_points(
    grid_len: usize,
    segments: &[Segment],
    errors: &[f64],
    target: usize,
) -> Result<Vec<usize>, ScheduleError> {
    if target == grid_len {
        return Ok(segments.iter().map(|s| s.len + 1).collect());
    }

    let segment_count = segments.len();
    let minimum = segment_count + 1;
    if target < minimum {
        return Err(ScheduleError::TargetTooSmall {
            requested: target,
            segments: segment_count,
            minimum,
        });
    }

    // Shared boundary rows are emitted once, so segments jointly own
    // `target + segments − 1` endpoint-inclusive points.
    let total_points = target + segment_count - 1;
    let weights: Vec<f64> = segments
        .iter()
        .map(|s| errors[s.start..s.start + s.len].iter().sum())
        .collect();
    let weight_sum: f64 = weights.iter().sum();

    let mut allocations = vec![2usize; segment_count];
    let mut remainders: Vec<(usize, f64)> = Vec::with_capacity(segment_count);
    let mut assigned = 0;
    for (i, &weight) in weights.iter().enumerate() {
        let quota = total_points as f64 * weight / weight_sum;
        let floor = (quota.floor() as usize).max(2);
        allocations[i] = floor;
        assigned += floor;
        remainders.push((i, quota - quota.floor()));
    }

    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let mut cursor = 0;
    while assigned < total_points {
        let (index, _) = remainders[cursor % segment_count];
        allocations[index] += 1;
        assigned += 1;
        cursor += 1;
    }
    let mut shrink = allocations.len();
    while assigned > total_points {
        shrink = (shrink + allocations.len() - 1) % allocations.len();
        if allocations[shrink] > 2 {
            allocations[shrink] -= 1;
            assigned -= 1;
        }
    }

    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_1d(points: &[f64]) -> LambdaGrid {
        LambdaGrid::new(points.iter().map(|&p| vec![p]).collect()).unwrap()
    }

    #[test]
    fn uniform_errors_keep_a_uniform_grid() {
        let grid = grid_1d(&[0.0, 0.25, 0.5, 0.75, 1.0]);
        let errors = [1.0, 1.0, 1.0, 1.0];
        let result = optimize(&grid, &errors, None).unwrap();
        assert_eq!(result.grid.len(), 5);
        for (row, expected) in result.grid.rows().iter().zip([0.0, 0.25, 0.5, 0.75, 1.0]) {
            assert_relative_eq!(row[0], expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn high_error_regions_are_subdivided_more_densely() {
        let grid = grid_1d(&[0.0, 0.25, 0.5, 0.75, 1.0]);
        // The last interval dominates the error.
        let errors = [1.0, 1.0, 1.0, 6.0];
        let result = optimize(&grid, &errors, None).unwrap();
        let points: Vec<f64> = result.grid.rows().iter().map(|r| r[0]).collect();
        assert_eq!(points.len(), 5);
        assert_relative_eq!(points[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(points[4], 1.0, epsilon = 1e-9);
        // More than half of the interior points land in the high-error
        // quarter of the range.
        let in_hot_region = points[1..4].iter().filter(|&&p| p > 0.72).count();
        assert!(in_hot_region >= 2, "points = {:?}", points);
    }

    #[test]
    fn two_axis_scenario_redistributes_within_each_segment() {
        let grid = LambdaGrid::new(vec![
            vec![0.0, 0.0],
            vec![0.25, 0.0],
            vec![0.5, 0.0],
            vec![0.5, 0.25],
            vec![0.5, 0.5],
        ])
        .unwrap();
        let errors = [1.0, 1.0, 2.0, 1.0];
        let result = optimize(&grid, &errors, Some(5)).unwrap();
        let rows = result.grid.rows();
        assert_eq!(rows.len(), 5);

        // Boundary rows reproduce exactly, with axis 0 spanning 0 → 0.5
        // first and axis 1 following 0 → 0.5.
        assert_eq!(rows[0], &[0.0, 0.0]);
        assert_eq!(rows[2], &[0.5, 0.0]);
        assert_eq!(rows[4], &[0.5, 0.5]);
        assert_relative_eq!(rows[1][0], 0.25, epsilon = 1e-6);
        assert_relative_eq!(rows[1][1], 0.0, epsilon = 1e-12);

        // The higher-error first interval of the axis-1 segment gets the
        // denser subdivision: its interior point sits below the midpoint.
        assert!(rows[3][1] < 0.25, "rows = {:?}", rows);
        assert!(rows[3][1] > 0.0);
    }

    #[test]
    fn total_point_count_matches_the_request() {
        let grid = grid_1d(&[0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        let errors = [1.0, 2.0, 3.0, 2.0, 1.0];
        for target in [4, 6, 9, 13] {
            let result = optimize(&grid, &errors, Some(target)).unwrap();
            assert_eq!(result.grid.len(), target, "target = {}", target);
            assert_eq!(result.error_density.len(), target);
        }
    }

    #[test]
    fn reapplication_is_a_fixed_point() {
        let grid = grid_1d(&[0.0, 0.1, 0.3, 0.6, 1.0]);
        let errors = [0.5, 1.0, 2.0, 1.5];
        let first = optimize(&grid, &errors, None).unwrap();

        // Reinterpolate the same cumulative-error profile onto the new grid.
        let cumulative: Vec<f64> = errors
            .iter()
            .scan(0.0, |acc, e| {
                *acc += e;
                Some(*acc)
            })
            .collect();
        let profile = PchipInterpolant::new(
            vec![0.0, 0.1, 0.3, 0.6, 1.0],
            std::iter::once(0.0).chain(cumulative).collect(),
        )
        .unwrap();
        let new_points: Vec<f64> = first.grid.rows().iter().map(|r| r[0]).collect();
        let new_errors: Vec<f64> = new_points
            .windows(2)
            .map(|pair| profile.evaluate(pair[1]) - profile.evaluate(pair[0]))
            .collect();

        let second = optimize(&first.grid, &new_errors, None).unwrap();
        for (a, b) in first.grid.rows().iter().zip(second.grid.rows()) {
            assert_relative_eq!(a[0], b[0], epsilon = 1e-4);
        }
    }

    #[test]
    fn degenerate_single_interval_segment_passes_through() {
        let grid = grid_1d(&[0.0, 1.0]);
        let result = optimize(&grid, &[3.0], None).unwrap();
        assert_eq!(result.grid.rows(), &[vec![0.0], vec![1.0]]);
    }

    #[test]
    fn single_interval_segments_honor_an_explicit_target() {
        let grid =
            LambdaGrid::new(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]]).unwrap();
        let result = optimize(&grid, &[1.0, 1.0], Some(6)).unwrap();
        let rows = result.grid.rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(result.error_density.len(), 6);

        // Equal segment errors split the extra points 4/3; uniform error
        // subdivides each unit segment evenly.
        assert_eq!(rows[0], &[0.0, 0.0]);
        assert_relative_eq!(rows[1][0], 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(rows[2][0], 2.0 / 3.0, epsilon = 1e-6);
        assert_eq!(rows[3], &[1.0, 0.0]);
        assert_relative_eq!(rows[4][1], 0.5, epsilon = 1e-6);
        assert_eq!(rows[5], &[1.0, 1.0]);
    }

    #[test]
    fn rejects_mismatched_error_count() {
        let grid = grid_1d(&[0.0, 0.5, 1.0]);
        assert!(matches!(
            optimize(&grid, &[1.0], None),
            Err(ScheduleError::ErrorCountMismatch { errors: 1, points: 3 })
        ));
    }

    #[test]
    fn rejects_non_positive_errors() {
        let grid = grid_1d(&[0.0, 0.5, 1.0]);
        assert!(matches!(
            optimize(&grid, &[1.0, 0.0], None),
            Err(ScheduleError::InvalidError { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_descending_segments() {
        let grid = grid_1d(&[1.0, 0.5, 0.0]);
        assert!(matches!(
            optimize(&grid, &[1.0, 1.0], None),
            Err(ScheduleError::SegmentNotIncreasing { .. })
        ));
    }

    #[test]
    fn rejects_multi_axis_steps() {
        let grid = LambdaGrid::new(vec![vec![0.0, 0.0], vec![0.5, 0.5], vec![1.0, 0.5]]).unwrap();
        assert!(matches!(
            optimize(&grid, &[1.0, 1.0], None),
            Err(ScheduleError::Grid(GridError::MultipleAxesChanged { .. }))
        ));
    }

    #[test]
    fn error_density_reflects_the_derivative_proxy() {
        let grid = grid_1d(&[0.0, 0.5, 1.0]);
        let errors = [1.0, 1.0];
        let result = optimize(&grid, &errors, None).unwrap();
        // Uniform errors over uniform spacing: density 2.0 everywhere.
        for &density in &result.error_density {
            assert_relative_eq!(density, 2.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn allocation_respects_segment_minimums() {
        let allocations = allocate_points(
            5,
            &[
                Segment {
                    axis: 0,
                    start: 0,
                    len: 2,
                },
                Segment {
                    axis: 1,
                    start: 2,
                    len: 2,
                },
            ],
            &[1.0, 1.0, 1.0, 1.0],
            7,
        )
        .unwrap();
        assert_eq!(allocations.iter().sum::<usize>(), 8);
        assert!(allocations.iter().all(|&a| a >= 2));
    }
}
