use crate::core::models::estimate::{FreeEnergyEstimate, OverlapDiagnostics};
use crate::core::models::matrix::ReducedPotentialMatrix;
use crate::core::models::trace::PairedEnsemble;
use crate::engine::mbar::{self, MbarError};
use nalgebra::Matrix2;

/// Assembles the K = 2 reduced-potential matrix for a paired ensemble.
pub fn build_matrix(pair: &PairedEnsemble) -> ReducedPotentialMatrix {
    ReducedPotentialMatrix::from_ensemble(pair)
}

/// Exponential (Zwanzig) average of a set of energy gaps:
/// ΔF = −ln⟨exp(−x)⟩, max-shifted before exponentiation so extreme gaps
/// cannot overflow. Very asymmetric gap distributions may still lose
/// precision; that is an accuracy limitation, not a failure mode.
///
/// The second value is the sample standard deviation of the raw gaps, an
/// informational cross-check rather than a rigorous uncertainty.
pub fn exponential_average(deltas: &[f64]) -> (f64, f64) {
    if deltas.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let max = deltas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_exp = deltas
        .iter()
        .map(|&x| (-(x - max)).exp())
        .sum::<f64>()
        / deltas.len() as f64;

    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    let variance = deltas.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>()
        / deltas.len() as f64;

    (-mean_exp.ln() + max, variance.sqrt())
}

/// Computes a multistate free-energy estimate for a pairwise comparison.
///
/// The reported uncertainty is scaled by √`variance_scale` to undo the
/// sample-count inflation performed by the resampler. Forward and backward
/// exponential-average estimates are derived from the two directional
/// energy-gap subsets and reported in the forward direction so hysteresis
/// shows up as their discrepancy.
pub fn estimate(
    matrix: &ReducedPotentialMatrix,
    variance_scale: f64,
) -> Result<FreeEnergyEstimate, MbarError> {
    let solution = mbar::solve(matrix.u_kn(), &matrix.n_k())?;

    let forward_gaps = matrix.forward_gaps();
    let backward_gaps = matrix.backward_gaps();
    let (forward, spread_forward) = exponential_average(&forward_gaps);
    let (backward, spread_backward) = exponential_average(&backward_gaps);

    let gap_forward = forward_gaps.iter().sum::<f64>() / forward_gaps.len() as f64;
    let gap_backward = backward_gaps.iter().sum::<f64>() / backward_gaps.len() as f64;

    let overlap = OverlapDiagnostics {
        matrix: Matrix2::new(
            solution.overlap_matrix[(0, 0)],
            solution.overlap_matrix[(0, 1)],
            solution.overlap_matrix[(1, 0)],
            solution.overlap_matrix[(1, 1)],
        ),
        scalar: solution.overlap_scalar,
    };

    Ok(FreeEnergyEstimate {
        delta_f: solution.difference(0, 1),
        sigma: solution.difference_sigma(0, 1) * variance_scale.sqrt(),
        forward,
        backward: -backward,
        gap_forward,
        gap_backward: -gap_backward,
        spread_forward,
        spread_backward,
        overlap,
    })
}
