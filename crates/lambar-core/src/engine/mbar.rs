use nalgebra::{DMatrix, DVector, SymmetricEigen};
use thiserror::Error;
use tracing::{instrument, trace};

const CONVERGENCE_TOLERANCE: f64 = 1e-10;
const MAX_ITERATIONS: usize = 10_000;
/// Relative eigenvalue cutoff for the covariance pseudo-inverse.
const PINV_RELATIVE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MbarError {
    #[error("Reduced-potential matrix has no samples")]
    Empty,
    #[error("Sample counts sum to {sum} but the matrix has {cols} columns")]
    CountMismatch { sum: usize, cols: usize },
    #[error("State {state} has no samples")]
    EmptyState { state: usize },
    #[error("Self-consistent iteration failed to converge after {iterations} iterations")]
    Convergence { iterations: usize },
}

/// Solution of the multistate self-consistency system: dimensionless free
/// energies (gauge f₀ = 0), their asymptotic covariance, and the phase-space
/// overlap diagnostics derived from the weight matrix.
#[derive(Debug, Clone)]
pub struct MbarSolution {
    pub free_energies: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub overlap_matrix: DMatrix<f64>,
    pub overlap_scalar: f64,
}

impl MbarSolution {
    /// ΔF between a pair of states.
    pub fn difference(&self, from: usize, to: usize) -> f64 {
        self.free_energies[to] - self.free_energies[from]
    }

    /// Asymptotic standard deviation of `difference(from, to)`.
    pub fn difference_sigma(&self, from: usize, to: usize) -> f64 {
        let variance = self.covariance[(from, from)] + self.covariance[(to, to)]
            - 2.0 * self.covariance[(from, to)];
        variance.max(0.0).sqrt()
    }
}

/// Solves the multistate reweighting equations for a K×N reduced-potential
/// matrix with per-state sample counts `n_k`.
///
/// Iterates `f_k ← −ln Σ_n exp(−u_kn) / Σ_j N_j exp(f_j − u_jn)` in log space
/// until self-consistency, then derives the asymptotic covariance and overlap
/// diagnostics from the converged weight matrix. This is the single numerical
/// capability the estimator depends on; swapping in another solver only
/// requires reproducing this signature.
#[instrument(level = "trace", skip_all, fields(states = u_kn.nrows(), samples = u_kn.ncols()))]
pub fn solve(u_kn: &DMatrix<f64>, n_k: &[usize]) -> Result<MbarSolution, MbarError> {
    let k_states = u_kn.nrows();
    let n_total = u_kn.ncols();
    if n_total == 0 || k_states == 0 {
        return Err(MbarError::Empty);
    }
    let sum: usize = n_k.iter().sum();
    if n_k.len() != k_states || sum != n_total {
        return Err(MbarError::CountMismatch {
            sum,
            cols: n_total,
        });
    }
    if let Some(state) = n_k.iter().position(|&count| count == 0) {
        return Err(MbarError::EmptyState { state });
    }

    let log_counts: Vec<f64> = n_k.iter().map(|&count| (count as f64).ln()).collect();
    let mut f = DVector::zeros(k_states);
    let mut log_denominators = vec![0.0; n_total];
    let mut converged = false;

    for iteration in 0..MAX_ITERATIONS {
        compute_log_denominators(u_kn, &f, &log_counts, &mut log_denominators);

        let mut new_f = DVector::zeros(k_states);
        let mut terms = vec![0.0; n_total];
        for k in 0..k_states {
            for n in 0..n_total {
                terms[n] = -u_kn[(k, n)] - log_denominators[n];
            }
            new_f[k] = -log_sum_exp(&terms);
        }
        let gauge = new_f[0];
        for k in 0..k_states {
            new_f[k] -= gauge;
        }

        let delta = (0..k_states)
            .map(|k| (new_f[k] - f[k]).abs())
            .fold(0.0, f64::max);
        f = new_f;
        if delta < CONVERGENCE_TOLERANCE {
            trace!(iterations = iteration + 1, "Self-consistent iteration converged");
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(MbarError::Convergence {
            iterations: MAX_ITERATIONS,
        });
    }

    compute_log_denominators(u_kn, &f, &log_counts, &mut log_denominators);
    let weights = DMatrix::from_fn(n_total, k_states, |n, k| {
        (f[k] - u_kn[(k, n)] - log_denominators[n]).exp()
    });
    let wtw = weights.transpose() * &weights;

    let covariance = asymptotic_covariance(&wtw, n_k);
    let (overlap_matrix, overlap_scalar) = overlap_diagnostics(&wtw, n_k);

    Ok(MbarSolution {
        free_energies: f,
        covariance,
        overlap_matrix,
        overlap_scalar,
    })
}

fn compute_log_denominators(
    u_kn: &DMatrix<f64>,
    f: &DVector<f64>,
    log_counts: &[f64],
    out: &mut [f64],
) {
    let k_states = u_kn.nrows();
    let mut terms = vec![0.0; k_states];
    for (n, slot) in out.iter_mut().enumerate() {
        for k in 0..k_states {
            terms[k] = log_counts[k] + f[k] - u_kn[(k, n)];
        }
        *slot = log_sum_exp(&terms);
    }
}

/// ln Σ exp(xᵢ), max-shifted so large energy gaps cannot overflow.
fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Θ = V S (I − S Vᵀ N V S)⁺ S Vᵀ from the eigendecomposition
/// WᵀW = V S² Vᵀ, with N = diag(N_k). The inner matrix is singular by the
/// estimator's gauge freedom, hence the pseudo-inverse; free-energy
/// *differences* have well-defined variances regardless.
fn asymptotic_covariance(wtw: &DMatrix<f64>, n_k: &[usize]) -> DMatrix<f64> {
    let k_states = wtw.nrows();
    let eigen = SymmetricEigen::new(wtw.clone());
    let v = eigen.eigenvectors;
    let s = DMatrix::from_diagonal(&eigen.eigenvalues.map(|value| value.max(0.0).sqrt()));
    let counts = DMatrix::from_diagonal(&DVector::from_iterator(
        k_states,
        n_k.iter().map(|&count| count as f64),
    ));

    let inner = DMatrix::identity(k_states, k_states)
        - &s * v.transpose() * counts * &v * &s;
    let inner_pinv = symmetric_pseudo_inverse(&inner);
    &v * &s * inner_pinv * &s * v.transpose()
}

fn symmetric_pseudo_inverse(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let eigen = SymmetricEigen::new(matrix.clone());
    let max_magnitude = eigen
        .eigenvalues
        .iter()
        .fold(0.0_f64, |acc, &value| acc.max(value.abs()));
    let cutoff = max_magnitude * PINV_RELATIVE_TOLERANCE;
    let inverted = eigen.eigenvalues.map(|value| {
        if value.abs() > cutoff {
            1.0 / value
        } else {
            0.0
        }
    });
    &eigen.eigenvectors
        * DMatrix::from_diagonal(&inverted)
        * eigen.eigenvectors.transpose()
}

/// Overlap matrix O = WᵀW·diag(N_k); its eigenvalues live in [0, 1] with the
/// largest pinned at 1, and the scalar 1 − λ₂ vanishes as the ensembles
/// decouple. Eigenvalues come from the similar symmetric form
/// D^½ WᵀW D^½.
fn overlap_diagnostics(wtw: &DMatrix<f64>, n_k: &[usize]) -> (DMatrix<f64>, f64) {
    let k_states = wtw.nrows();
    let counts = DMatrix::from_diagonal(&DVector::from_iterator(
        k_states,
        n_k.iter().map(|&count| count as f64),
    ));
    let overlap = wtw * &counts;

    let sqrt_counts = DMatrix::from_diagonal(&DVector::from_iterator(
        k_states,
        n_k.iter().map(|&count| (count as f64).sqrt()),
    ));
    let symmetric = &sqrt_counts * wtw * &sqrt_counts;
    let mut eigenvalues: Vec<f64> = SymmetricEigen::new(symmetric)
        .eigenvalues
        .iter()
        .copied()
        .collect();
    eigenvalues.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let scalar = if eigenvalues.len() > 1 {
        1.0 - eigenvalues[1]
    } else {
        1.0
    };
    (overlap, scalar)
}
