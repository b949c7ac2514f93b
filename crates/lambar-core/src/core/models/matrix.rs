use super::trace::PairedEnsemble;
use nalgebra::DMatrix;

/// K×N reduced-potential matrix for the multistate estimator, K = 2 for a
/// pairwise BAR comparison. Row k holds the reduced potential of every frame
/// evaluated at state k; leg A's frames come first, then leg B's, so that
/// `sum(n_k) = N`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedPotentialMatrix {
    u_kn: DMatrix<f64>,
    n_k: [usize; 2],
}

impl ReducedPotentialMatrix {
    /// Stacks both legs' two-state reduced potentials into one matrix.
    pub fn from_ensemble(pair: &PairedEnsemble) -> Self {
        let n_a = pair.leg_a().len();
        let n_b = pair.leg_b().len();
        let mut u_kn = DMatrix::zeros(2, n_a + n_b);
        for (n, sample) in pair.leg_a().samples().iter().enumerate() {
            u_kn[(0, n)] = sample[0];
            u_kn[(1, n)] = sample[1];
        }
        for (n, sample) in pair.leg_b().samples().iter().enumerate() {
            u_kn[(0, n_a + n)] = sample[0];
            u_kn[(1, n_a + n)] = sample[1];
        }
        Self {
            u_kn,
            n_k: [n_a, n_b],
        }
    }

    pub fn u_kn(&self) -> &DMatrix<f64> {
        &self.u_kn
    }

    /// Per-state sample counts; `n_k()[0] + n_k()[1] == n_total()`.
    pub fn n_k(&self) -> [usize; 2] {
        self.n_k
    }

    pub fn n_total(&self) -> usize {
        self.u_kn.ncols()
    }

    /// Forward energy gaps u_B − u_A over leg A's frames.
    pub fn forward_gaps(&self) -> Vec<f64> {
        (0..self.n_k[0])
            .map(|n| self.u_kn[(1, n)] - self.u_kn[(0, n)])
            .collect()
    }

    /// Backward energy gaps u_A − u_B over leg B's frames.
    pub fn backward_gaps(&self) -> Vec<f64> {
        (self.n_k[0]..self.n_total())
            .map(|n| self.u_kn[(0, n)] - self.u_kn[(1, n)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::trace::EnergyTrace;

    fn pair() -> PairedEnsemble {
        let leg_a = EnergyTrace::new(vec![[0.0, 1.0], [0.5, 1.5]]);
        let leg_b = EnergyTrace::new(vec![[2.0, 1.0], [3.0, 1.5], [4.0, 2.0]]);
        PairedEnsemble::new(leg_a, leg_b).unwrap()
    }

    #[test]
    fn stacks_legs_in_order_with_matching_counts() {
        let matrix = ReducedPotentialMatrix::from_ensemble(&pair());
        assert_eq!(matrix.n_k(), [2, 3]);
        assert_eq!(matrix.n_total(), 5);
        assert_eq!(matrix.u_kn()[(0, 0)], 0.0);
        assert_eq!(matrix.u_kn()[(1, 0)], 1.0);
        assert_eq!(matrix.u_kn()[(0, 2)], 2.0);
        assert_eq!(matrix.u_kn()[(1, 4)], 2.0);
    }

    #[test]
    fn directional_gaps_use_the_matching_leg() {
        let matrix = ReducedPotentialMatrix::from_ensemble(&pair());
        assert_eq!(matrix.forward_gaps(), vec![1.0, 1.0]);
        assert_eq!(matrix.backward_gaps(), vec![1.0, 1.5, 2.0]);
    }
}
