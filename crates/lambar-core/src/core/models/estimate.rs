use nalgebra::Matrix2;

/// Result of equilibration detection on a scalar series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecorrelationResult {
    /// Index after which the series is treated as equilibrated.
    pub t0: usize,
    /// Statistical inefficiency of the tail, g ≥ 1.
    pub g: f64,
    /// Number of effectively independent samples in the tail.
    pub n_effective: f64,
}

/// Phase-space overlap diagnostics from the multistate estimator.
///
/// `matrix[(i, j)]` is the probability mass state j's samples carry in state
/// i's ensemble; the scalar is derived from the second-largest eigenvalue of
/// the overlap matrix (1 = perfect overlap, 0 = disjoint ensembles).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapDiagnostics {
    pub matrix: Matrix2<f64>,
    pub scalar: f64,
}

impl OverlapDiagnostics {
    /// Mass of leg B's samples in state A's ensemble.
    pub fn a_in_b(&self) -> f64 {
        self.matrix[(0, 1)]
    }

    /// Mass of leg A's samples in state B's ensemble.
    pub fn b_in_a(&self) -> f64 {
        self.matrix[(1, 0)]
    }
}

/// A multistate free-energy estimate for one state pair, with unidirectional
/// cross-checks and overlap diagnostics. All values are in the reduced units
/// of the input matrix (multiples of kT under the reader's β).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeEnergyEstimate {
    /// ΔF(A→B).
    pub delta_f: f64,
    /// Uncertainty of `delta_f`, ≥ 0, already scaled for upstream sample
    /// inflation.
    pub sigma: f64,
    /// Forward exponential-average estimate (from leg A's energy gaps).
    pub forward: f64,
    /// Backward exponential-average estimate, sign-flipped to the forward
    /// direction for direct comparison.
    pub backward: f64,
    /// Mean forward energy gap.
    pub gap_forward: f64,
    /// Mean backward energy gap, sign-flipped to the forward direction.
    pub gap_backward: f64,
    /// Sample standard deviation of the forward gaps (informational).
    pub spread_forward: f64,
    /// Sample standard deviation of the backward gaps (informational).
    pub spread_backward: f64,
    pub overlap: OverlapDiagnostics,
}

impl FreeEnergyEstimate {
    /// Absolute discrepancy between the two unidirectional estimates, the
    /// primary hysteresis diagnostic.
    pub fn directional_discrepancy(&self) -> f64 {
        (self.forward - self.backward).abs()
    }
}
