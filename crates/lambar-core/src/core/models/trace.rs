/// Reduced-energy samples for one simulation leg of a BAR comparison.
///
/// Each frame carries the reduced potential evaluated at both coupled states:
/// column 0 at state A, column 1 at state B, in the same order for both legs.
/// Unit conversion (β, pressure–volume work) is applied by the reader;
/// a trace is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTrace {
    samples: Vec<[f64; 2]>,
}

impl EnergyTrace {
    pub fn new(samples: Vec<[f64; 2]>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[[f64; 2]] {
        &self.samples
    }

    /// Per-frame difference u(state A) − u(state B), the scalar series used
    /// for equilibration detection and correlation analysis.
    pub fn difference_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s[0] - s[1]).collect()
    }

    /// A new trace containing the frames from `start` onward.
    pub fn tail(&self, start: usize) -> Self {
        Self {
            samples: self.samples[start.min(self.samples.len())..].to_vec(),
        }
    }

    /// A new trace containing the frames in `start..end` (clamped).
    pub fn window(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.samples.len());
        let start = start.min(end);
        Self {
            samples: self.samples[start..end].to_vec(),
        }
    }

    /// A new trace built from the given frame indices (indices may repeat,
    /// as produced by bootstrap resampling).
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            samples: indices.iter().map(|&i| self.samples[i]).collect(),
        }
    }
}

/// Two energy traces forming one BAR comparison: leg A sampled at state A,
/// leg B sampled at state B. Both legs are nonempty by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedEnsemble {
    leg_a: EnergyTrace,
    leg_b: EnergyTrace,
}

impl PairedEnsemble {
    /// Returns `None` when either leg is empty.
    pub fn new(leg_a: EnergyTrace, leg_b: EnergyTrace) -> Option<Self> {
        if leg_a.is_empty() || leg_b.is_empty() {
            return None;
        }
        Some(Self { leg_a, leg_b })
    }

    pub fn leg_a(&self) -> &EnergyTrace {
        &self.leg_a
    }

    pub fn leg_b(&self) -> &EnergyTrace {
        &self.leg_b
    }
}
