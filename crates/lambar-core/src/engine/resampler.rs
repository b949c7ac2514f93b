use crate::core::models::trace::{EnergyTrace, PairedEnsemble};
use crate::core::stats::timeseries::{
    DEFAULT_BLOCK_HINT, detect_equilibration, statistical_inefficiency,
};
use rand::Rng;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResampleError {
    #[error("Resampling produced an empty leg (targets {n_a} and {n_b})")]
    EmptyResult { n_a: usize, n_b: usize },
}

/// Correlation-handling regime for [`balance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleOptions {
    /// Trim each leg's head at its detected equilibration point.
    pub equilibrate: bool,
    /// Balance the legs' lengths by their statistical inefficiencies.
    pub decorrelate: bool,
    /// Minimum retained length per leg; shorter results are inflated by
    /// bootstrap.
    pub min_floor: usize,
    /// Scan resolution for equilibration detection.
    pub block_hint: usize,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            equilibrate: false,
            decorrelate: true,
            min_floor: 100,
            block_hint: DEFAULT_BLOCK_HINT,
        }
    }
}

/// Diagnostics of one balancing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleReport {
    /// Equilibration index of each leg (0 when equilibration is off).
    pub t_a: usize,
    pub t_b: usize,
    /// Statistical inefficiency of each leg (1 when decorrelation is off).
    pub g_a: f64,
    pub g_b: f64,
    /// Effective sample size represented by the balanced pair.
    pub effective_size: f64,
    /// Whether the bootstrap floor kicked in.
    pub inflated: bool,
}

/// Builds a paired, correlation-balanced subsample of both legs.
///
/// Optionally trims each leg's equilibration transient, then scales the less
/// correlated leg's retained length by the inefficiency ratio so both sides
/// represent comparable effective-sample budgets. If either target falls
/// below `min_floor`, both are inflated proportionally (with a diagnostic
/// notice) and drawn with replacement. Deterministic for a seeded `rng`.
pub fn balance(
    pair: &PairedEnsemble,
    options: &ResampleOptions,
    rng: &mut impl Rng,
) -> Result<(PairedEnsemble, ResampleReport), ResampleError> {
    let series_a = pair.leg_a().difference_series();
    let series_b = pair.leg_b().difference_series();

    let mut t_a = 0;
    let mut t_b = 0;
    let mut g_a = 1.0;
    let mut g_b = 1.0;

    if options.equilibrate {
        let eq_a = detect_equilibration(&series_a, options.block_hint);
        let eq_b = detect_equilibration(&series_b, options.block_hint);
        t_a = eq_a.t0;
        t_b = eq_b.t0;
        if options.decorrelate {
            g_a = eq_a.g;
            g_b = eq_b.g;
        }
    } else if options.decorrelate {
        g_a = statistical_inefficiency(&series_a);
        g_b = statistical_inefficiency(&series_b);
    }

    let retained_a = pair.leg_a().len() - t_a;
    let retained_b = pair.leg_b().len() - t_b;
    let mut n_a = retained_a;
    let mut n_b = retained_b;
    // The leg with the smaller g holds more independent information per
    // frame; enlarging its draw keeps the two effective budgets comparable.
    if options.decorrelate {
        if g_a < g_b {
            n_a = (g_b / g_a * n_a as f64) as usize;
        } else if g_b < g_a {
            n_b = (g_a / g_b * n_b as f64) as usize;
        }
    }

    let smallest = n_a.min(n_b);
    let mut inflated = false;
    if smallest < options.min_floor && smallest > 0 {
        warn!(
            retained = smallest,
            floor = options.min_floor,
            "Augmenting data below the effective-sample floor via bootstrap"
        );
        n_a = n_a * options.min_floor / smallest;
        n_b = n_b * options.min_floor / smallest;
        inflated = true;
    }

    let leg_a = resample(&pair.leg_a().tail(t_a), n_a, rng);
    let leg_b = resample(&pair.leg_b().tail(t_b), n_b, rng);
    let balanced =
        PairedEnsemble::new(leg_a, leg_b).ok_or(ResampleError::EmptyResult { n_a, n_b })?;

    let effective_size = n_a as f64 / retained_a as f64 * g_a;
    Ok((
        balanced,
        ResampleReport {
            t_a,
            t_b,
            g_a,
            g_b,
            effective_size,
            inflated,
        },
    ))
}

/// Identity when the trace already has the target length, otherwise a
/// uniform draw with replacement.
fn resample(trace: &EnergyTrace, target: usize, rng: &mut impl Rng) -> EnergyTrace {
    if target == trace.len() || trace.is_empty() {
        return trace.clone();
    }
    let indices: Vec<usize> = (0..target).map(|_| rng.gen_range(0..trace.len())).collect();
    trace.select(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noisy_pair(len_a: usize, len_b: usize) -> PairedEnsemble {
        let make = |len: usize, phase: f64| {
            EnergyTrace::new(
                (0..len)
                    .map(|i| {
                        let x = (i as f64 * 0.7 + phase).sin();
                        [x, x + 1.0]
                    })
                    .collect(),
            )
        };
        PairedEnsemble::new(make(len_a, 0.0), make(len_b, 1.3)).unwrap()
    }

    #[test]
    fn raw_regime_keeps_both_legs_untouched() {
        let pair = noisy_pair(250, 300);
        let options = ResampleOptions {
            equilibrate: false,
            decorrelate: false,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let (balanced, report) = balance(&pair, &options, &mut rng).unwrap();
        assert_eq!(balanced.leg_a().len(), 250);
        assert_eq!(balanced.leg_b().len(), 300);
        assert_eq!(balanced.leg_a(), pair.leg_a());
        assert_eq!(report.g_a, 1.0);
        assert_eq!(report.g_b, 1.0);
        assert!(!report.inflated);
        assert_eq!(report.effective_size, 1.0);
    }

    #[test]
    fn short_inputs_are_inflated_to_the_floor() {
        let pair = noisy_pair(30, 40);
        let options = ResampleOptions {
            equilibrate: false,
            decorrelate: false,
            min_floor: 100,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let (balanced, report) = balance(&pair, &options, &mut rng).unwrap();
        assert!(report.inflated);
        assert!(balanced.leg_a().len() >= 100);
        assert!(balanced.leg_b().len() >= 100);
        // Proportional inflation preserves the length ratio.
        assert_eq!(balanced.leg_a().len(), 100);
        assert_eq!(balanced.leg_b().len(), 133);
    }

    #[test]
    fn never_returns_an_empty_trace() {
        let pair = noisy_pair(5, 5);
        let options = ResampleOptions::default();
        let mut rng = StdRng::seed_from_u64(42);
        let (balanced, _) = balance(&pair, &options, &mut rng).unwrap();
        assert!(!balanced.leg_a().is_empty());
        assert!(!balanced.leg_b().is_empty());
    }

    #[test]
    fn is_deterministic_for_a_fixed_seed() {
        let pair = noisy_pair(30, 30);
        let options = ResampleOptions::default();
        let (first, _) = balance(&pair, &options, &mut StdRng::seed_from_u64(9)).unwrap();
        let (second, _) = balance(&pair, &options, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn equilibrated_regime_reports_trim_points() {
        // A strong transient in leg A's energy gap only.
        let mut samples: Vec<[f64; 2]> = (0..100)
            .map(|i| {
                let v = 40.0 * (-(i as f64) / 10.0).exp();
                [v, 0.0]
            })
            .collect();
        samples.extend((0..900).map(|i| {
            let x = (i as f64 * 0.9).sin() * 0.1;
            [x, 0.0]
        }));
        let leg_a = EnergyTrace::new(samples);
        let leg_b = pairless_stationary(1000);
        let pair = PairedEnsemble::new(leg_a, leg_b).unwrap();

        let options = ResampleOptions {
            equilibrate: true,
            decorrelate: true,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let (balanced, report) = balance(&pair, &options, &mut rng).unwrap();
        assert!(report.t_a > 0);
        assert!(report.g_a >= 1.0 && report.g_b >= 1.0);
        assert!(!balanced.leg_a().is_empty());
        assert!(report.effective_size > 0.0);
    }

    fn pairless_stationary(len: usize) -> EnergyTrace {
        EnergyTrace::new(
            (0..len)
                .map(|i| {
                    let x = (i as f64 * 1.1).sin() * 0.1;
                    [x, 0.0]
                })
                .collect(),
        )
    }
}
