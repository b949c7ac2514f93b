use crate::core::models::estimate::DecorrelationResult;

/// Default number of candidate equilibration origins scanned by
/// [`detect_equilibration`]; the scan stride is `len / DEFAULT_BLOCK_HINT`.
pub const DEFAULT_BLOCK_HINT: usize = 71;

/// Minimum lag before a non-positive autocorrelation terminates the sum.
const MIN_CORRELATION_TIME: usize = 3;

/// Statistical inefficiency g of a scalar series: the average number of
/// correlated samples per effectively independent sample, g ≥ 1.
///
/// Computed as `1 + 2 Σ_t (1 − t/N) C(t)` where C is the normalized
/// autocorrelation function, truncating the sum at the first non-positive
/// C(t) once the lag exceeds a small minimum.
pub fn statistical_inefficiency(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 1.0;
    }

    let mean = series.iter().sum::<f64>() / n as f64;
    let deviations: Vec<f64> = series.iter().map(|v| v - mean).collect();
    let variance = deviations.iter().map(|d| d * d).sum::<f64>() / n as f64;
    if variance <= 0.0 {
        return 1.0;
    }

    let mut g = 1.0;
    for t in 1..n {
        let c = deviations[..n - t]
            .iter()
            .zip(&deviations[t..])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / ((n - t) as f64 * variance);
        if c <= 0.0 && t >= MIN_CORRELATION_TIME {
            break;
        }
        g += 2.0 * c * (1.0 - t as f64 / n as f64);
    }

    g.max(1.0)
}

/// Finds the equilibration index t0 whose tail maximizes the number of
/// effectively independent samples, scanning candidate origins with stride
/// `max(1, len / block_hint)`.
///
/// Deterministic: repeated calls on the same input give the same result.
pub fn detect_equilibration(series: &[f64], block_hint: usize) -> DecorrelationResult {
    let n = series.len();
    if n < 2 {
        return DecorrelationResult {
            t0: 0,
            g: 1.0,
            n_effective: n as f64,
        };
    }

    let stride = (n / block_hint.max(1)).max(1);
    let mut best = DecorrelationResult {
        t0: 0,
        g: 1.0,
        n_effective: 0.0,
    };

    let mut t0 = 0;
    // The last point alone cannot define a tail; stop one short.
    while t0 < n - 1 {
        let g = statistical_inefficiency(&series[t0..]);
        let n_effective = (n - t0) as f64 / g;
        if n_effective > best.n_effective {
            best = DecorrelationResult { t0, g, n_effective };
        }
        t0 += stride;
    }

    best
}

/// Indices of an approximately uncorrelated subsample, spaced `g` apart.
/// When `g` is not supplied it is estimated from the series first.
pub fn subsample_indices(series: &[f64], g: Option<f64>) -> Vec<usize> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }
    let g = g
        .unwrap_or_else(|| statistical_inefficiency(series))
        .max(1.0);

    let mut indices = Vec::new();
    let mut t: f64 = 0.0;
    while (t.round() as usize) < n {
        let index = t.round() as usize;
        if indices.last() != Some(&index) {
            indices.push(index);
        }
        t += g;
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated_series(len: usize, correlation: f64) -> Vec<f64> {
        // Deterministic AR(1)-like series driven by a fixed pseudo-random
        // sequence, so tests are reproducible without an RNG dependency.
        let mut noise_state = 0.5_f64;
        let mut value = 0.0;
        let mut series = Vec::with_capacity(len);
        for _ in 0..len {
            noise_state = (noise_state * 9301.0 + 49297.0) % 233280.0;
            let noise = noise_state / 233280.0 - 0.5;
            value = correlation * value + noise;
            series.push(value);
        }
        series
    }

    #[test]
    fn inefficiency_of_uncorrelated_data_is_near_one() {
        let series = correlated_series(5000, 0.0);
        let g = statistical_inefficiency(&series);
        assert!(g < 1.5, "g = {}", g);
    }

    #[test]
    fn inefficiency_grows_with_correlation() {
        let weak = statistical_inefficiency(&correlated_series(5000, 0.2));
        let strong = statistical_inefficiency(&correlated_series(5000, 0.95));
        assert!(strong > weak, "weak = {}, strong = {}", weak, strong);
        assert!(strong > 5.0, "strong = {}", strong);
    }

    #[test]
    fn inefficiency_is_at_least_one() {
        assert_eq!(statistical_inefficiency(&[]), 1.0);
        assert_eq!(statistical_inefficiency(&[1.0]), 1.0);
        assert_eq!(statistical_inefficiency(&[2.0, 2.0, 2.0, 2.0]), 1.0);
        assert!(statistical_inefficiency(&correlated_series(100, 0.5)) >= 1.0);
    }

    #[test]
    fn detect_equilibration_skips_a_transient_head() {
        // A decaying transient followed by stationary noise.
        let mut series: Vec<f64> = (0..200).map(|i| 50.0 * (-(i as f64) / 20.0).exp()).collect();
        series.extend(correlated_series(2000, 0.1));
        let result = detect_equilibration(&series, DEFAULT_BLOCK_HINT);
        assert!(result.t0 > 0, "t0 = {}", result.t0);
        assert!(result.t0 < 500, "t0 = {}", result.t0);
        assert!(result.g >= 1.0);
        assert!(result.n_effective > 0.0);
    }

    #[test]
    fn detect_equilibration_is_deterministic() {
        let series = correlated_series(1000, 0.8);
        let a = detect_equilibration(&series, DEFAULT_BLOCK_HINT);
        let b = detect_equilibration(&series, DEFAULT_BLOCK_HINT);
        assert_eq!(a.t0, b.t0);
        assert_eq!(a.g, b.g);
    }

    #[test]
    fn subsample_indices_are_strictly_increasing_and_spaced() {
        let series = correlated_series(1000, 0.9);
        let indices = subsample_indices(&series, Some(7.5));
        assert!(!indices.is_empty());
        for pair in indices.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] >= 7);
        }
        assert!(*indices.last().unwrap() < series.len());
    }

    #[test]
    fn subsample_with_unit_inefficiency_keeps_everything() {
        let series = vec![1.0, 2.0, 3.0, 4.0];
        let indices = subsample_indices(&series, Some(1.0));
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn subsample_estimates_inefficiency_when_not_given() {
        let series = correlated_series(2000, 0.95);
        let indices = subsample_indices(&series, None);
        assert!(indices.len() < series.len());
        assert!(!indices.is_empty());
    }
}
