use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpError {
    #[error("Interpolation requires at least {required} points, got {actual}")]
    TooFewPoints { required: usize, actual: usize },
    #[error("Abscissa and ordinate lengths differ: {x_len} vs {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[error("Abscissa values must be strictly increasing (violation at index {index})")]
    NotIncreasing { index: usize },
}

fn validate(x: &[f64], y: &[f64], min_points: usize) -> Result<(), InterpError> {
    if x.len() != y.len() {
        return Err(InterpError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if x.len() < min_points {
        return Err(InterpError::TooFewPoints {
            required: min_points,
            actual: x.len(),
        });
    }
    for i in 1..x.len() {
        if x[i] <= x[i - 1] {
            return Err(InterpError::NotIncreasing { index: i });
        }
    }
    Ok(())
}

/// Index of the interval `[x[i], x[i+1])` containing `t`, clamped to the
/// boundary intervals so evaluation outside the knot range extrapolates.
fn interval_index(x: &[f64], t: f64) -> usize {
    match x.binary_search_by(|probe| probe.total_cmp(&t)) {
        Ok(i) => i.min(x.len() - 2),
        Err(0) => 0,
        Err(i) => (i - 1).min(x.len() - 2),
    }
}

/// Piecewise-constant "previous value" interpolant with flat extrapolation
/// on both sides.
#[derive(Debug, Clone)]
pub struct StepInterpolant {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl StepInterpolant {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, InterpError> {
        validate(&x, &y, 1)?;
        Ok(Self { x, y })
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        if t < self.x[0] {
            return self.y[0];
        }
        match self.x.binary_search_by(|probe| probe.total_cmp(&t)) {
            Ok(i) => self.y[i],
            Err(i) => self.y[i - 1],
        }
    }
}

/// Monotone shape-preserving cubic interpolant (Fritsch–Carlson tangents),
/// evaluated with the boundary cubics outside the knot range.
#[derive(Debug, Clone)]
pub struct PchipInterpolant {
    x: Vec<f64>,
    y: Vec<f64>,
    tangents: Vec<f64>,
}

impl PchipInterpolant {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, InterpError> {
        validate(&x, &y, 2)?;

        let n = x.len();
        let h: Vec<f64> = (0..n - 1).map(|i| x[i + 1] - x[i]).collect();
        let slopes: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        let mut tangents = vec![0.0; n];
        if n == 2 {
            tangents[0] = slopes[0];
            tangents[1] = slopes[0];
        } else {
            for i in 1..n - 1 {
                tangents[i] = interior_tangent(h[i - 1], h[i], slopes[i - 1], slopes[i]);
            }
            tangents[0] = edge_tangent(h[0], h[1], slopes[0], slopes[1]);
            tangents[n - 1] = edge_tangent(h[n - 2], h[n - 3], slopes[n - 2], slopes[n - 3]);
        }

        Ok(Self { x, y, tangents })
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        let i = interval_index(&self.x, t);
        let h = self.x[i + 1] - self.x[i];
        let s = (t - self.x[i]) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * self.y[i]
            + h10 * h * self.tangents[i]
            + h01 * self.y[i + 1]
            + h11 * h * self.tangents[i + 1]
    }
}

fn interior_tangent(h_prev: f64, h_next: f64, d_prev: f64, d_next: f64) -> f64 {
    if d_prev == 0.0 || d_next == 0.0 || d_prev.signum() != d_next.signum() {
        return 0.0;
    }
    let w1 = 2.0 * h_next + h_prev;
    let w2 = h_next + 2.0 * h_prev;
    (w1 + w2) / (w1 / d_prev + w2 / d_next)
}

fn edge_tangent(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    // One-sided three-point estimate, clamped to preserve monotonicity.
    let d = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if d.signum() != d0.signum() {
        0.0
    } else if d0.signum() != d1.signum() && d.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        d
    }
}
