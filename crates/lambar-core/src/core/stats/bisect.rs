use thiserror::Error;

const DEFAULT_TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BisectError {
    #[error(
        "Invalid bracket [{lower}, {upper}]: f(lower) = {f_lower}, f(upper) = {f_upper} do not change sign"
    )]
    NoSignChange {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },
    #[error("Bracket bounds are not ordered or not finite: [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },
}

/// Finds a root of `f` inside `[lower, upper]` by bisection.
///
/// The bracket must contain a sign change; this is validated up front so that
/// data violating the assumed monotonicity produces a hard error instead of a
/// silently out-of-range answer. Iteration is capped at a fixed count, which
/// together with interval halving guarantees termination.
pub fn bisect<F>(f: F, lower: f64, upper: f64) -> Result<f64, BisectError>
where
    F: Fn(f64) -> f64,
{
    bisect_with_tolerance(f, lower, upper, DEFAULT_TOLERANCE)
}

pub fn bisect_with_tolerance<F>(
    f: F,
    mut lower: f64,
    mut upper: f64,
    tolerance: f64,
) -> Result<f64, BisectError>
where
    F: Fn(f64) -> f64,
{
    if !lower.is_finite() || !upper.is_finite() || lower > upper {
        return Err(BisectError::InvalidBounds { lower, upper });
    }

    let mut f_lower = f(lower);
    let f_upper = f(upper);
    if f_lower == 0.0 {
        return Ok(lower);
    }
    if f_upper == 0.0 {
        return Ok(upper);
    }
    if f_lower.signum() == f_upper.signum() {
        return Err(BisectError::NoSignChange {
            lower,
            upper,
            f_lower,
            f_upper,
        });
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (lower + upper);
        if (upper - lower) < tolerance || mid == lower || mid == upper {
            return Ok(mid);
        }
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid.signum() == f_lower.signum() {
            lower = mid;
            f_lower = f_mid;
        } else {
            upper = mid;
        }
    }

    Ok(0.5 * (lower + upper))
}
