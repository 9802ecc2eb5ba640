use crate::{
    error::MinimizerError,
    minimize::{eval_finite, UnivariateFn},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for Brent's root finder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootOptions {
    /// Absolute tolerance on the root, added to the machine-precision floor
    pub x_tol: f64,
    pub max_iters: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            x_tol: 0.0,
            max_iters: 100,
        }
    }
}

impl RootOptions {
    pub fn validate(&self) -> Result<(), MinimizerError> {
        if !(self.x_tol >= 0.0 && self.x_tol.is_finite()) {
            return Err(MinimizerError::InvalidTolerance);
        }
        Ok(())
    }
}

/// Result of Brent's root finding
#[derive(Debug, Clone, PartialEq)]
pub struct RootResult {
    pub root: f64,
    pub froot: f64,
    pub iters: usize,
    pub fn_evals: usize,
    pub converged: bool,
    /// Whether the starting interval showed a sign change. A result without
    /// it is the closest point reached, not a root.
    pub bracket_verified: bool,
}

/// An interval expected to hold a zero crossing, plus the best estimate
#[derive(Clone, Copy, PartialEq)]
pub struct RootBracket {
    pub(crate) lower_x: f64,
    pub(crate) upper_x: f64,
    pub(crate) root: f64,
}

impl RootBracket {
    pub fn new(lower: f64, upper: f64) -> Self {
        let (lower_x, upper_x) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        RootBracket {
            lower_x,
            upper_x,
            root: 0.5 * (lower_x + upper_x),
        }
    }

    /// True when `f` changes sign over the interval, or vanishes at an end
    pub fn is_bracket<F>(&self, f: &F) -> bool
    where
        F: UnivariateFn + ?Sized,
    {
        straddles_zero(f.call(self.lower_x), f.call(self.upper_x))
    }

    pub fn lower_x(&self) -> f64 {
        self.lower_x
    }

    pub fn upper_x(&self) -> f64 {
        self.upper_x
    }

    pub fn root(&self) -> f64 {
        self.root
    }
}

impl fmt::Debug for RootBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RootBracket( lower: {}, upper: {}, root: {})",
            self.lower_x, self.upper_x, self.root
        )
    }
}

fn straddles_zero(fa: f64, fb: f64) -> bool {
    fa == 0.0 || fb == 0.0 || (fa > 0.0) != (fb > 0.0)
}

/// Find a root of `f` inside `bracket` with at most `max_iters` steps
pub fn find_root<F>(
    f: &F,
    bracket: &mut RootBracket,
    max_iters: usize,
) -> Result<RootResult, MinimizerError>
where
    F: UnivariateFn + ?Sized,
{
    let options = RootOptions {
        max_iters,
        ..RootOptions::default()
    };
    find_root_with(f, bracket, &options)
}

/// Brent's method for finding roots of a function
///
/// Keeps three points a, b, c where b is the best estimate and the root
/// lies between b and c. Each step tries inverse quadratic interpolation
/// (or the secant step when only two distinct values are known) and falls
/// back to bisection when the interpolated point would not shrink the
/// interval fast enough.
///
/// Convergence is declared when `|c - b| / 2 <= 2 ε |b| + x_tol / 2`, or as
/// soon as `f(b) == 0`.
///
/// An interval without a sign change is not rejected: the search still
/// runs and settles on the end with the smallest `|f|`, and the result
/// carries `bracket_verified == false`.
///
/// # Errors
/// * `InvalidArgument` if the endpoints are equal or not finite
/// * `InvalidTolerance` if `x_tol` is negative or not finite
/// * `FunctionEvaluationError` if `f` returns NaN or an infinity
pub fn find_root_with<F>(
    f: &F,
    bracket: &mut RootBracket,
    options: &RootOptions,
) -> Result<RootResult, MinimizerError>
where
    F: UnivariateFn + ?Sized,
{
    options.validate()?;
    if !bracket.lower_x.is_finite() || !bracket.upper_x.is_finite() {
        return Err(MinimizerError::InvalidArgument(String::from(
            "root bracket endpoints must be finite",
        )));
    }
    if bracket.lower_x == bracket.upper_x {
        return Err(MinimizerError::InvalidArgument(String::from(
            "root bracket endpoints must differ",
        )));
    }

    let mut a = bracket.lower_x;
    let mut b = bracket.upper_x;
    let mut fa = eval_finite(f, a)?;
    let mut fb = eval_finite(f, b)?;
    let mut fn_evals = 2;

    let bracket_verified = straddles_zero(fa, fb);
    if !bracket_verified {
        log::debug!(
            "find_root: no sign change on [{}, {}], f = ({}, {})",
            a,
            b,
            fa,
            fb
        );
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    let mut iters = 0;
    let mut converged = false;

    loop {
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            // Root is between a and b, restart c there
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * options.x_tol;
        let xm = 0.5 * (c - b);
        bracket.root = b;
        bracket.lower_x = b.min(c);
        bracket.upper_x = b.max(c);

        if xm.abs() <= tol1 || fb == 0.0 {
            converged = true;
            break;
        }
        if iters >= options.max_iters {
            break;
        }
        iters += 1;

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // Secant step
                (2.0 * xm * s, 1.0 - s)
            } else {
                // Inverse quadratic interpolation
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
        fb = eval_finite(f, b)?;
        fn_evals += 1;
        log::trace!("find_root: iter {} b = {} f(b) = {}", iters, b, fb);
    }

    if !converged {
        log::warn!(
            "find_root: no convergence after {} iterations, best estimate {}",
            iters,
            b
        );
    }

    Ok(RootResult {
        root: b,
        froot: fb,
        iters,
        fn_evals,
        converged,
        bracket_verified,
    })
}
