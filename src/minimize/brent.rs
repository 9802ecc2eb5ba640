use crate::{
    error::MinimizerError,
    math::{GOLDEN_SECTION, SQRT_EPS},
    minimize::{bracket_with, eval_finite, Bracket, BracketOptions, UnivariateFn},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for Brent refinement of a bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineOptions {
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub max_iters: usize,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            rel_tol: 1e-8,
            abs_tol: 1e-10,
            max_iters: 100,
        }
    }
}

impl RefineOptions {
    pub fn validate(&self) -> Result<(), MinimizerError> {
        if !(self.rel_tol > 0.0 && self.rel_tol.is_finite()) {
            return Err(MinimizerError::InvalidTolerance);
        }
        if !(self.abs_tol > 0.0 && self.abs_tol.is_finite()) {
            return Err(MinimizerError::InvalidTolerance);
        }
        Ok(())
    }
}

/// Result of Brent's minimization
#[derive(Debug, Clone, PartialEq)]
pub struct RefineResult {
    pub xmin: f64,
    pub fmin: f64,
    pub iters: usize,
    pub fn_evals: usize,
    pub converged: bool,
}

/// Refine a bracket with Brent's method at relative tolerance `rel_tol`
pub fn refine<F>(
    f: &F,
    bracket: &mut Bracket,
    rel_tol: f64,
) -> Result<RefineResult, MinimizerError>
where
    F: UnivariateFn + ?Sized,
{
    let options = RefineOptions {
        rel_tol,
        ..RefineOptions::default()
    };
    refine_with(f, bracket, &options)
}

/// Brent's method: golden-section search accelerated by parabolic
/// interpolation.
///
/// The bracket is shrunk in place; its inner point is always the best point
/// found so far. Refinement stops when
/// `upper_x - lower_x < abs_tol + rel_tol * min(|lower_x|, |upper_x|)`.
///
/// # Errors
/// * `InvalidBracket` if `bracket` does not straddle a minimum
/// * `InvalidTolerance` if a tolerance is not positive and finite
/// * `FunctionEvaluationError` if `f` returns NaN or an infinity
///
/// Running out of iterations is reported with `converged == false`.
pub fn refine_with<F>(
    f: &F,
    bracket: &mut Bracket,
    options: &RefineOptions,
) -> Result<RefineResult, MinimizerError>
where
    F: UnivariateFn + ?Sized,
{
    options.validate()?;

    let goal = |a: f64, b: f64| options.abs_tol + options.rel_tol * a.abs().min(b.abs());

    // A bracket already narrowed to the goal may carry ties at rounding level
    let settled = bracket.lower_x < bracket.inner_x
        && bracket.inner_x < bracket.upper_x
        && bracket.inner_f <= bracket.lower_f
        && bracket.inner_f <= bracket.upper_f
        && bracket.width() < goal(bracket.lower_x, bracket.upper_x);
    if !bracket.is_bracket() && !settled {
        return Err(MinimizerError::InvalidBracket);
    }

    let (mut a, mut b) = (bracket.lower_x, bracket.upper_x);
    let (mut fa, mut fb) = (bracket.lower_f, bracket.upper_f);

    // x is the best point, w the second best, v the previous w
    let (mut x, mut w, mut v) = (bracket.inner_x, bracket.inner_x, bracket.inner_x);
    let (mut fx, mut fw, mut fv) = (bracket.inner_f, bracket.inner_f, bracket.inner_f);

    // d is the last step, e the one before it
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    let mut fn_evals = 0;
    let mut iters = 0;
    let mut converged = false;

    while iters < options.max_iters {
        let tol = goal(a, b);
        if b - a < tol {
            converged = true;
            break;
        }
        iters += 1;

        let xm = 0.5 * (a + b);
        // Never step below the noise floor, nor so far that u leaves (a, b)
        let tol1 = (SQRT_EPS * x.abs() + options.abs_tol / 3.0).min(0.25 * tol);
        let tol2 = 2.0 * tol1;

        let mut golden = true;
        if e.abs() > tol1 {
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            } else {
                q = -q;
            }
            let e_prev = e;
            if q > f64::MIN_POSITIVE
                && p.abs() < (0.5 * q * e_prev).abs()
                && p > q * (a - x)
                && p < q * (b - x)
            {
                e = d;
                d = p / q;
                let u = x + d;
                if u - a < tol2 || b - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
                golden = false;
            }
        }

        if golden {
            e = if x >= xm { a - x } else { b - x };
            d = GOLDEN_SECTION * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = eval_finite(f, u)?;
        fn_evals += 1;
        log::trace!(
            "refine: iter {} u = {} f(u) = {} [{}, {}] {}",
            iters,
            u,
            fu,
            a,
            b,
            if golden { "golden" } else { "parabolic" }
        );

        if fu <= fx {
            if u >= x {
                a = x;
                fa = fx;
            } else {
                b = x;
                fb = fx;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
                fa = fu;
            } else {
                b = u;
                fb = fu;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }

        bracket.lower_x = a;
        bracket.upper_x = b;
        bracket.lower_f = fa;
        bracket.upper_f = fb;
        bracket.inner_x = x;
        bracket.inner_f = fx;
    }

    if !converged && b - a < goal(a, b) {
        converged = true;
    }

    log::debug!(
        "refine: xmin = {} fmin = {} after {} iterations, converged = {}",
        x,
        fx,
        iters,
        converged
    );

    Ok(RefineResult {
        xmin: x,
        fmin: fx,
        iters,
        fn_evals,
        converged,
    })
}

/// Bracketing plus Brent refinement around an owned objective
#[derive(Clone)]
pub struct Brent {
    xmin: f64,
    fmin: f64,
    f: Box<dyn UnivariateFn>,
    bracket_options: BracketOptions,
    options: RefineOptions,
    iters: usize,
    fn_evals: usize,
    converged: bool,
}

impl Brent {
    pub fn new<F>(f: F) -> Self
    where
        F: UnivariateFn + 'static,
    {
        Self::new_boxed(Box::new(f))
    }

    pub fn new_boxed(f: Box<dyn UnivariateFn>) -> Self {
        Brent {
            xmin: 0.0,
            fmin: 0.0,
            f,
            bracket_options: BracketOptions::default(),
            options: RefineOptions::default(),
            iters: 0,
            fn_evals: 0,
            converged: false,
        }
    }

    pub fn with_options(mut self, options: RefineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_bracket_options(mut self, options: BracketOptions) -> Self {
        self.bracket_options = options;
        self
    }

    /// Bracket a minimum starting from `a` and `b`, then refine it
    pub fn minimize(&mut self, a: f64, b: f64) -> Result<RefineResult, MinimizerError> {
        self.converged = false;
        let mut bracket = bracket_with(self.f.as_ref(), a, b, &self.bracket_options)?;
        self.minimize_bracket(&mut bracket)
    }

    /// Refine a bracket the caller already holds
    pub fn minimize_bracket(
        &mut self,
        bracket: &mut Bracket,
    ) -> Result<RefineResult, MinimizerError> {
        self.converged = false;
        let result = refine_with(self.f.as_ref(), bracket, &self.options)?;
        self.xmin = result.xmin;
        self.fmin = result.fmin;
        self.iters = result.iters;
        self.fn_evals = result.fn_evals;
        self.converged = result.converged;
        Ok(result)
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    pub fn fmin(&self) -> f64 {
        self.fmin
    }

    pub fn iters(&self) -> usize {
        self.iters
    }

    pub fn fn_evals(&self) -> usize {
        self.fn_evals
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl fmt::Debug for Brent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Brent( xmin: {}, fmin: {}, iters: {}, converged: {})",
            self.xmin, self.fmin, self.iters, self.converged
        )
    }
}
