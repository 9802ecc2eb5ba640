use crate::{
    error::MinimizerError,
    math::{GOLDEN_RATIO, GOLDEN_SECTION},
    minimize::{eval_finite, UnivariateFn},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for minimum bracketing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketOptions {
    /// Maximum number of golden-ratio expansion steps
    pub max_expansions: usize,
}

impl Default for BracketOptions {
    fn default() -> Self {
        Self {
            max_expansions: 100,
        }
    }
}

impl BracketOptions {
    pub fn validate(&self) -> Result<(), MinimizerError> {
        if self.max_expansions == 0 {
            return Err(MinimizerError::InvalidArgument(String::from(
                "max_expansions must be at least 1",
            )));
        }
        Ok(())
    }
}

/// Three abscissas around a minimum, with the function values there
///
/// A true bracket has `lower_x < inner_x < upper_x` and `inner_f` strictly
/// below both `lower_f` and `upper_f`; [`Bracket::is_bracket`] checks it.
#[derive(Clone, Copy, PartialEq)]
pub struct Bracket {
    pub(crate) lower_x: f64,
    pub(crate) inner_x: f64,
    pub(crate) upper_x: f64,
    pub(crate) lower_f: f64,
    pub(crate) inner_f: f64,
    pub(crate) upper_f: f64,
}

impl Bracket {
    /// Build a bracket over `[lower, upper]`, placing the inner point at the
    /// golden section of the interval.
    ///
    /// The endpoints are reordered if needed. The result is not guaranteed to
    /// straddle a minimum.
    pub fn new<F>(f: &F, lower: f64, upper: f64) -> Result<Self, MinimizerError>
    where
        F: UnivariateFn + ?Sized,
    {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(MinimizerError::InvalidArgument(String::from(
                "bracket endpoints must be finite",
            )));
        }
        if lower == upper {
            return Err(MinimizerError::InvalidArgument(String::from(
                "bracket endpoints must differ",
            )));
        }

        let (lower, upper) = if lower < upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        let inner = lower + GOLDEN_SECTION * (upper - lower);

        Ok(Bracket {
            lower_x: lower,
            inner_x: inner,
            upper_x: upper,
            lower_f: eval_finite(f, lower)?,
            inner_f: eval_finite(f, inner)?,
            upper_f: eval_finite(f, upper)?,
        })
    }

    /// Build a bracket from three known points, sorting them by abscissa.
    pub fn from_points(points: [(f64, f64); 3]) -> Self {
        let mut points = points;
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Bracket {
            lower_x: points[0].0,
            inner_x: points[1].0,
            upper_x: points[2].0,
            lower_f: points[0].1,
            inner_f: points[1].1,
            upper_f: points[2].1,
        }
    }

    /// Check the straddling invariant
    pub fn is_bracket(&self) -> bool {
        self.lower_x < self.inner_x
            && self.inner_x < self.upper_x
            && self.inner_f < self.lower_f
            && self.inner_f < self.upper_f
    }

    pub fn lower_x(&self) -> f64 {
        self.lower_x
    }

    pub fn inner_x(&self) -> f64 {
        self.inner_x
    }

    pub fn upper_x(&self) -> f64 {
        self.upper_x
    }

    pub fn lower_f(&self) -> f64 {
        self.lower_f
    }

    pub fn inner_f(&self) -> f64 {
        self.inner_f
    }

    pub fn upper_f(&self) -> f64 {
        self.upper_f
    }

    pub fn width(&self) -> f64 {
        self.upper_x - self.lower_x
    }

    /// The lowest of the three points, as `(x, f(x))`
    pub(crate) fn best(&self) -> (f64, f64) {
        let mut best = (self.inner_x, self.inner_f);
        if self.lower_f < best.1 {
            best = (self.lower_x, self.lower_f);
        }
        if self.upper_f < best.1 {
            best = (self.upper_x, self.upper_f);
        }
        best
    }
}

impl fmt::Debug for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bracket( lower: ({}, {}), inner: ({}, {}), upper: ({}, {}))",
            self.lower_x, self.lower_f, self.inner_x, self.inner_f, self.upper_x, self.upper_f
        )
    }
}

/// Bracket a minimum of `f` starting from the trial points `a` and `b`
pub fn bracket<F>(f: &F, a: f64, b: f64) -> Result<Bracket, MinimizerError>
where
    F: UnivariateFn + ?Sized,
{
    bracket_with(f, a, b, &BracketOptions::default())
}

/// Bracket a minimum of `f` starting from the trial points `a` and `b`
///
/// The downhill point of the pair becomes the interior point, then the
/// search steps outward by the golden ratio until the newly tried value is
/// no longer below the interior value.
///
/// # Errors
/// * `InvalidArgument` if `a == b` or either point is not finite
/// * `FunctionEvaluationError` if `f` returns NaN or an infinity
/// * `BracketNotFound` if `options.max_expansions` steps do not turn uphill
pub fn bracket_with<F>(
    f: &F,
    a: f64,
    b: f64,
    options: &BracketOptions,
) -> Result<Bracket, MinimizerError>
where
    F: UnivariateFn + ?Sized,
{
    options.validate()?;
    if !a.is_finite() || !b.is_finite() {
        return Err(MinimizerError::InvalidArgument(String::from(
            "trial points must be finite",
        )));
    }
    if a == b {
        return Err(MinimizerError::InvalidArgument(String::from(
            "trial points must differ",
        )));
    }

    let (mut ax, mut bx) = (a, b);
    let mut fa = eval_finite(f, ax)?;
    let mut fb = eval_finite(f, bx)?;

    // Walk downhill from a towards b
    if fb > fa {
        std::mem::swap(&mut ax, &mut bx);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut cx = bx + GOLDEN_RATIO * (bx - ax);
    let mut fc = eval_finite(f, cx)?;

    let mut expansions = 0;
    while fb > fc {
        expansions += 1;
        if expansions > options.max_expansions {
            log::debug!(
                "bracket: still descending after {} expansions at x = {}",
                options.max_expansions,
                cx
            );
            return Err(MinimizerError::BracketNotFound);
        }

        ax = bx;
        fa = fb;
        bx = cx;
        fb = fc;
        cx = bx + GOLDEN_RATIO * (bx - ax);
        if !cx.is_finite() {
            return Err(MinimizerError::BracketNotFound);
        }
        fc = eval_finite(f, cx)?;
    }

    // A tie with a neighbour is no strict bracket, but the minimum of a
    // unimodal f lies between the tied points
    if fb == fa || fb == fc {
        let (lo, flo, hi, fhi) = if fb == fa {
            (ax, fa, bx, fb)
        } else {
            (bx, fb, cx, fc)
        };
        let mx = 0.5 * (lo + hi);
        let fm = eval_finite(f, mx)?;
        if fm < fb {
            let result = Bracket::from_points([(lo, flo), (mx, fm), (hi, fhi)]);
            log::debug!("bracket: {:?} from midpoint of tied pair", result);
            return Ok(result);
        }
    }

    let result = Bracket::from_points([(ax, fa), (bx, fb), (cx, fc)]);
    log::debug!("bracket: {:?} after {} expansions", result, expansions);
    Ok(result)
}
