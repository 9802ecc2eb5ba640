use crate::{
    error::MinimizerError,
    math::is_all_finite,
    minimize::{
        bracket_with, refine_with, BracketOptions, MultivariateFn, RefineOptions, UnivariateFn,
    },
};
use ndarray::prelude::*;
use ndarray::Zip;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

/// Options for one-dimensional searches along a direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSearchOptions {
    /// Relative accuracy of the step length
    pub rel_tol: f64,
    /// Absolute accuracy of the step length
    pub abs_tol: f64,
    pub max_refine_iters: usize,
    pub max_expansions: usize,
}

impl Default for LineSearchOptions {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-10,
            max_refine_iters: 100,
            max_expansions: 100,
        }
    }
}

impl LineSearchOptions {
    fn bracket_options(&self) -> BracketOptions {
        BracketOptions {
            max_expansions: self.max_expansions,
        }
    }

    fn refine_options(&self) -> RefineOptions {
        RefineOptions {
            rel_tol: self.rel_tol,
            abs_tol: self.abs_tol,
            max_iters: self.max_refine_iters,
        }
    }

    pub fn validate(&self) -> Result<(), MinimizerError> {
        self.bracket_options().validate()?;
        self.refine_options().validate()
    }
}

/// Result of a line search
#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchResult {
    /// Step length taken along the input direction
    pub step: f64,
    /// Function value at the new point
    pub fmin: f64,
    pub fn_evals: usize,
    pub converged: bool,
}

/// `f` restricted to the line `point + t * direction`
#[derive(Clone)]
pub struct F1dim<'a> {
    f: &'a dyn MultivariateFn,
    point: &'a Array1<f64>,
    direction: &'a Array1<f64>,
    scratch: RefCell<Array1<f64>>,
    evals: Cell<usize>,
}

impl<'a> F1dim<'a> {
    pub fn new(
        f: &'a dyn MultivariateFn,
        point: &'a Array1<f64>,
        direction: &'a Array1<f64>,
    ) -> Self {
        Self::with_scratch(f, point, direction, Array1::zeros(point.len()))
    }

    /// Reuse `scratch` as the buffer for trial points
    pub fn with_scratch(
        f: &'a dyn MultivariateFn,
        point: &'a Array1<f64>,
        direction: &'a Array1<f64>,
        scratch: Array1<f64>,
    ) -> Self {
        let scratch = if scratch.len() == point.len() {
            scratch
        } else {
            Array1::zeros(point.len())
        };
        F1dim {
            f,
            point,
            direction,
            scratch: RefCell::new(scratch),
            evals: Cell::new(0),
        }
    }

    /// Number of objective evaluations made through this adapter
    pub fn evals(&self) -> usize {
        self.evals.get()
    }

    pub fn into_scratch(self) -> Array1<f64> {
        self.scratch.into_inner()
    }
}

impl UnivariateFn for F1dim<'_> {
    fn call(&self, t: f64) -> f64 {
        let mut x = self.scratch.borrow_mut();
        Zip::from(&mut *x)
            .and(self.point)
            .and(self.direction)
            .for_each(|x, &p, &d| *x = p + t * d);
        self.evals.set(self.evals.get() + 1);
        self.f.call(&x)
    }
}

/// Reusable line search for points of one dimension
///
/// Holds the trial-point buffer so repeated searches do not allocate.
#[derive(Debug, Clone)]
pub struct LineSearch {
    options: LineSearchOptions,
    scratch: Array1<f64>,
}

impl LineSearch {
    pub fn new(n: usize, options: LineSearchOptions) -> Self {
        LineSearch {
            options,
            scratch: Array1::zeros(n),
        }
    }

    pub fn options(&self) -> &LineSearchOptions {
        &self.options
    }

    /// Minimize `f` along `direction` starting from `point`.
    ///
    /// On return `direction` has been scaled by the step taken and `point`
    /// moved by it, so `point` is the new minimum and `direction` the actual
    /// displacement. The returned `fmin` is `f(point)`.
    pub fn search<F>(
        &mut self,
        f: &F,
        point: &mut Array1<f64>,
        direction: &mut Array1<f64>,
    ) -> Result<LineSearchResult, MinimizerError>
    where
        F: MultivariateFn,
    {
        self.search_dyn(f, point, direction)
    }

    pub(crate) fn search_dyn(
        &mut self,
        f: &dyn MultivariateFn,
        point: &mut Array1<f64>,
        direction: &mut Array1<f64>,
    ) -> Result<LineSearchResult, MinimizerError> {
        let n = point.len();
        if n == 0 {
            return Err(MinimizerError::InvalidDimension);
        }
        if direction.len() != n {
            return Err(MinimizerError::DimensionMismatch {
                expected: n,
                found: direction.len(),
            });
        }
        if !is_all_finite(point.view()) || !is_all_finite(direction.view()) {
            return Err(MinimizerError::InvalidArgument(String::from(
                "point and direction must be finite",
            )));
        }
        self.options.validate()?;

        if direction.iter().all(|&d| d == 0.0) {
            let fmin = f.call(point);
            if !fmin.is_finite() {
                return Err(MinimizerError::FunctionEvaluationError);
            }
            return Ok(LineSearchResult {
                step: 0.0,
                fmin,
                fn_evals: 1,
                converged: true,
            });
        }

        let scratch = std::mem::take(&mut self.scratch);
        let g = F1dim::with_scratch(f, point, direction, scratch);

        let outcome = Self::minimize_line(&g, &self.options);
        let fn_evals = g.evals();
        self.scratch = g.into_scratch();
        let (step, fmin, converged) = outcome?;

        direction.mapv_inplace(|d| d * step);
        *point += &*direction;

        Ok(LineSearchResult {
            step,
            fmin,
            fn_evals,
            converged,
        })
    }

    fn minimize_line(
        g: &F1dim<'_>,
        options: &LineSearchOptions,
    ) -> Result<(f64, f64, bool), MinimizerError> {
        let mut bracket = bracket_with(g, 0.0, 1.0, &options.bracket_options())?;

        if !bracket.is_bracket() {
            // Ties are split by the bracketing, so the line is flat here
            let (step, fmin) = bracket.best();
            log::debug!("line search: flat bracket {:?}, step = {}", bracket, step);
            return Ok((step, fmin, true));
        }

        let result = refine_with(g, &mut bracket, &options.refine_options())?;
        if !result.converged {
            log::warn!(
                "line search: refinement stopped after {} iterations, width {}",
                result.iters,
                bracket.width()
            );
        }
        Ok((result.xmin, result.fmin, result.converged))
    }
}

/// Minimize `f` along `direction` from `point` with default options
pub fn line_minimize<F>(
    f: &F,
    point: &mut Array1<f64>,
    direction: &mut Array1<f64>,
) -> Result<LineSearchResult, MinimizerError>
where
    F: MultivariateFn,
{
    line_minimize_with(f, point, direction, &LineSearchOptions::default())
}

/// Minimize `f` along `direction` from `point`
///
/// # Errors
/// * `InvalidDimension` for an empty point
/// * `DimensionMismatch` if `direction` and `point` differ in length
/// * `BracketNotFound` if `f` keeps decreasing along the line
/// * `FunctionEvaluationError` if `f` returns NaN or an infinity
pub fn line_minimize_with<F>(
    f: &F,
    point: &mut Array1<f64>,
    direction: &mut Array1<f64>,
    options: &LineSearchOptions,
) -> Result<LineSearchResult, MinimizerError>
where
    F: MultivariateFn,
{
    LineSearch::new(point.len(), options.clone()).search(f, point, direction)
}
