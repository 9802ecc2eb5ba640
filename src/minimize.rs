use dyn_clone::DynClone;
use ndarray::prelude::*;

pub mod bracket;
pub mod brent;
pub mod linmin;
pub mod powell;
pub mod root;

pub use self::bracket::{bracket, bracket_with, Bracket, BracketOptions};
pub use self::brent::{refine, refine_with, Brent, RefineOptions, RefineResult};
pub use self::linmin::{
    line_minimize, line_minimize_with, F1dim, LineSearch, LineSearchOptions, LineSearchResult,
};
pub use self::powell::{unit_directions, Powell, PowellOptions, PowellResult};
pub use self::root::{find_root, find_root_with, RootBracket, RootOptions, RootResult};

// Objective of a single variable
pub trait UnivariateFn: DynClone {
    fn call(&self, x: f64) -> f64;
}
dyn_clone::clone_trait_object!(UnivariateFn);

// Objective of a parameter vector
pub trait MultivariateFn: DynClone {
    fn call(&self, x: &Array1<f64>) -> f64;
}
dyn_clone::clone_trait_object!(MultivariateFn);

impl<F> UnivariateFn for F
where
    F: Fn(f64) -> f64 + Clone,
{
    fn call(&self, x: f64) -> f64 {
        self(x)
    }
}

impl<F> MultivariateFn for F
where
    F: Fn(&Array1<f64>) -> f64 + Clone,
{
    fn call(&self, x: &Array1<f64>) -> f64 {
        self(x)
    }
}

/// Evaluate a univariate objective, rejecting NaN and infinities
pub(crate) fn eval_finite<F>(f: &F, x: f64) -> Result<f64, crate::error::MinimizerError>
where
    F: UnivariateFn + ?Sized,
{
    let value = f.call(x);
    if !value.is_finite() {
        log::debug!("objective returned {} at x = {}", value, x);
        return Err(crate::error::MinimizerError::FunctionEvaluationError);
    }
    Ok(value)
}
