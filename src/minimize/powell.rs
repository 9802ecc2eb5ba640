use crate::{
    error::MinimizerError,
    math::{is_all_finite, norm, pow2, TINY},
    minimize::{LineSearch, LineSearchOptions, MultivariateFn},
};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options for Powell's direction-set method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowellOptions {
    /// Fractional tolerance on the function value
    pub ftol: f64,
    pub max_iters: usize,
    pub line: LineSearchOptions,
}

impl Default for PowellOptions {
    fn default() -> Self {
        Self {
            ftol: 1e-10,
            max_iters: 200,
            line: LineSearchOptions::default(),
        }
    }
}

impl PowellOptions {
    pub fn validate(&self) -> Result<(), MinimizerError> {
        if !(self.ftol > 0.0 && self.ftol.is_finite()) {
            return Err(MinimizerError::InvalidTolerance);
        }
        self.line.validate()
    }
}

/// Result of Powell's method optimization
#[derive(Debug, Clone, PartialEq)]
pub struct PowellResult {
    pub xmin: Array1<f64>,
    pub fmin: f64,
    pub iters: usize,
    pub fn_evals: usize,
    pub converged: bool,
    /// Direction set at exit, one direction per row
    pub directions: Array2<f64>,
    /// Function value at the start and after each iteration
    pub history: Vec<f64>,
    pub improvement: Vec<f64>,
}

/// The N×N identity, i.e. the coordinate axes as rows
pub fn unit_directions(n: usize) -> Array2<f64> {
    Array2::eye(n)
}

/// Powell's method on `point` with the direction set `directions`
///
/// Both arguments are updated in place: `point` ends at the best point
/// found and `directions` holds the final direction set, so a later call
/// can warm start from it.
///
/// Each iteration minimizes along every direction in turn, then tries the
/// net displacement of the iteration as a new direction. The displacement
/// replaces the direction of largest decrease only when extrapolating along
/// it still lowers `f` and the decrease was not dominated by that single
/// direction, which keeps the set from collapsing.
///
/// Convergence is declared when one full iteration lowers `f` by no more
/// than `ftol * (|f_old| + |f_new|) / 2` (plus a tiny absolute floor).
///
/// # Errors
/// * `InvalidDimension` for an empty point
/// * `InvalidDirectionSet` if `directions` is not N×N
/// * `InvalidTolerance` if `ftol` is not positive and finite
/// * `FunctionEvaluationError` if `f` is not finite at the start
/// * errors from the line searches are propagated
pub fn minimize<F>(
    f: &F,
    point: &mut Array1<f64>,
    directions: &mut Array2<f64>,
    options: &PowellOptions,
) -> Result<PowellResult, MinimizerError>
where
    F: MultivariateFn,
{
    minimize_dyn(f, point, directions, options)
}

fn minimize_dyn(
    f: &dyn MultivariateFn,
    point: &mut Array1<f64>,
    directions: &mut Array2<f64>,
    options: &PowellOptions,
) -> Result<PowellResult, MinimizerError> {
    let n = point.len();
    if n == 0 {
        return Err(MinimizerError::InvalidDimension);
    }
    if directions.dim() != (n, n) {
        return Err(MinimizerError::InvalidDirectionSet);
    }
    options.validate()?;
    if !is_all_finite(point.view()) {
        return Err(MinimizerError::InvalidArgument(String::from(
            "starting point must be finite",
        )));
    }

    let mut fret = f.call(point);
    if !fret.is_finite() {
        return Err(MinimizerError::FunctionEvaluationError);
    }
    let mut fn_evals = 1;

    let mut line = LineSearch::new(n, options.line.clone());
    let mut p0 = point.clone();
    let mut xit = Array1::<f64>::zeros(n);
    let mut history = vec![fret];
    let mut improvement = Vec::new();

    let mut iters = 0;
    let mut converged = false;

    while iters < options.max_iters {
        iters += 1;
        let f0 = fret;
        p0.assign(point);

        let mut ibig = 0;
        let mut del = 0.0;
        for (i, direction) in directions.outer_iter().enumerate() {
            // Search on a copy, the stored direction keeps its scale
            xit.assign(&direction);
            let fprev = fret;
            let result = line.search_dyn(f, point, &mut xit)?;
            fn_evals += result.fn_evals;
            fret = result.fmin;
            if fprev - fret > del {
                del = fprev - fret;
                ibig = i;
            }
        }

        log::debug!(
            "powell: iter {} f = {} (was {}), largest decrease {} along direction {}",
            iters,
            fret,
            f0,
            del,
            ibig
        );

        if 2.0 * (f0 - fret).abs() <= options.ftol * (f0.abs() + fret.abs()) + TINY {
            history.push(fret);
            improvement.push(f0 - fret);
            converged = true;
            break;
        }

        let extrapolated = 2.0 * &*point - &p0;
        let fe = f.call(&extrapolated);
        fn_evals += 1;
        if !fe.is_finite() {
            log::debug!("powell: f = {} at extrapolated point, keeping directions", fe);
        } else if fe < f0 {
            let t = 2.0 * (f0 - 2.0 * fret + fe) * pow2(f0 - fret - del) - del * pow2(f0 - fe);
            if t < 0.0 {
                xit.assign(&*point);
                xit -= &p0;
                let result = line.search_dyn(f, point, &mut xit)?;
                fn_evals += result.fn_evals;
                fret = result.fmin;

                // A zero step leaves no usable direction
                if norm(xit.view()) > 0.0 {
                    directions.row_mut(ibig).assign(&xit);
                    log::trace!("powell: replaced direction {} with {}", ibig, xit);
                }
            }
        }

        history.push(fret);
        improvement.push(f0 - fret);
    }

    if !converged {
        log::warn!(
            "powell: no convergence after {} iterations, f = {}",
            iters,
            fret
        );
    }

    Ok(PowellResult {
        xmin: point.clone(),
        fmin: fret,
        iters,
        fn_evals,
        converged,
        directions: directions.clone(),
        history,
        improvement,
    })
}

/// Powell's direction-set minimizer around an owned objective
#[derive(Clone)]
pub struct Powell {
    xmin: Array1<f64>,
    fmin: f64,
    f: Box<dyn MultivariateFn>,
    options: PowellOptions,
    iters: usize,
    converged: bool,
}

impl Powell {
    pub fn new<F>(f: F) -> Self
    where
        F: MultivariateFn + 'static,
    {
        Self::new_boxed(Box::new(f))
    }

    pub fn new_boxed(f: Box<dyn MultivariateFn>) -> Self {
        Powell {
            xmin: Array1::zeros(0),
            fmin: 0.0,
            f,
            options: PowellOptions::default(),
            iters: 0,
            converged: false,
        }
    }

    pub fn with_options(mut self, options: PowellOptions) -> Self {
        self.options = options;
        self
    }

    /// Minimize from `x0` starting with the coordinate axes as directions
    pub fn minimize(&mut self, x0: Array1<f64>) -> Result<PowellResult, MinimizerError> {
        let directions = unit_directions(x0.len());
        self.minimize_with_directions(x0, directions)
    }

    /// Minimize from `x0` with a caller-supplied direction set (rows)
    pub fn minimize_with_directions(
        &mut self,
        x0: Array1<f64>,
        directions: Array2<f64>,
    ) -> Result<PowellResult, MinimizerError> {
        self.converged = false;
        let mut point = x0;
        let mut directions = directions;
        let result = minimize_dyn(self.f.as_ref(), &mut point, &mut directions, &self.options)?;
        self.xmin = point;
        self.fmin = result.fmin;
        self.iters = result.iters;
        self.converged = result.converged;
        Ok(result)
    }

    pub fn xmin(&self) -> &Array1<f64> {
        &self.xmin
    }

    pub fn fmin(&self) -> f64 {
        self.fmin
    }

    pub fn iters(&self) -> usize {
        self.iters
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl fmt::Debug for Powell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Powell( xmin: {}, fmin: {}, iters: {}, converged: {})",
            self.xmin, self.fmin, self.iters, self.converged
        )
    }
}

#[cfg(test)]
mod powell_tests {
    use super::*;
    use float_cmp::{approx_eq, F64Margin};

    const MARGIN: F64Margin = F64Margin {
        epsilon: 1e-8,
        ulps: 10,
    };

    fn bowl(x: &Array1<f64>) -> f64 {
        (x[0] - 1.0).powi(2) + 10.0 * (x[1] + 0.5).powi(2)
    }

    // Rotated, so the coordinate axes are not conjugate
    fn tilted(x: &Array1<f64>) -> f64 {
        let u = x[0] + x[1] - 1.0;
        let v = x[0] - x[1] + 2.0;
        u * u + 25.0 * v * v
    }

    #[test]
    fn test_unit_directions() {
        let d = unit_directions(3);
        assert_eq!(d.dim(), (3, 3));
        assert_eq!(d.row(1), array![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_separable_quadratic() {
        let mut powell = Powell::new(bowl);
        let result = powell.minimize(array![4.0, 4.0]).unwrap();

        assert!(result.converged);
        assert!(approx_eq!(f64, result.xmin[0], 1.0, MARGIN));
        assert!(approx_eq!(f64, result.xmin[1], -0.5, MARGIN));
        assert!(result.fmin < 1e-14);
        assert_eq!(powell.xmin(), &result.xmin);
        assert!(powell.converged());
    }

    #[test]
    fn test_tilted_quadratic() {
        // Minimum at u = v = 0: x = (-0.5, 1.5)
        let mut point = array![3.0, 3.0];
        let mut directions = unit_directions(2);

        let options = PowellOptions::default();
        let result = minimize(&tilted, &mut point, &mut directions, &options).unwrap();

        assert!(result.converged);
        assert!((point[0] + 0.5).abs() < 1e-7);
        assert!((point[1] - 1.5).abs() < 1e-7);
        assert_eq!(result.xmin, point);
        assert_eq!(result.directions, directions);
    }

    #[test]
    fn test_history_is_monotone() {
        let mut powell = Powell::new(tilted);
        let result = powell.minimize(array![-4.0, 2.0]).unwrap();

        assert_eq!(result.history.len(), result.iters + 1);
        assert_eq!(result.improvement.len(), result.iters);
        for pair in result.history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_history_matches_iteration_ends() {
        let mut powell = Powell::new(tilted);
        let result = powell.minimize(array![-4.0, 2.0]).unwrap();

        assert_eq!(result.history.last(), Some(&result.fmin));
        for (i, &decrease) in result.improvement.iter().enumerate() {
            assert_eq!(decrease, result.history[i] - result.history[i + 1]);
        }
    }

    #[test]
    fn test_symmetric_start_reaches_minimum() {
        // f(p) == f(p + e_i) along both axes from (-0.5, -0.5)
        let f = |x: &Array1<f64>| x[0] * x[0] + x[1] * x[1];
        let mut powell = Powell::new(f);

        let result = powell.minimize(array![-0.5, -0.5]).unwrap();

        assert!(result.converged);
        assert!(result.xmin[0].abs() < 1e-8);
        assert!(result.xmin[1].abs() < 1e-8);
        assert!(result.fmin < 1e-16);
    }

    #[test]
    fn test_warm_start() {
        let mut point = array![3.0, 3.0];
        let mut directions = unit_directions(2);
        let options = PowellOptions::default();
        minimize(&tilted, &mut point, &mut directions, &options).unwrap();
        assert_ne!(directions, unit_directions(2));

        // Restart from a nearby point with the learned directions
        let mut restart = array![2.0, 1.0];
        let second = minimize(&tilted, &mut restart, &mut directions, &options).unwrap();

        assert!(second.converged);
        assert!((restart[0] + 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_iteration_budget() {
        let rosen = |x: &Array1<f64>| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2);
        let options = PowellOptions {
            max_iters: 2,
            ..PowellOptions::default()
        };
        let mut powell = Powell::new(rosen).with_options(options);

        let result = powell.minimize(array![-1.2, 1.0]).unwrap();

        assert!(!result.converged);
        assert_eq!(result.iters, 2);
        // The best point so far is still reported
        assert!(result.fmin < rosen(&array![-1.2, 1.0]));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut powell = Powell::new(bowl);
        assert_eq!(
            powell.minimize(Array1::zeros(0)),
            Err(MinimizerError::InvalidDimension)
        );
        assert_eq!(
            powell.minimize_with_directions(array![0.0, 0.0], unit_directions(3)),
            Err(MinimizerError::InvalidDirectionSet)
        );

        let options = PowellOptions {
            ftol: 0.0,
            ..PowellOptions::default()
        };
        let mut powell = Powell::new(bowl).with_options(options);
        assert_eq!(
            powell.minimize(array![0.0, 0.0]),
            Err(MinimizerError::InvalidTolerance)
        );
    }

    #[test]
    fn test_non_finite_start() {
        let f = |x: &Array1<f64>| x[0].ln();
        let mut powell = Powell::new(f);
        assert_eq!(
            powell.minimize(array![-1.0]),
            Err(MinimizerError::FunctionEvaluationError)
        );
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: PowellOptions = serde_json::from_str(r#"{"ftol": 1e-6}"#).unwrap();
        assert_eq!(options.ftol, 1e-6);
        assert_eq!(options.max_iters, 200);
        assert_eq!(options.line, LineSearchOptions::default());
    }
}
