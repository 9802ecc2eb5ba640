//! Derivative-free minimization and root finding.
//!
//! * [`minimize::bracket()`] brackets a minimum of a function of one variable
//! * [`minimize::refine`] narrows a bracket with Brent's method
//! * [`minimize::find_root`] locates a zero crossing with Brent's method
//! * [`minimize::line_minimize`] searches along a direction in N dimensions
//! * [`minimize::Powell`] minimizes in N dimensions with Powell's method
pub mod error;
pub mod math;
pub mod minimize;
pub mod prelude;
