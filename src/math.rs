//! Numeric constants and small helpers shared by the minimizers.

use ndarray::prelude::*;
use num_traits::Float;

/// Golden-section fraction `(3 - √5) / 2`, i.e. `1 - 1/φ`
pub const GOLDEN_SECTION: f64 = 0.3819660;

/// Bracket expansion factor `1 / GOLDEN_SECTION - 1 ≈ 1.618034`
pub const GOLDEN_RATIO: f64 = 1.0 / GOLDEN_SECTION - 1.0;

/// Square root of the machine epsilon, the smallest useful relative step
/// when locating a minimum.
pub const SQRT_EPS: f64 = 1.4901161193847656e-8;

/// Guards relative tests against a function whose minimum value is zero.
pub const TINY: f64 = 1e-25;

#[inline]
pub fn pow2<T: Float>(x: T) -> T {
    x * x
}

#[inline]
pub fn pow3<T: Float>(x: T) -> T {
    x * x * x
}

#[inline]
pub fn pow4<T: Float>(x: T) -> T {
    let x2 = x * x;
    x2 * x2
}

/// Integer power by repeated squaring, exact for the small exponents the
/// objectives use.
pub fn powi_fixed<T: Float>(x: T, n: u32) -> T {
    let mut result = T::one();
    let mut base = x;
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            result = result * base;
        }
        base = base * base;
        n >>= 1;
    }
    result
}

/// Euclidean norm of a vector view
pub fn norm(v: ArrayView1<f64>) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

pub fn is_all_finite(v: ArrayView1<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

#[cfg(test)]
mod math_tests {
    use super::*;
    use float_cmp::{approx_eq, F64Margin};

    const MARGIN: F64Margin = F64Margin {
        epsilon: 1e-12,
        ulps: 4,
    };

    #[test]
    fn test_golden_constants() {
        assert!(approx_eq!(f64, GOLDEN_RATIO, 1.618034, epsilon = 1e-6));
        assert!(approx_eq!(f64, SQRT_EPS, f64::EPSILON.sqrt(), MARGIN));
        assert!((GOLDEN_SECTION - (3.0 - 5.0_f64.sqrt()) / 2.0).abs() < 1e-7);
    }

    #[test]
    fn test_fixed_powers() {
        assert_eq!(pow2(3.0_f64), 9.0);
        assert_eq!(pow3(-2.0_f64), -8.0);
        assert_eq!(pow4(2.0_f32), 16.0);
        assert_eq!(powi_fixed(1.5_f64, 0), 1.0);
        assert!(approx_eq!(f64, powi_fixed(1.1_f64, 7), 1.1_f64.powi(7), MARGIN));
    }

    #[test]
    fn test_vector_helpers() {
        let v = array![3.0, 4.0];
        assert!(approx_eq!(f64, norm(v.view()), 5.0, MARGIN));
        assert!(is_all_finite(v.view()));
        assert!(!is_all_finite(array![1.0, f64::NAN].view()));
    }
}
