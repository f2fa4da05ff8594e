//! Density corrections for the SO(3) exponential map.
//!
//! A density defined on the algebra pushes forward to the group through `exp`, which is
//! neither injective (θ and θ + 2πk give the same rotation) nor volume preserving. These
//! helpers enumerate the preimages of a rotation and evaluate the volume change.

use crate::lie::constant;
use nalgebra::{RealField, Vector3};
use rayon::prelude::*;

/// Below this norm the log-abs-det Jacobian uses its Taylor expansion.
pub const JACOBIAN_TAYLOR_THRESHOLD: f64 = 1e-4;

/// Algebra vectors with the same image as `x` under the exponential map.
///
/// Returns `2 * k_max + 1` vectors along the direction of `x` with norms ‖x‖ + 2πk for
/// k = -k_max..=k_max, in increasing k. The k = 0 entry is `x` itself. A zero input has no
/// direction; the x axis is used for it.
pub fn so3_xset<T: RealField + Copy>(x: &Vector3<T>, k_max: usize) -> Vec<Vector3<T>> {
    let norm = x.norm();
    let direction = if norm > T::zero() {
        x / norm
    } else {
        Vector3::x()
    };

    let k_max = k_max as i64;
    (-k_max..=k_max)
        .map(|k| direction * (norm + T::two_pi() * constant(k as f64)))
        .collect()
}

/// [`so3_xset`] over a batch.
///
/// The outer index is the shift k (length `2 * k_max + 1`), the inner index the batch element.
pub fn so3_xset_batch<T>(xs: &[Vector3<T>], k_max: usize) -> Vec<Vec<Vector3<T>>>
where
    T: RealField + Copy + Send + Sync,
{
    let per_element: Vec<Vec<Vector3<T>>> = xs.par_iter().map(|x| so3_xset(x, k_max)).collect();

    (0..2 * k_max + 1)
        .map(|shift| per_element.iter().map(|set| set[shift]).collect())
        .collect()
}

/// Log absolute determinant of the differential of the exponential map at `x`.
///
/// # Notes
/// log |det J(x)| = log(2 - 2 cos ‖x‖) - log(‖x‖²)
///
/// Evaluated in `f64` and cast back to `T` as 2 log |2 sin(‖x‖/2) / ‖x‖|, which avoids the
/// cancellation in 2 - 2 cos ‖x‖. For ‖x‖ < 1e-4 the expansion -‖x‖²/12 is used instead.
pub fn log_abs_det_jacobian<T: RealField + Copy>(x: &Vector3<T>) -> T {
    let x: Vector3<f64> = x.map(|component| nalgebra::convert_unchecked::<T, f64>(component));
    let norm = x.norm();

    let jacobian = if norm < JACOBIAN_TAYLOR_THRESHOLD {
        -norm * norm / 12.0
    } else {
        2.0 * (2.0 * (0.5 * norm).sin() / norm).abs().ln()
    };
    constant(jacobian)
}

/// [`log_abs_det_jacobian`] over a batch.
pub fn log_abs_det_jacobian_batch<T>(xs: &[Vector3<T>]) -> Vec<T>
where
    T: RealField + Copy + Send + Sync,
{
    xs.par_iter().map(log_abs_det_jacobian).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lie::so3::so3_exp;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_xset_norms() {
        let x = Vector3::<f64>::new(0.3, -0.4, 1.2);
        let set = so3_xset(&x, 2);

        assert_eq!(set.len(), 5);
        assert!((set[2] - x).norm() < TOLERANCE);
        for (index, shifted) in set.iter().enumerate() {
            let k = index as f64 - 2.0;
            assert!((shifted.norm() - (x.norm() + 2.0 * PI * k).abs()).abs() < 1e-10);
        }
    }

    #[test]
    fn test_xset_same_rotation() {
        let x = Vector3::new(-0.8, 0.1, 0.5);
        let r = so3_exp(&x);
        for shifted in so3_xset(&x, 3) {
            assert!((so3_exp(&shifted) - r).norm() < 1e-10);
        }
    }

    #[test]
    fn test_xset_zero_vector() {
        let set = so3_xset(&Vector3::<f64>::zeros(), 1);
        assert!(set.iter().all(|v| v.iter().all(|c| c.is_finite())));
        assert!(set[1].norm() < TOLERANCE);
        assert!((set[2].norm() - 2.0 * PI).abs() < TOLERANCE);
    }

    #[test]
    fn test_xset_batch_layout() {
        let xs = vec![Vector3::new(0.1, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0)];
        let sets = so3_xset_batch(&xs, 1);

        assert_eq!(sets.len(), 3);
        assert!(sets.iter().all(|shift| shift.len() == 2));
        for (shifted, x) in sets[1].iter().zip(&xs) {
            assert!((shifted - x).norm() < TOLERANCE);
        }
        assert!((sets[2][1] - Vector3::new(0.0, 0.0, 2.0 + 2.0 * PI)).norm() < TOLERANCE);
    }

    #[test]
    fn test_jacobian_closed_form() {
        let x = Vector3::new(0.0, 1.0, 0.0);
        let expected = (2.0 - 2.0 * 1.0_f64.cos()).ln();
        assert!((log_abs_det_jacobian(&x) - expected).abs() < TOLERANCE);
    }

    #[test]
    fn test_jacobian_origin_is_zero() {
        assert_eq!(log_abs_det_jacobian(&Vector3::<f64>::zeros()), 0.0);
        let tiny = log_abs_det_jacobian(&Vector3::<f64>::new(1e-6, 0.0, 0.0));
        assert!(tiny.abs() < 1e-12);
    }

    #[test]
    fn test_jacobian_continuous_at_threshold() {
        let threshold = JACOBIAN_TAYLOR_THRESHOLD;
        let below = log_abs_det_jacobian(&Vector3::new(threshold * 0.999, 0.0, 0.0));
        let above = log_abs_det_jacobian(&Vector3::new(threshold * 1.001, 0.0, 0.0));
        // the exact values differ by about 3.3e-12
        assert!((below - above).abs() < 1e-11);
    }

    #[test]
    fn test_jacobian_accurate_above_threshold() {
        let t = 2.0 * JACOBIAN_TAYLOR_THRESHOLD;
        // log(sinc²(t/2)) = -t²/12 - t⁴/1440 + ...
        let expected = -t * t / 12.0 - t.powi(4) / 1440.0;
        let value = log_abs_det_jacobian(&Vector3::new(0.0, t, 0.0));
        assert!((value - expected).abs() < 2e-15);
    }

    #[test]
    fn test_jacobian_beyond_two_pi() {
        let x = Vector3::new(0.0, 0.0, 2.0 * PI + 1.0);
        let expected = (2.0 - 2.0 * 1.0_f64.cos()).ln() - (2.0 * PI + 1.0).powi(2).ln();
        assert!((log_abs_det_jacobian(&x) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_jacobian_single_precision() {
        let x32 = Vector3::new(0.5_f32, -0.25, 0.75);
        let x64 = Vector3::new(0.5_f64, -0.25, 0.75);
        let j32 = log_abs_det_jacobian(&x32);
        let j64 = log_abs_det_jacobian(&x64);
        assert!((f64::from(j32) - j64).abs() < 1e-6);
    }

    #[test]
    fn test_jacobian_batch() {
        let xs = vec![Vector3::new(0.2, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.5)];
        let values = log_abs_det_jacobian_batch(&xs);
        assert_eq!(values.len(), 2);
        assert_eq!(values[1], log_abs_det_jacobian(&xs[1]));
    }
}
