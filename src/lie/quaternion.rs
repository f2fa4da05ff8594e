//! Quaternion, rotation matrix and Euler ZYZ conversions.
//!
//! Quaternions are `Vector4` with the scalar last: `(x, y, z, w)`, in the passive convention.
//! The quaternion of R is the Hamilton (active) quaternion of Rᵀ, so its vector part has the
//! opposite sign of `nalgebra::UnitQuaternion` for the same matrix. q and -q describe the same
//! rotation; no canonical sign is enforced.
//!
//! Euler angles `(α, β, γ)` use the ZYZ product Rz(α) Ry(β) Rz(γ) and are not reduced modulo
//! 2π. Following the passive quaternions, [`matrix_to_euler_zyz`] of R returns the angles of Rᵀ:
//!
//! ```
//! use nalgebra::Vector3;
//! use relie::lie::{euler_zyz_to_matrix, matrix_to_euler_zyz, so3_exp};
//!
//! let r = so3_exp(&Vector3::new(0.3, -0.5, 0.4));
//! let angles = matrix_to_euler_zyz(&r);
//! assert!((euler_zyz_to_matrix(&angles) - r.transpose()).norm() < 1e-5);
//! ```
//!
//! These angles are the input format of the Wigner-D transform.

use crate::lie::{argmax, constant};
use nalgebra::{Matrix3, RealField, Vector3, Vector4};
use rand::Rng;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Added under the square root of the quaternion denominators.
pub const QUATERNION_DENOMINATOR_EPS: f64 = 1e-6;

/// The arccos argument of the Euler β angle is clamped to [-1 + eps, 1 - eps].
pub const EULER_ACOS_EPS: f64 = 1e-6;

/// Convert a rotation matrix to its passive quaternion `(x, y, z, w)`.
///
/// # Notes
/// Four closed forms are evaluated, each dividing by one of
/// d₀ = ½√(1 + R₀₀ - R₁₁ - R₂₂),  d₁ = ½√(1 - R₀₀ + R₁₁ - R₂₂),
/// d₂ = ½√(1 - R₀₀ - R₁₁ + R₂₂),  d₃ = ½√(1 + R₀₀ + R₁₁ + R₂₂)
/// (with 1e-6 added under the root). The form with the largest denominator is kept.
///
/// The result is unit up to the epsilon; [`quaternion_to_matrix`] renormalizes.
pub fn matrix_to_quaternion<T: RealField + Copy>(r: &Matrix3<T>) -> Vector4<T> {
    let one = T::one();
    let half = constant::<T>(0.5);
    let four = constant::<T>(4.0);
    let eps = constant::<T>(QUATERNION_DENOMINATOR_EPS);

    let (r00, r11, r22) = (r[(0, 0)], r[(1, 1)], r[(2, 2)]);
    let denom = [
        one + r00 - r11 - r22,
        one - r00 + r11 - r22,
        one - r00 - r11 + r22,
        one + r00 + r11 + r22,
    ]
    .map(|term| (eps + term.abs()).sqrt() * half);

    let xy = r[(0, 1)] + r[(1, 0)];
    let xz = r[(0, 2)] + r[(2, 0)];
    let yz = r[(1, 2)] + r[(2, 1)];
    let wx = r[(1, 2)] - r[(2, 1)];
    let wy = r[(2, 0)] - r[(0, 2)];
    let wz = r[(0, 1)] - r[(1, 0)];

    let scale = denom.map(|d| four * d);
    let cases = [
        Vector4::new(denom[0], xy / scale[0], xz / scale[0], wx / scale[0]),
        Vector4::new(xy / scale[1], denom[1], yz / scale[1], wy / scale[1]),
        Vector4::new(xz / scale[2], yz / scale[2], denom[2], wz / scale[2]),
        Vector4::new(wx / scale[3], wy / scale[3], wz / scale[3], denom[3]),
    ];

    cases[argmax(denom)]
}

/// Normalize a passive quaternion `q` and convert it to a rotation matrix.
///
/// Any nonzero quaternion gives an orthogonal matrix. The result is the transpose of the
/// Hamilton rotation matrix of `q`.
pub fn quaternion_to_matrix<T: RealField + Copy>(q: &Vector4<T>) -> Matrix3<T> {
    let q = q / q.norm();
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let two = constant::<T>(2.0);

    Matrix3::new(
        w * w + x * x - y * y - z * z,
        two * (x * y + w * z),
        two * (x * z - w * y),
        two * (x * y - w * z),
        w * w - x * x + y * y - z * z,
        two * (y * z + w * x),
        two * (x * z + w * y),
        two * (y * z - w * x),
        w * w - x * x - y * y + z * z,
    )
}

/// Convert a passive quaternion to Euler ZYZ angles `(α, β, γ)`.
///
/// Rz(α) Ry(β) Rz(γ) equals the transpose of [`quaternion_to_matrix`] of `q`.
///
/// # Notes
/// α = atan2(yz - wx, xz + wy)
/// β = acos(w² - x² - y² + z²)
/// γ = atan2(yz + wx, wy - xz)
///
/// The arccos argument is clamped away from ±1, so β never reaches exactly 0 or π.
pub fn quaternion_to_euler_zyz<T: RealField + Copy>(q: &Vector4<T>) -> Vector3<T> {
    let q = q / q.norm();
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let bound = T::one() - constant::<T>(EULER_ACOS_EPS);

    Vector3::new(
        (y * z - w * x).atan2(x * z + w * y),
        (w * w - x * x - y * y + z * z).max(-bound).min(bound).acos(),
        (y * z + w * x).atan2(w * y - x * z),
    )
}

/// Convert a rotation matrix to Euler ZYZ angles through its quaternion.
///
/// The angles describe Rᵀ: `euler_zyz_to_matrix(&matrix_to_euler_zyz(r))` is `r.transpose()`.
pub fn matrix_to_euler_zyz<T: RealField + Copy>(r: &Matrix3<T>) -> Vector3<T> {
    quaternion_to_euler_zyz(&matrix_to_quaternion(r))
}

/// Build Rz(α) Ry(β) Rz(γ) from Euler ZYZ angles.
///
/// This is the rotation represented by the Wigner-D matrix of the same angles.
pub fn euler_zyz_to_matrix<T: RealField + Copy>(angles: &Vector3<T>) -> Matrix3<T> {
    rotation_z(angles.x) * rotation_y(angles.y) * rotation_z(angles.z)
}

fn rotation_z<T: RealField + Copy>(angle: T) -> Matrix3<T> {
    let (sin, cos) = angle.sin_cos();
    let (zero, one) = (T::zero(), T::one());
    Matrix3::new(cos, -sin, zero, sin, cos, zero, zero, zero, one)
}

fn rotation_y<T: RealField + Copy>(angle: T) -> Matrix3<T> {
    let (sin, cos) = angle.sin_cos();
    let (zero, one) = (T::zero(), T::one());
    Matrix3::new(cos, zero, sin, zero, one, zero, -sin, zero, cos)
}

/// Sample `n` quaternions uniformly distributed over SO(3).
///
/// Uses Shoemake's subgroup algorithm with three uniform variates per sample.
pub fn random_quaternions<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Vector4<f64>> {
    (0..n)
        .map(|_| {
            let u1: f64 = rng.random();
            let u2: f64 = rng.random();
            let u3: f64 = rng.random();
            let (a, b) = ((1.0 - u1).sqrt(), u1.sqrt());
            Vector4::new(
                a * (2.0 * PI * u2).sin(),
                a * (2.0 * PI * u2).cos(),
                b * (2.0 * PI * u3).sin(),
                b * (2.0 * PI * u3).cos(),
            )
        })
        .collect()
}

/// [`matrix_to_quaternion`] over a batch.
pub fn matrix_to_quaternion_batch<T>(rotations: &[Matrix3<T>]) -> Vec<Vector4<T>>
where
    T: RealField + Copy + Send + Sync,
{
    rotations.par_iter().map(matrix_to_quaternion).collect()
}

/// [`quaternion_to_matrix`] over a batch.
pub fn quaternion_to_matrix_batch<T>(quaternions: &[Vector4<T>]) -> Vec<Matrix3<T>>
where
    T: RealField + Copy + Send + Sync,
{
    quaternions.par_iter().map(quaternion_to_matrix).collect()
}

/// [`quaternion_to_euler_zyz`] over a batch.
pub fn quaternion_to_euler_zyz_batch<T>(quaternions: &[Vector4<T>]) -> Vec<Vector3<T>>
where
    T: RealField + Copy + Send + Sync,
{
    quaternions.par_iter().map(quaternion_to_euler_zyz).collect()
}

/// [`matrix_to_euler_zyz`] over a batch.
pub fn matrix_to_euler_zyz_batch<T>(rotations: &[Matrix3<T>]) -> Vec<Vector3<T>>
where
    T: RealField + Copy + Send + Sync,
{
    rotations.par_iter().map(matrix_to_euler_zyz).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lie::so3::{is_rotation_matrix, so3_exp};
    use nalgebra::{Quaternion, UnitQuaternion};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOLERANCE: f64 = 1e-5;

    fn same_rotation(q: &Vector4<f64>, expected: &Vector4<f64>) -> bool {
        let q = q.normalize();
        let expected = expected.normalize();
        (q - expected).norm() < TOLERANCE || (q + expected).norm() < TOLERANCE
    }

    #[test]
    fn test_identity_quaternion() {
        let q = matrix_to_quaternion(&Matrix3::<f64>::identity());
        assert!(same_rotation(&q, &Vector4::new(0.0, 0.0, 0.0, 1.0)));
        assert!(q.w > 0.0);
    }

    #[test]
    fn test_quaternion_is_nalgebra_conjugate() {
        let v = Vector3::new(0.3, -0.5, 0.9);
        let q = matrix_to_quaternion(&so3_exp(&v));
        let active = UnitQuaternion::from_scaled_axis(v);
        let expected = Vector4::new(-active.i, -active.j, -active.k, active.w);
        assert!(same_rotation(&q, &expected));
    }

    #[test]
    fn test_passive_reference_values() {
        let r = so3_exp(&Vector3::new(0.3, -0.5, 0.4));

        let q = matrix_to_quaternion(&r);
        let expected = Vector4::new(-0.146894, 0.244824, -0.195859, 0.938148);
        assert!((q - expected).norm() < 1e-5);

        let angles = matrix_to_euler_zyz(&r);
        let expected = Vector3::new(0.334604, 0.579080, -0.746235);
        assert!((angles - expected).norm() < 1e-5);
        assert!((euler_zyz_to_matrix(&angles) - r.transpose()).norm() < TOLERANCE);
    }

    #[test]
    fn test_quaternion_to_matrix_matches_nalgebra() {
        let q = Vector4::new(0.1, -0.2, 0.3, 0.9);
        let expected = UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
            .to_rotation_matrix()
            .into_inner()
            .transpose();
        assert!((quaternion_to_matrix(&q) - expected).norm() < 1e-12);
    }

    #[test]
    fn test_quaternion_to_matrix_unnormalized() {
        let q = Vector4::new(2.0, -1.0, 0.5, 3.0);
        let r = quaternion_to_matrix(&q);
        assert!(is_rotation_matrix(&r, 1e-12));
        assert!((r - quaternion_to_matrix(&(q * -7.0))).norm() < 1e-12);
    }

    #[test]
    fn test_every_branch_round_trips() {
        // One rotation per dominant denominator: π about x, y, z, and a small rotation.
        let rotations = [
            so3_exp(&Vector3::new(3.0, 0.2, -0.1)),
            so3_exp(&Vector3::new(0.1, 3.0, 0.2)),
            so3_exp(&Vector3::new(-0.2, 0.1, 3.0)),
            so3_exp(&Vector3::new(0.2, -0.1, 0.3)),
        ];
        for (expected_case, r) in rotations.iter().enumerate() {
            let q = matrix_to_quaternion(r);
            let dominant = argmax(q.map(|c| c.abs()).iter().copied());
            assert_eq!(dominant, expected_case);
            assert!((quaternion_to_matrix(&q) - r).norm() < TOLERANCE);
        }
    }

    #[test]
    fn test_euler_round_trip() {
        let angles = Vector3::new(0.4, 1.1, -2.3);
        let r = euler_zyz_to_matrix(&angles);
        // the angles returned for a matrix describe its transpose
        let recovered = matrix_to_euler_zyz(&r.transpose());
        assert!((recovered - angles).norm() < TOLERANCE);
        let rebuilt = euler_zyz_to_matrix(&matrix_to_euler_zyz(&r));
        assert!((rebuilt - r.transpose()).norm() < TOLERANCE);
    }

    #[test]
    fn test_euler_beta_clamped() {
        let angles = matrix_to_euler_zyz(&Matrix3::<f64>::identity());
        assert!(angles.y > 0.0);
        assert!(angles.y < 2e-3);
    }

    #[test]
    fn test_random_quaternions_are_unit() {
        let mut rng = StdRng::seed_from_u64(7);
        let quaternions = random_quaternions(64, &mut rng);
        assert_eq!(quaternions.len(), 64);
        for q in &quaternions {
            assert!((q.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_batches_match_single() {
        let mut rng = StdRng::seed_from_u64(11);
        let quaternions = random_quaternions(16, &mut rng);
        let rotations = quaternion_to_matrix_batch(&quaternions);
        let recovered = matrix_to_quaternion_batch(&rotations);
        let angles = quaternion_to_euler_zyz_batch(&quaternions);
        let angles_from_matrices = matrix_to_euler_zyz_batch(&rotations);

        for i in 0..quaternions.len() {
            assert!(same_rotation(&recovered[i], &quaternions[i]));
            assert_eq!(angles[i], quaternion_to_euler_zyz(&quaternions[i]));
            let rebuilt = euler_zyz_to_matrix(&angles_from_matrices[i]);
            assert!((rebuilt - rotations[i].transpose()).norm() < 1e-4);
        }
    }
}
