//! SO(3) - exponential and logarithm maps
//!
//! Rotations are handled in their 3×3 matrix form. Algebra elements appear either as
//! axis-angle vectors in R³ or as skew-symmetric matrices, related by [`so3_hat`] and
//! [`so3_vee`].
//!
//! # Numerical Conditioning
//!
//! The logarithm `log(R) = θ / (2 sin θ) · (R - Rᵀ)` is singular at both ends of the angle range:
//!
//! | Angle range   | Problem                         | Treatment                          |
//! |---------------|---------------------------------|------------------------------------|
//! | θ → 0         | θ / sin θ is 0/0                | ratio = 1 + θ²/6                   |
//! | θ → π         | R - Rᵀ → 0, axis is lost        | rebuild axis from the symmetric part |
//!
//! In the near-π branch only the magnitudes of the axis components can be read off the
//! symmetric part. The 8 sign assignments are exponentiated back and the one closest to R in
//! Frobenius distance is kept.

use crate::lie::config::{EXP_ZERO_ANGLE_THRESHOLD, LogMapConfig};
use crate::lie::{DoublePrecision, argmin, constant, generators};
use nalgebra::{Matrix3, RealField, Vector3};
use rayon::prelude::*;
use tracing::{trace, warn};

/// Sign assignments tried by the near-π branch, in binary counting order.
const SIGN_PATTERNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
];

/// Which closed form produced a logarithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogBranch {
    /// θ / sin θ scaling of the antisymmetric part
    Generic,
    /// Taylor expansion of θ / sin θ around 0
    NearZero,
    /// Axis rebuilt from the symmetric part, signs chosen by round-trip distance
    NearPi,
}

/// Hat map for SO(3)
///
/// # Notes
/// [θ]ₓ = θx·E_x + θy·E_y + θz·E_z = [0 -θz θy; θz 0 -θx; -θy θx 0]
///
pub fn so3_hat<T: RealField + Copy>(v: &Vector3<T>) -> Matrix3<T> {
    let [e_x, e_y, e_z] = generators::<T>();
    e_x * v.x + e_y * v.y + e_z * v.z
}

/// Vee map for SO(3), inverse of [`so3_hat`].
///
/// Reads the three independent off-diagonal entries. Skew-symmetry of the input is not checked.
pub fn so3_vee<T: RealField + Copy>(a: &Matrix3<T>) -> Vector3<T> {
    Vector3::new(-a[(1, 2)], a[(0, 2)], -a[(0, 1)])
}

/// SO3 exponential map.
///
/// # Arguments
/// * `v` - Algebra vector [θx, θy, θz]
///
/// # Notes
/// Rodrigues' formula with K = [v / θ]ₓ:
/// R = I + sin θ K + (1 - cos θ) K²
///
/// For θ below 1e-20 the axis is replaced by zero, so the origin maps to exactly I.
pub fn so3_exp<T: DoublePrecision>(v: &Vector3<T>) -> Matrix3<T> {
    let theta = v.norm();
    let axis = if theta < constant(EXP_ZERO_ANGLE_THRESHOLD) {
        Vector3::zeros()
    } else {
        v / theta
    };
    let k = so3_hat(&axis);

    Matrix3::identity() + k * theta.sin() + (k * k) * (T::one() - theta.cos())
}

/// SO3 logarithmic map with the default thresholds.
///
/// # Arguments
/// * `r` - Rotation matrix
///
/// # Returns
/// The algebra element in matrix form; apply [`so3_vee`] (or use [`log_vector`]) for the vector.
pub fn so3_log<T: DoublePrecision>(r: &Matrix3<T>) -> Matrix3<T> {
    so3_log_with_branch(r, &LogMapConfig::default()).0
}

/// SO3 logarithmic map with explicit thresholds.
pub fn so3_log_with_config<T: DoublePrecision>(
    r: &Matrix3<T>,
    config: &LogMapConfig,
) -> Matrix3<T> {
    so3_log_with_branch(r, config).0
}

/// SO3 logarithmic map, also reporting which branch produced the result.
///
/// # Notes
/// A = (R - Rᵀ) / 2,  cos θ = (tr R - 1) / 2 clamped to [-1, 1]
/// log R = θ / sin θ · A
///
/// The near-π branch takes precedence over the near-zero branch.
pub fn so3_log_with_branch<T: DoublePrecision>(
    r: &Matrix3<T>,
    config: &LogMapConfig,
) -> (Matrix3<T>, LogBranch) {
    let half = constant::<T>(0.5);
    let cos_theta = ((r.trace() - T::one()) * half)
        .max(-T::one())
        .min(T::one());
    let theta = cos_theta.acos();

    if cos_theta < constant::<T>(config.pi_cos_tolerance) - T::one() {
        return (so3_log_pi(r, theta), LogBranch::NearPi);
    }

    let anti_sym = (r - r.transpose()) * half;

    if theta < constant(config.zero_angle_threshold) {
        // θ / sin θ -> 1 + θ²/6 as θ -> 0
        let ratio = T::one() + theta * theta / constant(6.0);
        return (anti_sym * ratio, LogBranch::NearZero);
    }

    (anti_sym * (theta / theta.sin()), LogBranch::Generic)
}

/// Logarithm of a rotation whose angle is close to π.
///
/// Inaccurate for θ around 0, where the scale θ² / (1 - cos θ) degenerates.
///
/// # Arguments
/// * `r` - Rotation matrix
/// * `theta` - Its rotation angle
///
/// # Notes
/// Z = θ² / (1 - cos θ) · ((R + Rᵀ)/2 - I) = θ² (n nᵀ - I), so with q = diag(Z):
/// |x₁| = √((q₁ - q₂ - q₃)/2)
/// |x₂| = √((-q₁ + q₂ - q₃)/2)
/// |x₃| = √((-q₁ - q₂ + q₃)/2)
pub fn so3_log_pi<T: DoublePrecision>(r: &Matrix3<T>, theta: T) -> Matrix3<T> {
    let half = constant::<T>(0.5);
    let sym = (r + r.transpose()) * half;
    let z = (sym - Matrix3::identity()) * (theta * theta / (T::one() - theta.cos()));

    let (q_1, q_2, q_3) = (z[(0, 0)], z[(1, 1)], z[(2, 2)]);
    let magnitude = |s: T| (s * half).max(T::zero()).sqrt();
    let x = Vector3::new(
        magnitude(q_1 - q_2 - q_3),
        magnitude(-q_1 + q_2 - q_3),
        magnitude(-q_1 - q_2 + q_3),
    );

    // Components are known up to sign; keep the assignment that round-trips closest to r.
    let candidates = SIGN_PATTERNS.map(|signs| {
        Vector3::new(
            x.x * constant(signs[0]),
            x.y * constant(signs[1]),
            x.z * constant(signs[2]),
        )
    });
    let selector = argmin(
        candidates
            .iter()
            .map(|candidate| (r - so3_exp(candidate)).norm_squared()),
    );

    so3_hat(&candidates[selector])
}

/// Logarithm in vector form: vee(log(R)).
pub fn log_vector<T: DoublePrecision>(r: &Matrix3<T>) -> Vector3<T> {
    so3_vee(&so3_log(r))
}

/// Check RᵀR ≈ I and det R ≈ 1 within `tolerance`.
pub fn is_rotation_matrix<T: RealField + Copy>(r: &Matrix3<T>, tolerance: T) -> bool {
    let orthogonality = (r.transpose() * r - Matrix3::identity()).norm();
    let determinant = (r.determinant() - T::one()).abs();
    orthogonality < tolerance && determinant < tolerance
}

/// Exponential map over a batch of algebra vectors.
pub fn so3_exp_batch<T>(vectors: &[Vector3<T>]) -> Vec<Matrix3<T>>
where
    T: DoublePrecision + Send + Sync,
{
    vectors.par_iter().map(so3_exp).collect()
}

/// Logarithm map over a batch of rotations with the default thresholds.
pub fn so3_log_batch<T>(rotations: &[Matrix3<T>]) -> Vec<Matrix3<T>>
where
    T: DoublePrecision + Send + Sync,
{
    so3_log_batch_with_config(rotations, &LogMapConfig::default())
}

/// Logarithm map over a batch of rotations.
///
/// Each element picks its own branch; the counts are reported at TRACE level.
pub fn so3_log_batch_with_config<T>(
    rotations: &[Matrix3<T>],
    config: &LogMapConfig,
) -> Vec<Matrix3<T>>
where
    T: DoublePrecision + Send + Sync,
{
    let (logs, branches): (Vec<Matrix3<T>>, Vec<LogBranch>) = rotations
        .par_iter()
        .map(|r| so3_log_with_branch(r, config))
        .unzip();

    let near_zero = branches
        .iter()
        .filter(|branch| **branch == LogBranch::NearZero)
        .count();
    let near_pi = branches
        .iter()
        .filter(|branch| **branch == LogBranch::NearPi)
        .count();
    trace!(batch = rotations.len(), near_zero, near_pi, "so3 log batch");

    let non_finite = logs
        .iter()
        .filter(|log| log.iter().any(|value| !value.is_finite()))
        .count();
    if non_finite > 0 {
        warn!(
            non_finite,
            batch = rotations.len(),
            "so3 log produced non-finite values; inputs are probably not rotations"
        );
    }

    logs
}
