//! Conversions between representations of 3D rotations.
//!
//! This module provides the SO(3) building blocks used by density and flow models over
//! the rotation group:
//! - **so3**: hat/vee, exponential and logarithm maps with singularity handling
//! - **density**: coset enumeration and the log-abs-det Jacobian of the exponential map
//! - **quaternion**: matrix ↔ quaternion ↔ Euler ZYZ conversions
//!
//! Representation    | Type           | Constraint
//! ----------------- | -------------- | -----------------------------
//! Algebra vector    | `Vector3<T>`   | none (non-injective beyond 2π)
//! Algebra matrix    | `Matrix3<T>`   | A = -Aᵀ
//! Group matrix      | `Matrix3<T>`   | RᵀR = I, det R = 1
//! Quaternion        | `Vector4<T>`   | (x, y, z, w), unit after conversion
//! Euler angles ZYZ  | `Vector3<T>`   | R = Rz(α) Ry(β) Rz(γ), not reduced mod 2π
//!
//! # Scalar types
//!
//! All kernels are generic over nalgebra's `RealField`, so they run on `f64`, `f32` or any
//! forward-mode dual number type implementing `RealField`. The exponential and logarithm maps
//! additionally require [`DoublePrecision`]: their branch thresholds (1e-20, 1e-5) are
//! meaningless in single precision, so `f32` inputs are rejected at compile time.
//!
//! Discrete choices (sign selection near θ = π, quaternion branch selection) are made by
//! comparing scores and returning an index. Comparisons on dual numbers only look at the
//! primal part, so the index never carries a derivative while the selected value does.

use nalgebra::{Matrix3, RealField};

pub mod config;
pub mod density;
pub mod quaternion;
pub mod so3;

pub use config::LogMapConfig;
pub use density::{log_abs_det_jacobian, log_abs_det_jacobian_batch, so3_xset, so3_xset_batch};
pub use quaternion::{
    euler_zyz_to_matrix, matrix_to_euler_zyz, matrix_to_euler_zyz_batch, matrix_to_quaternion,
    matrix_to_quaternion_batch, quaternion_to_euler_zyz, quaternion_to_euler_zyz_batch,
    quaternion_to_matrix, quaternion_to_matrix_batch, random_quaternions,
};
pub use so3::{
    LogBranch, is_rotation_matrix, log_vector, so3_exp, so3_exp_batch, so3_hat, so3_log,
    so3_log_batch, so3_log_batch_with_config, so3_log_pi, so3_log_with_branch,
    so3_log_with_config, so3_vee,
};

/// Scalar types carrying at least double precision.
///
/// Implemented for `f64`. Dual number types built on `f64` may implement it to run the
/// exponential and logarithm maps with forward-mode derivatives.
pub trait DoublePrecision: RealField + Copy {}

impl DoublePrecision for f64 {}

/// The three generators of so(3), one per algebra vector component.
///
/// [θ]ₓ = θx·E_x + θy·E_y + θz·E_z
pub fn generators<T: RealField + Copy>() -> [Matrix3<T>; 3] {
    let zero = T::zero();
    let one = T::one();
    [
        Matrix3::new(zero, zero, zero, zero, zero, -one, zero, one, zero),
        Matrix3::new(zero, zero, one, zero, zero, zero, -one, zero, zero),
        Matrix3::new(zero, -one, zero, one, zero, zero, zero, zero, zero),
    ]
}

/// Lift an `f64` constant into the scalar type.
#[inline]
pub(crate) fn constant<T: RealField>(value: f64) -> T {
    nalgebra::convert(value)
}

/// Index of the first smallest score. NaN scores are never selected over a finite one.
pub(crate) fn argmin<T: RealField + Copy>(scores: impl IntoIterator<Item = T>) -> usize {
    let mut best: Option<(usize, T)> = None;
    for (index, score) in scores.into_iter().enumerate() {
        let replace = match best {
            None => true,
            Some((_, current)) => score < current || (is_nan(&current) && !is_nan(&score)),
        };
        if replace {
            best = Some((index, score));
        }
    }
    best.map_or(0, |(index, _)| index)
}

#[inline]
fn is_nan<T: PartialOrd>(value: &T) -> bool {
    value.partial_cmp(value).is_none()
}

/// Index of the first largest score. NaN scores are never selected over a finite one.
pub(crate) fn argmax<T: RealField + Copy>(scores: impl IntoIterator<Item = T>) -> usize {
    argmin(scores.into_iter().map(|score| -score))
}
