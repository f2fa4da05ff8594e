//! relie: conversions between SO(3) representations and Wigner-D rotations of
//! spherical-harmonic coefficients.
//!
//! - [`lie`]: hat/vee, exponential and logarithm maps, coset enumeration, Jacobian of the
//!   exponential map, quaternion and ZYZ Euler conversions
//! - [`wigner`]: Wigner-D matrices and block rotation of stacked harmonic coefficients

pub mod error;
pub mod lie;
pub mod logger;
pub mod wigner;

pub use error::{RelieError, RelieResult};
pub use lie::{
    DoublePrecision, LogMapConfig, euler_zyz_to_matrix, log_abs_det_jacobian,
    matrix_to_euler_zyz, matrix_to_quaternion, quaternion_to_euler_zyz, quaternion_to_matrix,
    so3_exp, so3_hat, so3_log, so3_vee, so3_xset,
};
pub use logger::{init_cli_logger, init_logger, init_logger_with_level};
pub use wigner::{WignerCache, WignerError, WignerTransform};
