//! SO(3) Conversion Binary
//!
//! Takes an axis-angle vector and prints every representation of the rotation it encodes:
//! the rotation matrix, the recovered logarithm and its branch, the quaternion, the ZYZ Euler
//! angles and, optionally, the Wigner-D matrix of one degree.
//!
//! # Usage
//! ```bash
//! cargo run --release --bin so3_convert -- 0.1 0.2 0.3
//!
//! # Near a half turn, with the degree-2 Wigner-D matrix:
//! cargo run --release --bin so3_convert -- 3.1415 0 0 --degree 2
//! ```

use clap::Parser;
use nalgebra::Vector3;
use relie::lie::{
    LogMapConfig, is_rotation_matrix, matrix_to_euler_zyz, matrix_to_quaternion, so3_exp,
    so3_log_with_branch, so3_vee,
};
use relie::wigner::WignerTransform;
use relie::init_cli_logger;
use std::error::Error;
use tracing::{info, warn};

/// Convert an axis-angle vector between SO(3) representations
#[derive(Parser)]
#[command(name = "so3_convert")]
#[command(about = "Convert an axis-angle vector between SO(3) representations")]
struct Args {
    /// Axis-angle x component
    #[arg(allow_hyphen_values = true)]
    x: f64,

    /// Axis-angle y component
    #[arg(allow_hyphen_values = true)]
    y: f64,

    /// Axis-angle z component
    #[arg(allow_hyphen_values = true)]
    z: f64,

    /// Also print the Wigner-D matrix of this degree
    #[arg(short, long)]
    degree: Option<usize>,

    /// Tolerance on cos θ + 1 below which the half-turn logarithm is used
    #[arg(long, default_value = "1e-5")]
    pi_cos_tolerance: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    init_cli_logger(args.verbose);

    let v = Vector3::new(args.x, args.y, args.z);
    let config = LogMapConfig::new().with_pi_cos_tolerance(args.pi_cos_tolerance);

    info!("Input vector: [{:.6}, {:.6}, {:.6}]", v.x, v.y, v.z);
    info!("Rotation angle: {:.6} rad", v.norm());

    let r = so3_exp(&v);
    if !is_rotation_matrix(&r, 1e-9) {
        warn!("exp produced a matrix that is not a rotation");
    }
    info!("Rotation matrix:{}", r);

    let (log, branch) = so3_log_with_branch(&r, &config);
    let recovered = so3_vee(&log);
    info!(
        "Logarithm ({:?} branch): [{:.6}, {:.6}, {:.6}]",
        branch, recovered.x, recovered.y, recovered.z
    );

    let q = matrix_to_quaternion(&r);
    info!(
        "Passive quaternion (x, y, z, w): [{:.6}, {:.6}, {:.6}, {:.6}]",
        q.x, q.y, q.z, q.w
    );

    let euler = matrix_to_euler_zyz(&r);
    info!(
        "Euler ZYZ of the transpose (alpha, beta, gamma): [{:.6}, {:.6}, {:.6}]",
        euler.x, euler.y, euler.z
    );

    if let Some(degree) = args.degree {
        let transform = WignerTransform::new();
        let d = transform.wigner_d_matrix(&euler, degree)?;
        info!("Wigner-D matrix of the transpose (degree {}):{}", degree, d);
    }

    Ok(())
}
