//! Per-degree constant matrices of the Wigner-D factorization.
//!
//! The ZYZ factorization D(α, β, γ) = Z(α) J Z(β) J Z(γ) needs one fixed matrix J_l per degree:
//! the real spherical-harmonic representation of the map (x, y, z) ↦ (x, -z, -y), which swaps
//! the y and z axes so that J Z(β) J rotates about y.
//!
//! J_1 = [0 -1 0; -1 0 0; 0 0 1] in the (y, z, x) ordering of degree-1 harmonics. Higher degrees
//! follow from the Ivanic-Ruedenberg recurrence, which builds the degree-l representation from
//! degree 1 and degree l - 1. Every J_l is symmetric, orthogonal and its own inverse.
//!
//! Round-off in the recurrence compounds with degree. Each J_l is projected back onto the
//! symmetric orthogonal matrices before it seeds the next degree, and degrees are capped at
//! [`MAX_CACHED_DEGREE`], where Wigner-D matrices stay orthogonal to about 1e-10.
//!
//! Matrices are computed on first use and kept for the lifetime of the cache.

use crate::wigner::WignerError;
use nalgebra::DMatrix;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::debug;

/// Largest degree a cache will build.
pub const MAX_CACHED_DEGREE: usize = 64;

/// Thread-safe, lazily populated store of the J_l matrices.
///
/// Reads take a shared lock. The first caller needing a new degree takes the write lock,
/// re-checks, and builds every missing degree up to it; concurrent callers wait and then
/// read the shared result, so each degree is computed exactly once per cache.
#[derive(Debug, Default)]
pub struct WignerCache {
    matrices: RwLock<Vec<Arc<DMatrix<f64>>>>,
}

impl WignerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with all degrees up to `max_degree` already built.
    pub fn with_max_degree(max_degree: usize) -> Result<Self, WignerError> {
        let cache = Self::new();
        cache.upto(max_degree)?;
        Ok(cache)
    }

    /// Number of degrees built so far.
    ///
    /// Degrees are pushed whole, so the count stays meaningful after a poisoned lock.
    pub fn cached_degrees(&self) -> usize {
        match self.matrices.read() {
            Ok(matrices) => matrices.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// J_l for a single degree.
    pub fn get(&self, degree: usize) -> Result<Arc<DMatrix<f64>>, WignerError> {
        // upto returns exactly degree + 1 matrices
        Ok(Arc::clone(&self.upto(degree)?[degree]))
    }

    /// J_0 ..= J_max_degree.
    pub fn upto(&self, max_degree: usize) -> Result<Vec<Arc<DMatrix<f64>>>, WignerError> {
        if max_degree > MAX_CACHED_DEGREE {
            return Err(WignerError::DegreeTooLarge {
                degree: max_degree,
                max: MAX_CACHED_DEGREE,
            });
        }

        {
            let matrices = self
                .matrices
                .read()
                .map_err(|_| WignerError::PoisonedCache)?;
            if matrices.len() > max_degree {
                return Ok(matrices[..=max_degree].to_vec());
            }
        }

        let mut matrices = self
            .matrices
            .write()
            .map_err(|_| WignerError::PoisonedCache)?;
        if matrices.len() <= max_degree {
            let start = Instant::now();
            let first_new = matrices.len();
            populate(&mut matrices, max_degree);
            debug!(
                from = first_new,
                to = max_degree,
                elapsed_us = start.elapsed().as_micros() as u64,
                "built Wigner constant matrices"
            );
        }
        Ok(matrices[..=max_degree].to_vec())
    }
}

/// Extend `matrices` so that it holds J_0 ..= J_max_degree.
fn populate(matrices: &mut Vec<Arc<DMatrix<f64>>>, max_degree: usize) {
    while matrices.len() <= max_degree {
        let degree = matrices.len();
        let next = match degree {
            0 => DMatrix::from_element(1, 1, 1.0),
            1 => degree_one(),
            _ => polish(band(&matrices[1], &matrices[degree - 1], degree as i64)),
        };
        matrices.push(Arc::new(next));
    }
}

fn degree_one() -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 3, &[0.0, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0])
}

/// Symmetrize `j` and take one Newton-Schulz step towards the nearest orthogonal matrix.
///
/// For a symmetric J with J² = I + E the step X = J (3I - J²) / 2 leaves an O(E²) defect.
fn polish(j: DMatrix<f64>) -> DMatrix<f64> {
    let size = j.nrows();
    let symmetric = (&j + j.transpose()) * 0.5;
    let square = &symmetric * &symmetric;
    let step = DMatrix::<f64>::identity(size, size) * 3.0 - square;
    let polished = &symmetric * step * 0.5;
    (&polished + polished.transpose()) * 0.5
}

/// Entry (i, j) of a (2l+1)×(2l+1) matrix with indices centered on 0.
#[inline]
fn centered(matrix: &DMatrix<f64>, i: i64, j: i64) -> f64 {
    let offset = (matrix.nrows() / 2) as i64;
    matrix[((i + offset) as usize, (j + offset) as usize)]
}

/// Degree-l representation from the degree-1 matrix and the degree l-1 matrix.
///
/// The recurrence is bilinear in its two inputs, so feeding it J_1 and J_{l-1} (which carry the
/// (-1)^l parity of the improper axis swap) yields J_l directly.
fn band(r1: &DMatrix<f64>, previous: &DMatrix<f64>, l: i64) -> DMatrix<f64> {
    let size = (2 * l + 1) as usize;
    let mut result = DMatrix::zeros(size, size);

    let p = |i: i64, a: i64, b: i64| -> f64 {
        if b == l {
            centered(r1, i, 1) * centered(previous, a, l - 1)
                - centered(r1, i, -1) * centered(previous, a, -l + 1)
        } else if b == -l {
            centered(r1, i, 1) * centered(previous, a, -l + 1)
                + centered(r1, i, -1) * centered(previous, a, l - 1)
        } else {
            centered(r1, i, 0) * centered(previous, a, b)
        }
    };

    for m in -l..=l {
        for n in -l..=l {
            let (u, v, w) = uvw_coefficients(l, m, n);
            let mut value = 0.0;

            if u.abs() > f64::EPSILON {
                value += u * p(0, m, n);
            }
            if v.abs() > f64::EPSILON {
                let v_term = if m == 0 {
                    p(1, 1, n) + p(-1, -1, n)
                } else if m > 0 {
                    let d = kronecker(m, 1);
                    p(1, m - 1, n) * (1.0 + d).sqrt() - p(-1, -m + 1, n) * (1.0 - d)
                } else {
                    let d = kronecker(m, -1);
                    p(1, m + 1, n) * (1.0 - d) + p(-1, -m - 1, n) * (1.0 + d).sqrt()
                };
                value += v * v_term;
            }
            if w.abs() > f64::EPSILON {
                // w vanishes for m = 0
                let w_term = if m > 0 {
                    p(1, m + 1, n) + p(-1, -m - 1, n)
                } else {
                    p(1, m - 1, n) - p(-1, -m + 1, n)
                };
                value += w * w_term;
            }

            result[((m + l) as usize, (n + l) as usize)] = value;
        }
    }
    result
}

fn uvw_coefficients(l: i64, m: i64, n: i64) -> (f64, f64, f64) {
    let d = kronecker(m, 0);
    let (lf, mf, nf) = (l as f64, m as f64, n as f64);
    let m_abs = mf.abs();
    let denominator = if n.abs() == l {
        2.0 * lf * (2.0 * lf - 1.0)
    } else {
        (lf + nf) * (lf - nf)
    };

    let u = ((lf + mf) * (lf - mf) / denominator).sqrt();
    let v = 0.5
        * ((1.0 + d) * (lf + m_abs - 1.0) * (lf + m_abs) / denominator).sqrt()
        * (1.0 - 2.0 * d);
    let w = -0.5
        * ((lf - m_abs - 1.0) * (lf - m_abs) / denominator)
            .max(0.0)
            .sqrt()
        * (1.0 - d);
    (u, v, w)
}

#[inline]
fn kronecker(a: i64, b: i64) -> f64 {
    if a == b { 1.0 } else { 0.0 }
}
