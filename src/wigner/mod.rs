//! Wigner-D matrices acting on real spherical-harmonic coefficients.
//!
//! Harmonic coefficients of degrees 0..=L are stored stacked along the rows of a matrix with
//! (L+1)² rows: degree l occupies rows l²..l²+2l+1, ordered m = -l..=l. Columns are free
//! (channels). Rotating such a block by ZYZ Euler angles multiplies each degree's rows by
//!
//! D_l(α, β, γ) = Z_l(α) · J_l · Z_l(β) · J_l · Z_l(γ)
//!
//! where Z_l is a rotation about z and J_l is a per-degree constant owned by a [`WignerCache`].
//! D_l(α, β, γ) represents the rotation Rz(α) Ry(β) Rz(γ).
//!
//! # Example
//!
//! ```
//! use nalgebra::{DMatrix, Vector3};
//! use relie::wigner::WignerTransform;
//!
//! let transform = WignerTransform::new();
//! let angles = vec![Vector3::new(0.3, 1.1, -0.7)];
//! let data = vec![DMatrix::<f64>::identity(9, 9)];
//! let rotated = transform.block_wigner_matrix_multiply(&angles, &data, 2).unwrap();
//! assert_eq!(rotated[0].shape(), (9, 9));
//! ```

use crate::error::{RelieError, RelieResult};
use crate::lie::constant;
use nalgebra::{DMatrix, RealField, Vector3};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

pub mod cache;

pub use cache::{MAX_CACHED_DEGREE, WignerCache};

/// Wigner-D specific errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WignerError {
    /// A data block does not hold (max_degree + 1)² harmonic rows
    #[error("Batch element {index} has {actual_rows} rows, expected {expected_rows}")]
    InvalidDataShape {
        index: usize,
        expected_rows: usize,
        actual_rows: usize,
    },

    /// Requested degree exceeds what the cache will build
    #[error("Degree {degree} exceeds the maximum cached degree {max}")]
    DegreeTooLarge { degree: usize, max: usize },

    /// A thread panicked while holding the cache lock
    #[error("Wigner constant cache lock is poisoned")]
    PoisonedCache,
}

/// Rotation about z on the degree-`degree` harmonics.
///
/// Row i carries frequency f = l - i: entry (i, i) is cos(f·angle) and entry (i, 2l - i) is
/// sin(f·angle). The middle row has f = 0 and reduces to a single one on the diagonal.
pub fn z_rotation_matrix<T: RealField + Copy>(angle: T, degree: usize) -> DMatrix<T> {
    let size = 2 * degree + 1;
    let mut m = DMatrix::zeros(size, size);
    for i in 0..size {
        let frequency: T = constant(degree as f64 - i as f64);
        let phase = frequency * angle;
        // the anti-diagonal entry coincides with the diagonal on the middle row
        m[(i, size - 1 - i)] = phase.sin();
        m[(i, i)] = phase.cos();
    }
    m
}

/// Wigner-D transform context.
///
/// Holds a shared [`WignerCache`]. Cloning the transform shares the cache, and several
/// transforms can be built over one cache with [`WignerTransform::with_cache`].
#[derive(Debug, Clone, Default)]
pub struct WignerTransform {
    cache: Arc<WignerCache>,
}

impl WignerTransform {
    /// Create a transform with its own empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform over an existing cache.
    pub fn with_cache(cache: Arc<WignerCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<WignerCache> {
        &self.cache
    }

    /// The (2l+1)×(2l+1) Wigner-D matrix of ZYZ Euler angles `(α, β, γ)`.
    pub fn wigner_d_matrix<T: RealField + Copy>(
        &self,
        angles: &Vector3<T>,
        degree: usize,
    ) -> RelieResult<DMatrix<T>> {
        let j = self.cache.get(degree)?;
        let j: DMatrix<T> = j.map(|value| nalgebra::convert::<f64, T>(value));
        Ok(wigner_d_with(&j, angles, degree))
    }

    /// Rotate stacked harmonic coefficients of degrees 0..=`max_degree`.
    ///
    /// `data[b]` must have (max_degree + 1)² rows and any number of columns; it is rotated by
    /// `angles[b]`. The result has the same shapes as `data`.
    ///
    /// # Errors
    /// - [`RelieError::BatchSizeMismatch`] when `angles` and `data` differ in length
    /// - [`RelieError::ShapeMismatch`] when a data block has the wrong number of rows
    /// - [`RelieError::Wigner`] when `max_degree` exceeds [`MAX_CACHED_DEGREE`]
    pub fn block_wigner_matrix_multiply<T>(
        &self,
        angles: &[Vector3<T>],
        data: &[DMatrix<T>],
        max_degree: usize,
    ) -> RelieResult<Vec<DMatrix<T>>>
    where
        T: RealField + Copy + Send + Sync,
    {
        if angles.len() != data.len() {
            return Err(RelieError::BatchSizeMismatch {
                angles: angles.len(),
                data: data.len(),
            });
        }

        let expected_rows = (max_degree + 1) * (max_degree + 1);
        if let Some((index, block)) = data
            .iter()
            .enumerate()
            .find(|(_, block)| block.nrows() != expected_rows)
        {
            return Err(WignerError::InvalidDataShape {
                index,
                expected_rows,
                actual_rows: block.nrows(),
            }
            .into());
        }

        let constants: Vec<DMatrix<T>> = self
            .cache
            .upto(max_degree)?
            .iter()
            .map(|j| j.map(|value| nalgebra::convert::<f64, T>(value)))
            .collect();

        trace!(
            batch = data.len(),
            max_degree,
            "rotating harmonic coefficient blocks"
        );

        Ok(angles
            .par_iter()
            .zip(data.par_iter())
            .map(|(angles, block)| {
                let mut out = DMatrix::zeros(block.nrows(), block.ncols());
                for (degree, j) in constants.iter().enumerate() {
                    let start = degree * degree;
                    let dim = 2 * degree + 1;
                    let d = wigner_d_with(j, angles, degree);
                    out.rows_mut(start, dim)
                        .copy_from(&(d * block.rows(start, dim)));
                }
                out
            })
            .collect())
    }
}

fn wigner_d_with<T: RealField + Copy>(
    j: &DMatrix<T>,
    angles: &Vector3<T>,
    degree: usize,
) -> DMatrix<T> {
    let za = z_rotation_matrix(angles[0], degree);
    let zb = z_rotation_matrix(angles[1], degree);
    let zc = z_rotation_matrix(angles[2], degree);
    &za * j * &zb * j * &zc
}
