//! Log-Euclidean fusion of component transforms.
//!
//! Each component transform `T_n` contributes its principal logarithm
//! `L_n`, constant over the grid. The fused log at voxel `v` is
//!
//! ```text
//! F(v) = -Σ_n w_n(v) L_n
//! ```
//!
//! with `w_n` the normalized weights. The negation points the fused field in
//! the reference-to-floating direction, so a single component yields
//! `exp(F) = T⁻¹` everywhere.
//!
//! The field is never stored as a `(d0, d1, d2, 4, 4)` array: voxels are
//! evaluated on demand from the `N` logarithms and `N` weight volumes.

use burn::tensor::backend::Backend;
use nalgebra::Matrix4;
use polyrigid_core::image::Image;
use polyrigid_core::matrix::{self, Matrix4c};
use tracing::debug;

use crate::error::{FusionError, Result};
use crate::validation::{validate_counts, validate_image_shapes};

/// Per-voxel fused logarithm of a set of component transforms.
#[derive(Debug, Clone)]
pub struct FusedLogField {
    shape: [usize; 3],
    logs: Vec<Matrix4c>,
    /// One row-major weight volume per component.
    weights: Vec<Vec<f32>>,
}

impl FusedLogField {
    /// Build the field from index-aligned transforms and normalized weights.
    ///
    /// Fails with [`FusionError::SingularTransform`] when a transform has no
    /// principal logarithm.
    pub fn new<B: Backend>(transforms: &[Matrix4<f64>], weights: &[Image<B, 3>]) -> Result<Self> {
        validate_counts(weights.len(), transforms.len())?;
        let shape = weights[0].shape();
        for weight in &weights[1..] {
            validate_image_shapes(&weights[0], weight)?;
        }

        let logs = transforms
            .iter()
            .enumerate()
            .map(|(index, transform)| {
                let log = matrix::logm_real(transform)
                    .map_err(|e| FusionError::singular_transform(index, e.to_string()))?;
                debug!(
                    component = index,
                    max_imaginary = matrix::max_imaginary(&log),
                    "Computed principal logarithm"
                );
                Ok(log)
            })
            .collect::<Result<Vec<_>>>()?;

        let weights = weights
            .iter()
            .map(|w| w.to_vec().map_err(FusionError::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { shape, logs, weights })
    }

    /// Grid shape of the field.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn num_voxels(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn num_components(&self) -> usize {
        self.logs.len()
    }

    /// Principal logarithms of the component transforms, in component order.
    pub fn component_logs(&self) -> &[Matrix4c] {
        &self.logs
    }

    /// Fused logarithm at voxel `(i, j, k)`.
    pub fn log_at(&self, i: usize, j: usize, k: usize) -> Matrix4c {
        self.log_at_index(self.flat_index(i, j, k))
    }

    /// Fused logarithm at a row-major voxel index.
    pub fn log_at_index(&self, index: usize) -> Matrix4c {
        self.logs
            .iter()
            .zip(&self.weights)
            .fold(Matrix4c::zeros(), |acc, (log, weight)| {
                acc - log * matrix::Complex64::new(weight[index] as f64, 0.0)
            })
    }

    /// Real transform applied at voxel `(i, j, k)`: the real part of `exp(F)`.
    pub fn transform_at(&self, i: usize, j: usize, k: usize) -> Matrix4<f64> {
        self.transform_at_index(self.flat_index(i, j, k))
    }

    /// Real transform at a row-major voxel index.
    pub fn transform_at_index(&self, index: usize) -> Matrix4<f64> {
        matrix::real_part(&matrix::expm(&self.log_at_index(index)))
    }

    /// Evaluate the fused logarithm at every voxel, in row-major order.
    pub fn materialize(&self) -> Vec<Matrix4c> {
        (0..self.num_voxels()).map(|index| self.log_at_index(index)).collect()
    }

    fn flat_index(&self, i: usize, j: usize, k: usize) -> usize {
        let [_, d1, d2] = self.shape;
        (i * d1 + j) * d2 + k
    }
}
