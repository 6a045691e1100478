//! Dense coordinate field.
//!
//! For every voxel of a grid, the continuous voxel coordinate to sample in
//! another image. Stored as a tensor of shape `[3, D0, D1, D2]`.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use nalgebra::Vector3;

use crate::error::{FusionError, Result};

/// Per-voxel sampling coordinates for a 3D grid.
///
/// # Type Parameters
/// * `B` - The Burn backend
#[derive(Debug, Clone)]
pub struct CoordinateField<B: Backend> {
    /// Coordinates with shape `[3, D0, D1, D2]`; channel `c` indexes axis `c`.
    coordinates: Tensor<B, 4>,
}

impl<B: Backend> CoordinateField<B> {
    /// Create a field from a `[3, D0, D1, D2]` tensor.
    pub fn new(coordinates: Tensor<B, 4>) -> Self {
        Self { coordinates }
    }

    /// The identity field: every voxel samples itself.
    pub fn identity(shape: [usize; 3], device: &B::Device) -> Self {
        let [d0, d1, d2] = shape;
        let n = d0 * d1 * d2;
        let mut values = vec![0.0f32; 3 * n];
        for index in 0..n {
            values[index] = (index / (d1 * d2)) as f32;
            values[n + index] = ((index / d2) % d1) as f32;
            values[2 * n + index] = (index % d2) as f32;
        }
        Self::new(Tensor::from_data(TensorData::new(values, [3, d0, d1, d2]), device))
    }

    /// Build a field from one point per voxel, in row-major voxel order.
    pub fn from_points(points: &[Vector3<f64>], shape: [usize; 3], device: &B::Device) -> Result<Self> {
        let [d0, d1, d2] = shape;
        let n = d0 * d1 * d2;
        if points.len() != n {
            return Err(FusionError::ShapeMismatch {
                expected: vec![n],
                actual: vec![points.len()],
            });
        }

        let mut values = vec![0.0f32; 3 * n];
        for (index, point) in points.iter().enumerate() {
            for axis in 0..3 {
                values[axis * n + index] = point[axis] as f32;
            }
        }
        Ok(Self::new(Tensor::from_data(
            TensorData::new(values, [3, d0, d1, d2]),
            device,
        )))
    }

    /// Get the coordinate tensor.
    pub fn coordinates(&self) -> Tensor<B, 4> {
        self.coordinates.clone()
    }

    /// Grid shape `[D0, D1, D2]`.
    pub fn shape(&self) -> [usize; 3] {
        let [_, d0, d1, d2] = self.coordinates.dims();
        [d0, d1, d2]
    }

    /// Coordinates along one axis, `[D0, D1, D2]`.
    pub fn axis(&self, axis: usize) -> Tensor<B, 3> {
        self.coordinates.clone().narrow(0, axis, 1).squeeze::<3>(0)
    }

    /// Flatten to a `[D0 * D1 * D2, 3]` point list in row-major voxel order.
    pub fn to_points(&self) -> Tensor<B, 2> {
        let [d0, d1, d2] = self.shape();
        self.coordinates
            .clone()
            .reshape([3, d0 * d1 * d2])
            .swap_dims(0, 1)
    }
}
