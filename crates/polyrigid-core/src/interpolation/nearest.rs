//! Nearest-neighbour interpolation, for label volumes.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::boundary::BoundaryMode;
use super::trait_::Interpolator;

/// Nearest-neighbour interpolator (zeroth-order spline).
///
/// Half-way indices round up: `0.5` picks voxel 1, `1.5` picks voxel 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestNeighborInterpolator {
    boundary: BoundaryMode,
    fill_value: f64,
}

impl NearestNeighborInterpolator {
    pub fn new() -> Self {
        Self {
            boundary: BoundaryMode::Constant,
            fill_value: 0.0,
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode, fill_value: f64) -> Self {
        self.boundary = boundary;
        self.fill_value = fill_value;
        self
    }
}

impl Default for NearestNeighborInterpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Interpolator<B> for NearestNeighborInterpolator {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [d0, d1, d2] = data.dims();
        let batch = indices.dims()[0];

        let p0 = indices.clone().slice([0..batch, 0..1]).squeeze::<1>(1);
        let p1 = indices.clone().slice([0..batch, 1..2]).squeeze::<1>(1);
        let p2 = indices.slice([0..batch, 2..3]).squeeze::<1>(1);

        let i0 = p0.clone().add_scalar(0.5).floor().clamp(0.0, (d0 - 1) as f64).int();
        let i1 = p1.clone().add_scalar(0.5).floor().clamp(0.0, (d1 - 1) as f64).int();
        let i2 = p2.clone().add_scalar(0.5).floor().clamp(0.0, (d2 - 1) as f64).int();

        let stride0 = (d1 * d2) as i32;
        let stride1 = d2 as i32;

        let idx = i0 * stride0 + i1 * stride1 + i2;
        let flat_data = data.clone().reshape([d0 * d1 * d2]);
        let values = flat_data.gather(0, idx);

        self.boundary
            .apply(values, [&p0, &p1, &p2], [d0, d1, d2], self.fill_value)
    }
}
