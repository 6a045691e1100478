//! Linear interpolation implementation.
//!
//! This module provides trilinear interpolation of 3D volumes.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use serde::{Deserialize, Serialize};

use super::boundary::BoundaryMode;
use super::trait_::Interpolator;

/// Linear Interpolator.
///
/// Performs trilinear interpolation (first-order spline). Neighbour indices
/// are clamped to the grid; samples outside the grid are then resolved by
/// the [`BoundaryMode`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearInterpolator {
    boundary: BoundaryMode,
    fill_value: f64,
}

impl LinearInterpolator {
    /// Create a new linear interpolator with a zero constant boundary.
    pub fn new() -> Self {
        Self {
            boundary: BoundaryMode::Constant,
            fill_value: 0.0,
        }
    }

    /// Set the boundary policy and the fill value used by [`BoundaryMode::Constant`].
    pub fn with_boundary(mut self, boundary: BoundaryMode, fill_value: f64) -> Self {
        self.boundary = boundary;
        self.fill_value = fill_value;
        self
    }
}

impl Default for LinearInterpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [d0, d1, d2] = data.dims();
        let batch_size = indices.dims()[0];
        let device = indices.device();

        // indices: [Batch, 3] -> (p0, p1, p2) along axes 0, 1, 2
        let p0 = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let p1 = indices.clone().narrow(1, 1, 1).squeeze::<1>(1);
        let p2 = indices.narrow(1, 2, 1).squeeze::<1>(1);

        let f0 = p0.clone().floor();
        let f1 = p1.clone().floor();
        let f2 = p2.clone().floor();

        let w0 = p0.clone() - f0.clone();
        let w1 = p1.clone() - f1.clone();
        let w2 = p2.clone() - f2.clone();

        let lo0 = f0.clone().clamp(0.0, (d0 - 1) as f64).int();
        let lo1 = f1.clone().clamp(0.0, (d1 - 1) as f64).int();
        let lo2 = f2.clone().clamp(0.0, (d2 - 1) as f64).int();

        let hi0 = (f0 + 1.0).clamp(0.0, (d0 - 1) as f64).int();
        let hi1 = (f1 + 1.0).clamp(0.0, (d1 - 1) as f64).int();
        let hi2 = (f2 + 1.0).clamp(0.0, (d2 - 1) as f64).int();

        // Strides for row-major [D0, D1, D2]
        let stride0 = (d1 * d2) as i32;
        let stride1 = d2 as i32;

        let flat_data = data.clone().reshape([d0 * d1 * d2]);

        let v000 = Self::gather(&flat_data, &lo0, &lo1, &lo2, stride0, stride1);
        let v001 = Self::gather(&flat_data, &lo0, &lo1, &hi2, stride0, stride1);
        let v010 = Self::gather(&flat_data, &lo0, &hi1, &lo2, stride0, stride1);
        let v011 = Self::gather(&flat_data, &lo0, &hi1, &hi2, stride0, stride1);
        let v100 = Self::gather(&flat_data, &hi0, &lo1, &lo2, stride0, stride1);
        let v101 = Self::gather(&flat_data, &hi0, &lo1, &hi2, stride0, stride1);
        let v110 = Self::gather(&flat_data, &hi0, &hi1, &lo2, stride0, stride1);
        let v111 = Self::gather(&flat_data, &hi0, &hi1, &hi2, stride0, stride1);

        let one = Tensor::<B, 1>::ones([batch_size], &device);
        let one_minus_w0 = one.clone() - w0.clone();
        let one_minus_w1 = one.clone() - w1.clone();
        let one_minus_w2 = one - w2.clone();

        // Along axis 2
        let c00 = v000 * one_minus_w2.clone() + v001 * w2.clone();
        let c01 = v010 * one_minus_w2.clone() + v011 * w2.clone();
        let c10 = v100 * one_minus_w2.clone() + v101 * w2.clone();
        let c11 = v110 * one_minus_w2 + v111 * w2;

        // Along axis 1
        let c0 = c00 * one_minus_w1.clone() + c01 * w1.clone();
        let c1 = c10 * one_minus_w1 + c11 * w1;

        // Along axis 0
        let values = c0 * one_minus_w0 + c1 * w0;

        self.boundary
            .apply(values, [&p0, &p1, &p2], [d0, d1, d2], self.fill_value)
    }
}

impl LinearInterpolator {
    #[inline]
    fn gather<B: Backend>(
        flat_data: &Tensor<B, 1>,
        i0: &Tensor<B, 1, Int>,
        i1: &Tensor<B, 1, Int>,
        i2: &Tensor<B, 1, Int>,
        stride0: i32,
        stride1: i32,
    ) -> Tensor<B, 1> {
        let idx = i0.clone() * stride0 + i1.clone() * stride1 + i2.clone();
        flat_data.clone().gather(0, idx)
    }
}
