//! Policy for samples that fall outside the volume.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Slack, in voxels, before a coordinate counts as outside the grid.
const BOUNDS_TOLERANCE: f64 = 1e-6;

/// How to sample outside `[0, n - 1]` along any axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Outside samples take a constant fill value.
    #[default]
    Constant,
    /// Outside samples take the value of the nearest edge voxel.
    Clamp,
}

impl BoundaryMode {
    /// Replace samples whose coordinates leave the grid by `fill_value`.
    ///
    /// `coords` holds one `[Batch]` tensor per axis and `dims` the grid shape.
    pub(crate) fn apply<B: Backend>(
        &self,
        values: Tensor<B, 1>,
        coords: [&Tensor<B, 1>; 3],
        dims: [usize; 3],
        fill_value: f64,
    ) -> Tensor<B, 1> {
        match self {
            BoundaryMode::Clamp => values,
            BoundaryMode::Constant => {
                let inside = inside_axis(coords[0], dims[0])
                    * inside_axis(coords[1], dims[1])
                    * inside_axis(coords[2], dims[2]);
                let outside = inside.clone().neg().add_scalar(1.0);
                values * inside + outside.mul_scalar(fill_value)
            }
        }
    }
}

/// `1.0` where `0 <= c <= n - 1`, else `0.0`.
fn inside_axis<B: Backend>(c: &Tensor<B, 1>, n: usize) -> Tensor<B, 1> {
    let upper = (n as f64 - 1.0) + BOUNDS_TOLERANCE;
    let above = c.clone().greater_equal_elem(-BOUNDS_TOLERANCE).float();
    let below = c.clone().lower_equal_elem(upper).float();
    above * below
}
