//! Configuration for a fusion run.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use polyrigid_core::interpolation::{
    BoundaryMode, Interpolator, LinearInterpolator, NearestNeighborInterpolator,
};
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};

/// Resampling kernel for the warped image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Trilinear (first order).
    #[default]
    Linear,
    /// Nearest neighbour, for label volumes.
    Nearest,
}

impl InterpolationMethod {
    /// Sample `data` at `[Batch, 3]` continuous indices.
    pub fn sample<B: Backend>(
        &self,
        data: &Tensor<B, 3>,
        indices: Tensor<B, 2>,
        boundary: BoundaryMode,
        fill_value: f64,
    ) -> Tensor<B, 1> {
        match self {
            InterpolationMethod::Linear => LinearInterpolator::new()
                .with_boundary(boundary, fill_value)
                .interpolate(data, indices),
            InterpolationMethod::Nearest => NearestNeighborInterpolator::new()
                .with_boundary(boundary, fill_value)
                .interpolate(data, indices),
        }
    }
}

/// Configuration for [`FusionPipeline`](crate::pipeline::FusionPipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// `k` in the weight `1 / (1 + k * d)`.
    pub distance_decay: f64,
    /// Resampling kernel.
    pub interpolation: InterpolationMethod,
    /// Policy for samples outside the floating grid.
    pub boundary: BoundaryMode,
    /// Value of outside samples under [`BoundaryMode::Constant`].
    pub fill_value: f64,
    /// Write the normalized weighting functions.
    pub write_weights: bool,
    /// Write each component's principal logarithm (real part).
    pub write_log_transforms: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            distance_decay: 0.5,
            interpolation: InterpolationMethod::Linear,
            boundary: BoundaryMode::Constant,
            fill_value: 0.0,
            write_weights: true,
            write_log_transforms: false,
        }
    }
}

impl FusionConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distance_decay(mut self, decay: f64) -> Self {
        self.distance_decay = decay;
        self
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationMethod) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    pub fn with_write_weights(mut self, write: bool) -> Self {
        self.write_weights = write;
        self
    }

    pub fn with_write_log_transforms(mut self, write: bool) -> Self {
        self.write_log_transforms = write;
        self
    }

    /// Check that the decay is a positive finite number and the fill value is finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.distance_decay.is_finite() && self.distance_decay > 0.0) {
            return Err(FusionError::invalid_configuration(format!(
                "distance decay must be positive and finite, got {}",
                self.distance_decay
            )));
        }
        if !self.fill_value.is_finite() {
            return Err(FusionError::invalid_configuration(format!(
                "fill value must be finite, got {}",
                self.fill_value
            )));
        }
        Ok(())
    }
}
