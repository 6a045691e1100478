//! Log-Euclidean polyrigid fusion.
//!
//! Component masks become normalized distance weights; the weights blend the
//! principal logarithms of the component transforms into one transform per
//! voxel; the per-voxel transforms carry reference voxels into the floating
//! grid, where the floating image is resampled.

pub mod config;
pub mod coordinate_field;
pub mod error;
pub mod fusion;
pub mod mapper;
pub mod pipeline;
pub mod resample;
pub mod validation;
pub mod weighting;

pub use config::{FusionConfig, InterpolationMethod};
pub use coordinate_field::CoordinateField;
pub use error::{FusionError, Result};
pub use fusion::FusedLogField;
pub use mapper::{GridHeader, VoxelMapper};
pub use pipeline::{FusionJob, FusionOutput, FusionPipeline, JobReport};
pub use resample::DenseFieldResampler;
pub use validation::validate_inputs;
pub use weighting::{normalize_weights, ComponentWeighting};

pub use polyrigid_core::interpolation::BoundaryMode;
