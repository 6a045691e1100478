//! End-to-end fusion run: masks and transforms in, warped image out.

use burn::tensor::backend::Backend;
use nalgebra::Matrix4;
use polyrigid_core::image::Image;
use polyrigid_core::matrix;
use polyrigid_io::{read_matrix, read_nifti, write_matrix, write_nifti};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::FusionConfig;
use crate::error::{FusionError, Result};
use crate::fusion::FusedLogField;
use crate::resample::DenseFieldResampler;
use crate::validation::{validate_counts, validate_inputs};
use crate::weighting::{normalize_weights, ComponentWeighting};

/// Subdirectory of the output holding the normalized weights.
pub const WEIGHTS_DIR: &str = "normalized_weighting_function";
/// Subdirectory of the output holding the component logarithms.
pub const LOG_TRANSFORMS_DIR: &str = "log_transforms";
/// File name of the warped image.
pub const WARPED_IMAGE: &str = "warped_image.nii.gz";

/// File name of component `index`'s normalized weighting function.
pub fn weight_file_name(index: usize) -> String {
    format!("Normalized_weighting_function_component{}.nii.gz", index)
}

/// File name of component `index`'s logarithm.
pub fn log_transform_file_name(index: usize) -> String {
    format!("log_transform_component{}.txt", index)
}

/// Input and output paths of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionJob {
    pub floating: PathBuf,
    pub reference: PathBuf,
    /// Component masks, index-aligned with `transforms`.
    pub components: Vec<PathBuf>,
    pub transforms: Vec<PathBuf>,
    pub output: PathBuf,
}

/// In-memory results of a run.
#[derive(Debug, Clone)]
pub struct FusionOutput<B: Backend> {
    /// Normalized weighting functions, in component order.
    pub weights: Vec<Image<B, 3>>,
    /// Real part of each component's principal logarithm.
    pub log_transforms: Vec<Matrix4<f64>>,
    /// Floating image resampled on the reference grid.
    pub warped: Image<B, 3>,
}

/// Files written by [`FusionPipeline::run_job`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobReport {
    pub warped: PathBuf,
    pub weights: Vec<PathBuf>,
    pub log_transforms: Vec<PathBuf>,
}

/// Fuses component transforms and warps the floating image.
#[derive(Debug, Clone, Default)]
pub struct FusionPipeline {
    config: FusionConfig,
}

impl FusionPipeline {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Run the fusion on images already in memory.
    ///
    /// All preconditions are checked before any per-voxel work.
    pub fn run<B: Backend>(
        &self,
        floating: &Image<B, 3>,
        reference: &Image<B, 3>,
        masks: &[Image<B, 3>],
        transforms: &[Matrix4<f64>],
    ) -> Result<FusionOutput<B>> {
        validate_inputs(floating, reference, masks, transforms, &self.config)?;
        info!(
            components = masks.len(),
            shape = ?floating.shape(),
            "Fusing component transforms"
        );

        let weighting = ComponentWeighting::new(self.config.distance_decay);
        let weights = masks
            .iter()
            .enumerate()
            .map(|(index, mask)| {
                debug!(component = index, "Computing weighting function");
                weighting.apply(mask)
            })
            .collect::<Result<Vec<_>>>()?;
        let weights = normalize_weights(&weights)?;

        let field = FusedLogField::new(transforms, &weights)?;
        let log_transforms = field.component_logs().iter().map(matrix::real_part).collect();

        info!(voxels = field.num_voxels(), "Warping floating image");
        let warped = DenseFieldResampler::from_config(&self.config).warp(floating, reference, &field)?;
        debug!("Warp finished");

        Ok(FusionOutput {
            weights,
            log_transforms,
            warped,
        })
    }

    /// Read the job's inputs, run the fusion and write the outputs.
    pub fn run_job<B: Backend>(&self, job: &FusionJob, device: &B::Device) -> Result<JobReport> {
        self.config.validate()?;
        validate_counts(job.components.len(), job.transforms.len())?;

        let floating = load_image::<B>(&job.floating, device)?;
        let reference = load_image::<B>(&job.reference, device)?;
        let masks = job
            .components
            .iter()
            .map(|path| load_image::<B>(path, device))
            .collect::<Result<Vec<_>>>()?;
        let transforms = job
            .transforms
            .iter()
            .map(|path| {
                debug!(path = %path.display(), "Reading transform");
                read_matrix(path).map_err(|e| FusionError::io(path, e))
            })
            .collect::<Result<Vec<_>>>()?;

        let output = self.run(&floating, &reference, &masks, &transforms)?;

        create_dir(&job.output)?;
        let mut report = JobReport::default();

        if self.config.write_weights {
            let dir = job.output.join(WEIGHTS_DIR);
            create_dir(&dir)?;
            for (index, weight) in output.weights.iter().enumerate() {
                let path = dir.join(weight_file_name(index));
                write_nifti(&path, weight).map_err(|e| FusionError::io(&path, e))?;
                report.weights.push(path);
            }
        }

        if self.config.write_log_transforms {
            let dir = job.output.join(LOG_TRANSFORMS_DIR);
            create_dir(&dir)?;
            for (index, log) in output.log_transforms.iter().enumerate() {
                let path = dir.join(log_transform_file_name(index));
                write_matrix(&path, log).map_err(|e| FusionError::io(&path, e))?;
                report.log_transforms.push(path);
            }
        }

        let path = job.output.join(WARPED_IMAGE);
        write_nifti(&path, &output.warped).map_err(|e| FusionError::io(&path, e))?;
        info!(path = %path.display(), "Wrote warped image");
        report.warped = path;

        Ok(report)
    }
}

fn load_image<B: Backend>(path: &Path, device: &B::Device) -> Result<Image<B, 3>> {
    debug!(path = %path.display(), "Reading image");
    read_nifti::<B, _>(path, device).map_err(|e| FusionError::io(path, e))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| FusionError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names() {
        assert_eq!(
            weight_file_name(3),
            "Normalized_weighting_function_component3.nii.gz"
        );
        assert_eq!(log_transform_file_name(0), "log_transform_component0.txt");
    }

    #[test]
    fn test_run_job_checks_counts_before_reading() {
        let job = FusionJob {
            floating: PathBuf::from("/nonexistent/floating.nii.gz"),
            reference: PathBuf::from("/nonexistent/reference.nii.gz"),
            components: vec![PathBuf::from("/nonexistent/a.nii.gz")],
            transforms: vec![],
            output: PathBuf::from("/nonexistent/out"),
        };
        let err = FusionPipeline::default()
            .run_job::<burn_ndarray::NdArray<f32>>(&job, &Default::default())
            .unwrap_err();
        assert!(matches!(err, FusionError::CountMismatch { masks: 1, transforms: 0 }));
    }
}
