use anyhow::Result;
use burn_ndarray::NdArray;
use clap::{Parser, ValueEnum};
use polyrigid_fusion::{BoundaryMode, FusionConfig, FusionJob, FusionPipeline, InterpolationMethod};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Backend = NdArray<f32>;

#[derive(Parser)]
#[command(name = "polyrigid")]
#[command(about = "Fuse per-component transforms and warp a floating image into reference space")]
struct Cli {
    /// Floating input image
    #[arg(short = 'i', long)]
    floating: PathBuf,

    /// Reference image
    #[arg(short, long = "reference", visible_alias = "ref")]
    reference: PathBuf,

    /// Binary component mask in reference space (repeat, one per transform)
    #[arg(short, long = "component", visible_alias = "refweight", required = true)]
    component: Vec<PathBuf>,

    /// 4x4 transform matrix text file (repeat, one per component)
    #[arg(short, long = "transform", required = true)]
    transform: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Resampling kernel
    #[arg(long, value_enum, default_value_t = Interpolation::Linear)]
    interpolation: Interpolation,

    /// Handling of samples outside the floating image
    #[arg(long, value_enum, default_value_t = Boundary::Constant)]
    boundary: Boundary,

    /// Value of samples outside the floating image
    #[arg(long, default_value_t = 0.0)]
    fill_value: f64,

    /// Distance decay k in the weight 1 / (1 + k * d)
    #[arg(long, default_value_t = 0.5)]
    decay: f64,

    /// Do not write the normalized weighting functions
    #[arg(long)]
    no_weights: bool,

    /// Write each component's matrix logarithm
    #[arg(long)]
    write_log_transforms: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Interpolation {
    Linear,
    Nearest,
}

#[derive(Clone, Copy, ValueEnum)]
enum Boundary {
    Constant,
    Clamp,
}

impl From<Interpolation> for InterpolationMethod {
    fn from(value: Interpolation) -> Self {
        match value {
            Interpolation::Linear => InterpolationMethod::Linear,
            Interpolation::Nearest => InterpolationMethod::Nearest,
        }
    }
}

impl From<Boundary> for BoundaryMode {
    fn from(value: Boundary) -> Self {
        match value {
            Boundary::Constant => BoundaryMode::Constant,
            Boundary::Clamp => BoundaryMode::Clamp,
        }
    }
}

impl Cli {
    fn config(&self) -> FusionConfig {
        FusionConfig::new()
            .with_distance_decay(self.decay)
            .with_interpolation(self.interpolation.into())
            .with_boundary(self.boundary.into())
            .with_fill_value(self.fill_value)
            .with_write_weights(!self.no_weights)
            .with_write_log_transforms(self.write_log_transforms)
    }

    fn job(self) -> FusionJob {
        FusionJob {
            floating: self.floating,
            reference: self.reference,
            components: self.component,
            transforms: self.transform,
            output: self.output,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let pipeline = FusionPipeline::new(cli.config());
    let job = cli.job();

    let device = Default::default();
    let report = pipeline.run_job::<Backend>(&job, &device)?;

    info!(
        warped = %report.warped.display(),
        weights = report.weights.len(),
        log_transforms = report.log_transforms.len(),
        "Done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_components() {
        let cli = Cli::try_parse_from([
            "polyrigid", "-i", "f.nii.gz", "-r", "r.nii.gz", "-c", "a.nii.gz", "-c", "b.nii.gz",
            "-t", "a.txt", "-t", "b.txt", "-o", "out", "--interpolation", "nearest", "--no-weights",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.interpolation, InterpolationMethod::Nearest);
        assert!(!config.write_weights);
        assert_eq!(config.distance_decay, 0.5);

        let job = cli.job();
        assert_eq!(job.components.len(), 2);
        assert_eq!(job.transforms[1], PathBuf::from("b.txt"));
        assert_eq!(job.output, PathBuf::from("out"));
    }

    #[test]
    fn test_component_alias() {
        let cli = Cli::try_parse_from([
            "polyrigid", "--floating", "f", "--ref", "r", "--refweight", "m", "--transform", "t",
            "--output", "o", "--boundary", "clamp",
        ])
        .unwrap();
        assert_eq!(cli.config().boundary, BoundaryMode::Clamp);
    }

    #[test]
    fn test_transform_required() {
        let result = Cli::try_parse_from(["polyrigid", "-i", "f", "-r", "r", "-c", "m", "-o", "o"]);
        assert!(result.is_err());
    }
}
