//! Dense-field warping of the floating image into reference space.

use burn::tensor::backend::Backend;
use nalgebra::Vector3;
use polyrigid_core::image::Image;
use polyrigid_core::interpolation::BoundaryMode;
use rayon::prelude::*;
use tracing::debug;

use crate::config::{FusionConfig, InterpolationMethod};
use crate::coordinate_field::CoordinateField;
use crate::error::{FusionError, Result};
use crate::fusion::FusedLogField;
use crate::mapper::VoxelMapper;
use crate::validation::validate_image_shapes;

/// Builds the coordinate field from a fused log field and resamples through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseFieldResampler {
    interpolation: InterpolationMethod,
    boundary: BoundaryMode,
    fill_value: f64,
}

impl DenseFieldResampler {
    pub fn new(interpolation: InterpolationMethod, boundary: BoundaryMode, fill_value: f64) -> Self {
        Self {
            interpolation,
            boundary,
            fill_value,
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(config.interpolation, config.boundary, config.fill_value)
    }

    /// Map every voxel of the field's grid into the target grid of `mapper`.
    ///
    /// Each voxel exponentiates its own fused log and maps its own index, so
    /// voxels are processed in parallel.
    pub fn coordinate_field<B: Backend>(
        &self,
        field: &FusedLogField,
        mapper: &VoxelMapper,
        device: &B::Device,
    ) -> Result<CoordinateField<B>> {
        let shape = field.shape();
        if mapper.source().shape() != shape {
            return Err(FusionError::shape_mismatch(mapper.source().shape(), shape));
        }
        let [_, d1, d2] = shape;

        let points: Vec<Vector3<f64>> = (0..field.num_voxels())
            .into_par_iter()
            .map(|index| {
                let voxel = Vector3::new(
                    (index / (d1 * d2)) as f64,
                    ((index / d2) % d1) as f64,
                    (index % d2) as f64,
                );
                mapper.map_point(&voxel, &field.transform_at_index(index))
            })
            .collect();

        if let Some(index) = points.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(FusionError::numerical(format!(
                "non-finite coordinate at voxel {}",
                index
            )));
        }

        CoordinateField::from_points(&points, shape, device)
    }

    /// Sample `floating` at every coordinate of `coordinates`.
    ///
    /// The result has the reference grid and header. The coordinate grid must
    /// match the reference grid.
    pub fn resample<B: Backend>(
        &self,
        floating: &Image<B, 3>,
        reference: &Image<B, 3>,
        coordinates: &CoordinateField<B>,
    ) -> Result<Image<B, 3>> {
        let shape = reference.shape();
        if coordinates.shape() != shape {
            return Err(FusionError::shape_mismatch(shape, coordinates.shape()));
        }

        let values = self.interpolation.sample(
            floating.data(),
            coordinates.to_points(),
            self.boundary,
            self.fill_value,
        );
        Ok(reference.with_data(values.reshape(shape)))
    }

    /// Warp `floating` into the reference grid through `field`.
    pub fn warp<B: Backend>(
        &self,
        floating: &Image<B, 3>,
        reference: &Image<B, 3>,
        field: &FusedLogField,
    ) -> Result<Image<B, 3>> {
        validate_image_shapes(floating, reference)?;

        let mapper = VoxelMapper::from_images(floating, reference);
        debug!(
            floating_flip = mapper.source().flips(),
            reference_flip = mapper.target().flips(),
            "Building coordinate field"
        );
        let coordinates = self.coordinate_field::<B>(field, &mapper, &floating.data().device())?;
        self.resample(floating, reference, &coordinates)
    }
}

impl Default for DenseFieldResampler {
    fn default() -> Self {
        Self::from_config(&FusionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{Tensor, TensorData};
    use burn_ndarray::NdArray;
    use nalgebra::Matrix4;

    type TestBackend = NdArray<f32>;

    fn image(values: Vec<f32>, shape: [usize; 3]) -> Image<TestBackend, 3> {
        let device = Default::default();
        Image::from_metadata(
            Tensor::from_data(TensorData::new(values, shape), &device),
            Default::default(),
        )
    }

    #[test]
    fn test_resample_identity_field() {
        let device = Default::default();
        let values: Vec<f32> = (0..24).map(|v| v as f32).collect();
        let floating = image(values.clone(), [2, 3, 4]);

        let coordinates = CoordinateField::identity([2, 3, 4], &device);
        let warped = DenseFieldResampler::default()
            .resample(&floating, &floating, &coordinates)
            .unwrap();
        assert_eq!(warped.to_vec().unwrap(), values);
    }

    #[test]
    fn test_resample_rejects_wrong_grid() {
        let device = Default::default();
        let floating = image(vec![0.0; 8], [2, 2, 2]);
        let coordinates = CoordinateField::identity([2, 2, 1], &device);
        let result = DenseFieldResampler::default().resample(&floating, &floating, &coordinates);
        assert!(matches!(result, Err(FusionError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_coordinate_field_of_identity_transform() {
        let device = Default::default();
        let mask = image(vec![1.0; 12], [3, 2, 2]);
        let field = FusedLogField::new(&[Matrix4::identity()], &[mask.clone()]).unwrap();
        let mapper = VoxelMapper::from_images(&mask, &mask);

        let coordinates = DenseFieldResampler::default()
            .coordinate_field::<TestBackend>(&field, &mapper, &device)
            .unwrap();
        let expected = CoordinateField::<TestBackend>::identity([3, 2, 2], &device);

        let got = coordinates.coordinates().into_data().to_vec::<f32>().unwrap();
        let want = expected.coordinates().into_data().to_vec::<f32>().unwrap();
        for (g, w) in got.iter().zip(&want) {
            assert!((g - w).abs() < 1e-5, "Expected {}, got {}", w, g);
        }
    }
}
