//! Eager precondition checks, run before any per-voxel work.

use burn::tensor::backend::Backend;
use nalgebra::Matrix4;
use polyrigid_core::image::Image;

use crate::config::FusionConfig;
use crate::error::{FusionError, Result};

/// Smallest `|det(T)|` accepted for an input transform.
const MIN_DETERMINANT: f64 = 1e-12;

/// Validate that two images have the same grid shape.
///
/// `expected` is the grid everything else is checked against.
pub fn validate_image_shapes<B: Backend>(expected: &Image<B, 3>, actual: &Image<B, 3>) -> Result<()> {
    let expected_shape = expected.shape();
    let actual_shape = actual.shape();

    if expected_shape != actual_shape {
        return Err(FusionError::shape_mismatch(expected_shape, actual_shape));
    }

    Ok(())
}

/// Validate that a transform is finite and invertible.
pub fn validate_transform(index: usize, transform: &Matrix4<f64>) -> Result<()> {
    if transform.iter().any(|v| !v.is_finite()) {
        return Err(FusionError::singular_transform(index, "matrix has non-finite entries"));
    }

    let det = transform.determinant();
    if det.abs() < MIN_DETERMINANT {
        return Err(FusionError::singular_transform(
            index,
            format!("determinant {:.3e} is zero", det),
        ));
    }

    Ok(())
}

/// Validate everything a fusion run needs before it starts.
///
/// Checks, in order: the configuration, that masks and transforms pair up
/// and are not empty, that the reference and every mask share the floating
/// grid, and that every transform is invertible.
pub fn validate_inputs<B: Backend>(
    floating: &Image<B, 3>,
    reference: &Image<B, 3>,
    masks: &[Image<B, 3>],
    transforms: &[Matrix4<f64>],
    config: &FusionConfig,
) -> Result<()> {
    config.validate()?;
    validate_counts(masks.len(), transforms.len())?;

    validate_image_shapes(floating, reference)?;
    for mask in masks {
        validate_image_shapes(floating, mask)?;
    }

    for (index, transform) in transforms.iter().enumerate() {
        validate_transform(index, transform)?;
    }

    Ok(())
}

/// Validate that there is at least one component and counts agree.
pub fn validate_counts(masks: usize, transforms: usize) -> Result<()> {
    if masks != transforms {
        return Err(FusionError::CountMismatch { masks, transforms });
    }
    if masks == 0 {
        return Err(FusionError::NoComponents);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn image(shape: [usize; 3]) -> Image<TestBackend, 3> {
        let device = Default::default();
        Image::from_metadata(Tensor::zeros(shape, &device), Default::default())
    }

    #[test]
    fn test_validate_image_shapes() {
        let a = image([4, 4, 4]);
        let b = image([4, 4, 4]);
        let c = image([4, 4, 3]);

        assert!(validate_image_shapes(&a, &b).is_ok());
        assert!(matches!(
            validate_image_shapes(&a, &c),
            Err(FusionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_counts() {
        assert!(validate_counts(2, 2).is_ok());
        assert!(matches!(
            validate_counts(2, 1),
            Err(FusionError::CountMismatch { masks: 2, transforms: 1 })
        ));
        assert!(matches!(validate_counts(0, 0), Err(FusionError::NoComponents)));
    }

    #[test]
    fn test_validate_transform() {
        assert!(validate_transform(0, &Matrix4::identity()).is_ok());

        let mut flat = Matrix4::identity();
        flat[(2, 2)] = 0.0;
        assert!(matches!(
            validate_transform(3, &flat),
            Err(FusionError::SingularTransform { index: 3, .. })
        ));

        let mut nan = Matrix4::identity();
        nan[(0, 3)] = f64::NAN;
        assert!(validate_transform(0, &nan).is_err());
    }

    #[test]
    fn test_validate_inputs_checks_masks_and_reference() {
        let floating = image([4, 4, 4]);
        let config = FusionConfig::default();
        let transforms = [Matrix4::identity()];

        assert!(validate_inputs(&floating, &image([4, 4, 4]), &[image([4, 4, 4])], &transforms, &config).is_ok());

        let err = validate_inputs(&floating, &image([4, 4, 5]), &[image([4, 4, 4])], &transforms, &config)
            .unwrap_err();
        assert!(matches!(err, FusionError::ShapeMismatch { .. }));

        let err = validate_inputs(&floating, &image([4, 4, 4]), &[image([2, 4, 4])], &transforms, &config)
            .unwrap_err();
        assert!(matches!(err, FusionError::ShapeMismatch { .. }));

        let bad_config = FusionConfig::default().with_distance_decay(0.0);
        let err = validate_inputs(&floating, &image([4, 4, 4]), &[image([4, 4, 4])], &transforms, &bad_config)
            .unwrap_err();
        assert!(matches!(err, FusionError::InvalidConfiguration(_)));
    }
}
