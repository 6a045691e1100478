//! Per-component weighting functions and their normalization.
//!
//! A component mask becomes a smooth weight `1 / (1 + k * d)`, where `d` is
//! the Euclidean distance (in voxels) to the nearest mask voxel. The weights
//! of all components are then rescaled into a partition of unity.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use polyrigid_core::filter::EuclideanDistanceTransform;
use polyrigid_core::image::Image;

use crate::error::{FusionError, Result};
use crate::validation::validate_image_shapes;

/// Turns a component mask into its weighting function.
#[derive(Debug, Clone, Copy)]
pub struct ComponentWeighting {
    decay: f64,
    distance: EuclideanDistanceTransform,
}

impl ComponentWeighting {
    /// Create a weighting with distance decay `k`.
    pub fn new(decay: f64) -> Self {
        Self {
            decay,
            distance: EuclideanDistanceTransform::new(),
        }
    }

    /// Compute the weighting function of `mask`, keeping its header.
    ///
    /// Voxels holding the mask maximum are the component; every other voxel
    /// is weighted by its distance to the closest of them.
    pub fn apply<B: Backend>(&self, mask: &Image<B, 3>) -> Result<Image<B, 3>> {
        let data = mask.data().clone();
        let max = data.clone().max().into_scalar().elem::<f64>();
        if !max.is_finite() {
            return Err(FusionError::numerical("component mask contains non-finite values"));
        }

        let inverted = mask.with_data(data.neg().add_scalar(max));
        let distance = self.distance.apply(&inverted)?;

        let weights = distance.data().clone().mul_scalar(self.decay).add_scalar(1.0).recip();
        Ok(mask.with_data(weights))
    }
}

impl Default for ComponentWeighting {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Divide each weighting function by the voxel-wise sum of all of them.
///
/// The result sums to one at every voxel.
pub fn normalize_weights<B: Backend>(weights: &[Image<B, 3>]) -> Result<Vec<Image<B, 3>>> {
    let (first, rest) = weights.split_first().ok_or(FusionError::NoComponents)?;
    for weight in rest {
        validate_image_shapes(first, weight)?;
    }

    let sum = rest
        .iter()
        .fold(first.data().clone(), |acc, w| acc + w.data().clone());

    let min = sum.clone().min().into_scalar().elem::<f64>();
    if !(min.is_finite() && min > 0.0) {
        return Err(FusionError::numerical(format!(
            "sum of weighting functions must be positive everywhere, minimum is {}",
            min
        )));
    }

    Ok(weights
        .iter()
        .map(|w| w.with_data(w.data().clone() / sum.clone()))
        .collect())
}

/// Sum of a set of weight tensors, mostly useful for checking normalization.
pub fn weight_sum<B: Backend>(weights: &[Image<B, 3>]) -> Option<Tensor<B, 3>> {
    let (first, rest) = weights.split_first()?;
    Some(
        rest.iter()
            .fold(first.data().clone(), |acc, w| acc + w.data().clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn line_mask(values: Vec<f32>) -> Image<TestBackend, 3> {
        let device = Default::default();
        let n = values.len();
        let data = Tensor::<TestBackend, 3>::from_data(TensorData::new(values, [1, 1, n]), &device);
        Image::from_metadata(data, Default::default())
    }

    #[test]
    fn test_weight_is_one_inside_and_decays_outside() {
        let mask = line_mask(vec![1.0, 1.0, 0.0, 0.0, 0.0]);
        let weights = ComponentWeighting::default().apply(&mask).unwrap().to_vec().unwrap();

        let expected = [1.0, 1.0, 1.0 / 1.5, 1.0 / 2.0, 1.0 / 2.5];
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-6, "Expected {}, got {}", e, w);
        }
    }

    #[test]
    fn test_decay_controls_falloff() {
        let mask = line_mask(vec![1.0, 0.0, 0.0]);
        let weights = ComponentWeighting::new(2.0).apply(&mask).unwrap().to_vec().unwrap();
        assert!((weights[1] - 1.0 / 3.0).abs() < 1e-6);
        assert!((weights[2] - 1.0 / 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_mask_weighs_one_everywhere() {
        let mask = line_mask(vec![0.0; 4]);
        let weights = ComponentWeighting::default().apply(&mask).unwrap().to_vec().unwrap();
        assert!(weights.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_normalize_two_components() {
        let weighting = ComponentWeighting::default();
        let a = weighting.apply(&line_mask(vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        let b = weighting.apply(&line_mask(vec![0.0, 0.0, 0.0, 1.0])).unwrap();

        let normalized = normalize_weights(&[a, b]).unwrap();
        let na = normalized[0].to_vec().unwrap();
        let nb = normalized[1].to_vec().unwrap();

        for (x, y) in na.iter().zip(&nb) {
            assert!((x + y - 1.0).abs() < 1e-6);
        }
        // Symmetric masks give symmetric weights.
        assert!((na[0] - nb[3]).abs() < 1e-6);
        assert!(na[0] > na[1] && na[1] > na[2] && na[2] > na[3]);
    }

    #[test]
    fn test_normalize_rejects_empty_and_mismatched() {
        assert!(matches!(
            normalize_weights::<TestBackend>(&[]),
            Err(FusionError::NoComponents)
        ));

        let a = line_mask(vec![1.0, 1.0]);
        let b = line_mask(vec![1.0, 1.0, 1.0]);
        assert!(matches!(
            normalize_weights(&[a, b]),
            Err(FusionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_normalize_rejects_zero_sum() {
        let zero = line_mask(vec![0.0, 0.0]);
        assert!(matches!(
            normalize_weights(&[zero]),
            Err(FusionError::Numerical(_))
        ));
    }
}
